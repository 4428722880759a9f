//! Account service models

pub mod session;
pub mod user;

pub use session::{Identity, SessionState};
pub use user::{NewUser, User};
