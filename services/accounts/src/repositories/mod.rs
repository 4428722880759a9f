//! Credential store: the persistent table of users

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{NewUser, User};

pub mod memory;
pub mod user;

pub use memory::MemoryUserRepository;
pub use user::UserRepository;

/// Operations the account handlers need from the user table.
///
/// Implementations must reject a second user with an existing name with
/// `DatabaseError::Duplicate`, even when two inserts race.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact name
    async fn find_by_name(&self, name: &str) -> DatabaseResult<Option<User>>;

    /// Insert a new user and return the stored row
    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<User>;

    /// Delete the user matching both id and name, returning the rows affected
    async fn delete(&self, id: i64, name: &str) -> DatabaseResult<u64>;

    /// Check that the store is reachable
    async fn health_check(&self) -> DatabaseResult<bool>;
}
