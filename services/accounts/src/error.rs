//! Error taxonomy of the account flows

use common::error::DatabaseError;
use thiserror::Error;

/// Reasons an account operation can fail.
///
/// The display text is what the user sees on the re-rendered form, except
/// for `Internal` whose cause is only logged.
#[derive(Error, Debug)]
pub enum AccountError {
    /// Missing or mismatched form input
    #[error("{0}")]
    Validation(&'static str),

    /// The username is already registered
    #[error("Username is already taken")]
    Conflict,

    /// No user with the given name
    #[error("User not found")]
    NotFound,

    /// The password does not match the stored hash
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The delete statement affected no rows
    #[error("User not deleted")]
    Deletion,

    /// The request carries no authenticated session
    #[error("Access denied")]
    Unauthenticated,

    /// A backend failed
    #[error("Something went wrong, please try again")]
    Internal(#[source] anyhow::Error),
}

impl From<DatabaseError> for AccountError {
    fn from(error: DatabaseError) -> Self {
        if error.is_duplicate() {
            AccountError::Conflict
        } else {
            AccountError::Internal(error.into())
        }
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(error: anyhow::Error) -> Self {
        AccountError::Internal(error)
    }
}

/// Type alias for account results
pub type AccountResult<T> = Result<T, AccountError>;
