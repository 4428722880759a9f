//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! services.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// SQLSTATE raised by PostgreSQL on a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value violates constraint {0}")]
    Duplicate(String),
}

impl DatabaseError {
    /// Classify an error returned by a query, separating unique violations
    /// from other failures.
    pub fn from_query(error: SqlxError) -> Self {
        if let SqlxError::Database(db_error) = &error {
            if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_error.constraint().unwrap_or("unknown").to_string();
                return DatabaseError::Duplicate(constraint);
            }
        }
        DatabaseError::Query(error)
    }

    /// Whether this error is a unique constraint violation
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate(_))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
