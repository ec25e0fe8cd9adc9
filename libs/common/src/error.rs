//! Database error taxonomy shared across the portal
//!
//! Repository code maps sqlx failures into these variants so the service
//! layer never has to match on raw driver errors.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while establishing a database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying schema migrations
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
