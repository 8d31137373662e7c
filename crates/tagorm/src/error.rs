//! Error types for tagorm
//!
//! Two layers:
//! - [`OrmError`] is the detailed internal error produced while building and executing
//!   statements. It is logged at the point of failure.
//! - [`DbError`] is what the [`Db`](crate::Db) facade returns: one fixed kind per
//!   operation, with no driver text attached.

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type alias for internal/handle operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Result type alias for facade operations
pub type DbResult<T> = Result<T, DbError>;

/// Detailed error produced while building or executing a statement.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Driver error not classified further.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// SQLSTATE 23505; carries `constraint: message`.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// SQLSTATE 23503; carries `constraint: message`.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A column could not be read into its field type.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Rejected identifier or argument.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The statement could not be assembled, e.g. an unresolved named placeholder.
    #[error("Build error: {0}")]
    Build(String),

    #[error("Config error: {0}")]
    Config(String),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    #[error("{0}")]
    Other(String),
}

impl OrmError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Map a driver error, splitting out unique and foreign-key violations.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let classified = err.as_db_error().and_then(|db| {
            let detail = format!("{}: {}", db.constraint().unwrap_or("unknown"), db.message());
            if *db.code() == SqlState::UNIQUE_VIOLATION {
                Some(Self::UniqueViolation(detail))
            } else if *db.code() == SqlState::FOREIGN_KEY_VIOLATION {
                Some(Self::ForeignKeyViolation(detail))
            } else {
                None
            }
        });
        classified.unwrap_or_else(|| Self::Query(err))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Error kinds returned by the [`Db`](crate::Db) facade.
///
/// The underlying [`OrmError`] is logged where it happens and then collapsed into one
/// of these, so callers can branch on the operation that failed without ever seeing
/// dialect-specific driver text.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbError {
    #[error("db handle select error")]
    Select,
    #[error("db handle create error")]
    Create,
    #[error("db handle update error")]
    Update,
    #[error("db handle query error")]
    Query,
    #[error("db handle delete error")]
    Delete,
}
