use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE constraint rejected the write. Surfaced as its own variant so
    /// callers can map duplicate records to a conflict instead of a storage
    /// failure.
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SQLError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, SQLError::UniqueViolation(_))
    }
}
