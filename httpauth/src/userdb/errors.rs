use thiserror::Error;

#[derive(Clone, Error, Debug, PartialEq)]
pub enum UserError {
    #[error("Cannot delete missing user: {0}")]
    DeleteMissing(String),

    #[error("Backend does not exist: {0}")]
    MissingBackend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported backend: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for UserError {
    fn from(err: serde_json::Error) -> Self {
        UserError::InvalidData(err.to_string())
    }
}

impl From<redis::RedisError> for UserError {
    fn from(err: redis::RedisError) -> Self {
        UserError::Storage(err.to_string())
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for UserError {
    fn from(err: std::io::Error) -> Self {
        UserError::Storage(err.to_string())
    }
}
