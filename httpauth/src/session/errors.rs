use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Session cookie signature is invalid")]
    InvalidSignature,

    #[error("Malformed session cookie: {0}")]
    Malformed(String),

    #[error("Session cookie expired")]
    Expired,

    #[error("Session signing key must not be empty")]
    EmptyKey,

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Session cookie of {0} bytes exceeds the browser limit")]
    TooLarge(usize),
}

impl From<UtilError> for SessionError {
    fn from(err: UtilError) -> Self {
        match err {
            UtilError::Format(msg) => Self::Malformed(msg),
            UtilError::Cookie(msg) | UtilError::Crypto(msg) => Self::Cookie(msg),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
