use thiserror::Error;

use crate::password::HashError;
use crate::session::SessionError;
use crate::userdb::UserError;

/// Outcome of a rejected authorizer operation
///
/// Flash messages shown to users are deliberately coarser than these
/// variants; `InvalidCredentials` covers both unknown users and wrong
/// passwords.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Already authenticated")]
    AlreadyAuthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Hashing error: {0}")]
    Hashing(#[from] HashError),

    /// The auth cookie was present but unreadable, typically after a signing
    /// key rotation or server restart with an ephemeral key.
    #[error("Session unavailable: {0}")]
    SessionUnavailable(SessionError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Role '{role}' does not satisfy required role '{required}'")]
    InsufficientPrivilege { role: String, required: String },

    /// The session named a user who is no longer in the store.
    #[error("User no longer exists: {0}")]
    UserVanished(String),

    #[error("Cannot delete missing user: {0}")]
    DeleteMissing(String),

    #[error("Storage error: {0}")]
    Storage(UserError),

    /// Failure to commit a session into the response
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Log the error and return self
    ///
    /// Expected rejections log at debug; infrastructure failures at error.
    pub fn log(self) -> Self {
        match &self {
            Self::AlreadyAuthenticated
            | Self::InvalidCredentials
            | Self::NotAuthenticated
            | Self::UserExists(_) => tracing::debug!("{}", self),
            Self::InsufficientPrivilege { role, required } => {
                tracing::warn!(role = %role, required = %required, "Insufficient privilege")
            }
            Self::UserVanished(username) => {
                tracing::warn!(username = %username, "Session user no longer exists")
            }
            Self::SessionUnavailable(err) => tracing::warn!("Session unavailable: {}", err),
            Self::DeleteMissing(username) => {
                tracing::warn!("Cannot delete missing user: {}", username)
            }
            Self::UnknownRole(role) => tracing::error!("Unknown role: {}", role),
            Self::Hashing(err) => tracing::error!("Hashing error: {}", err),
            Self::Storage(err) => tracing::error!("Storage error: {}", err),
            Self::Session(err) => tracing::error!("Session error: {}", err),
            Self::Config(msg) => tracing::error!("Configuration error: {}", msg),
        }
        self
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DeleteMissing(username) => Self::DeleteMissing(username),
            other => Self::Storage(other),
        }
    }
}
