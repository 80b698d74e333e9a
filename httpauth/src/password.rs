//! Credential hashing
//!
//! Passwords are hashed with bcrypt over the concatenation of username and
//! password, so two accounts sharing a password never share a digest.
//! bcrypt reads at most 72 bytes of secret, terminator included; longer
//! secrets are rejected rather than truncated. bcrypt is CPU bound, so both
//! hashing and verification run on tokio's blocking thread pool.

use thiserror::Error;

/// Cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 8;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HashError {
    #[error("Invalid bcrypt cost {0}, expected 4..=31")]
    InvalidCost(u32),

    #[error("Couldn't hash password: {0}")]
    Bcrypt(String),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// Salted one-way hash of user credentials with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash the credentials of `username`, returning the bcrypt digest bytes.
    ///
    /// Fails with [`HashError::Bcrypt`] when username and password together
    /// exceed 72 bytes.
    pub async fn hash(&self, username: &str, password: &str) -> Result<Vec<u8>, HashError> {
        let secret = credential_secret(username, password);
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            bcrypt::non_truncating_hash(secret, cost)
                .map(String::into_bytes)
                .map_err(|e| HashError::Bcrypt(e.to_string()))
        })
        .await
        .map_err(|e| HashError::Task(e.to_string()))?
    }

    /// Check credentials against a stored digest.
    ///
    /// Any malformed digest, over-long secret or primitive failure counts as
    /// a mismatch.
    pub async fn verify(&self, digest: &[u8], username: &str, password: &str) -> bool {
        let Ok(digest) = std::str::from_utf8(digest) else {
            return false;
        };
        let digest = digest.to_string();
        let secret = credential_secret(username, password);

        let verified =
            tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(secret, &digest)).await;
        match verified {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "bcrypt rejected credentials or digest");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

fn credential_secret(username: &str, password: &str) -> String {
    format!("{username}{password}")
}
