use async_trait::async_trait;

use super::errors::UserError;
use super::types::UserData;

/// Durable mapping from username to [`UserData`]
///
/// Every adapter must give identical semantics:
///
/// - `save_user` is a full upsert keyed by username, atomic as seen by
///   concurrent readers. Concurrent saves of one username resolve last write
///   wins.
/// - `user` returns `Ok(None)` for an absent user; `Err` means I/O failure.
/// - `users` is an unordered snapshot.
/// - `delete_user` fails with [`UserError::DeleteMissing`] when absent.
/// - `close` releases connections or handles. It is idempotent and safe on a
///   backend that never connected.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn save_user(&self, user: UserData) -> Result<(), UserError>;

    async fn user(&self, username: &str) -> Result<Option<UserData>, UserError>;

    async fn users(&self) -> Result<Vec<UserData>, UserError>;

    async fn delete_user(&self, username: &str) -> Result<(), UserError>;

    async fn close(&self);
}
