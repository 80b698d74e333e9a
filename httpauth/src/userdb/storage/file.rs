//! Flat-file user store
//!
//! The whole user map is one JSON object on disk. Mutations are serialized by
//! the write lock, written to a sibling temp file and renamed over the
//! original before the in-memory view changes, so a crash leaves either the
//! old or the new file and readers never see a partial record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::userdb::{backend::AuthBackend, errors::UserError, types::UserData};

#[derive(Debug)]
pub struct FileAuthBackend {
    path: PathBuf,
    users: RwLock<HashMap<String, UserData>>,
}

impl FileAuthBackend {
    /// Open an existing user file.
    ///
    /// Fails with [`UserError::MissingBackend`] if the file does not exist.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UserError> {
        let path = path.as_ref().to_path_buf();
        if !tokio::fs::try_exists(&path).await? {
            return Err(UserError::MissingBackend(path.display().to_string()));
        }

        let users = load(&path).await?;
        tracing::debug!(count = users.len(), "Loaded user file");
        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// Open the user file, creating an empty one first if it is absent.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, UserError> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            persist(path, &HashMap::new()).await?;
            tracing::info!(path = %path.display(), "Created empty user file");
        }
        Self::open(path).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load(path: &Path) -> Result<HashMap<String, UserData>, UserError> {
    let contents = tokio::fs::read(path).await?;
    if contents.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }
    Ok(serde_json::from_slice(&contents)?)
}

async fn persist(path: &Path, users: &HashMap<String, UserData>) -> Result<(), UserError> {
    let contents = serde_json::to_vec_pretty(users)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl AuthBackend for FileAuthBackend {
    async fn save_user(&self, user: UserData) -> Result<(), UserError> {
        let mut users = self.users.write().await;

        let mut next = users.clone();
        next.insert(user.username.clone(), user);
        persist(&self.path, &next).await?;

        *users = next;
        Ok(())
    }

    async fn user(&self, username: &str) -> Result<Option<UserData>, UserError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn users(&self) -> Result<Vec<UserData>, UserError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        if !users.contains_key(username) {
            return Err(UserError::DeleteMissing(username.to_string()));
        }

        let mut next = users.clone();
        next.remove(username);
        persist(&self.path, &next).await?;

        *users = next;
        Ok(())
    }

    async fn close(&self) {}
}
