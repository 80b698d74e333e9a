use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::userdb::{backend::AuthBackend, errors::UserError, types::UserData};

/// Process-local user store, mostly for tests and demos
#[derive(Debug, Default)]
pub struct MemoryAuthBackend {
    users: RwLock<HashMap<String, UserData>>,
}

impl MemoryAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthBackend for MemoryAuthBackend {
    async fn save_user(&self, user: UserData) -> Result<(), UserError> {
        self.users
            .write()
            .await
            .insert(user.username.clone(), user);
        Ok(())
    }

    async fn user(&self, username: &str) -> Result<Option<UserData>, UserError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn users(&self) -> Result<Vec<UserData>, UserError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserError> {
        match self.users.write().await.remove(username) {
            Some(_) => Ok(()),
            None => Err(UserError::DeleteMissing(username.to_string())),
        }
    }

    async fn close(&self) {}
}
