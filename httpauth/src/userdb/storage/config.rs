use std::{env, str::FromStr, sync::Arc, sync::LazyLock};

use crate::userdb::{backend::AuthBackend, errors::UserError};

use super::{FileAuthBackend, MemoryAuthBackend, RedisAuthBackend, SqlAuthBackend};

/// Users table name for the relational backend
pub(crate) static DB_TABLE_USERS: LazyLock<String> = LazyLock::new(|| {
    env::var("HTTPAUTH_DB_TABLE_USERS").unwrap_or_else(|_| "httpauth_users".to_string())
});

/// Hash key holding user documents in the Redis backend
pub(crate) static REDIS_USERS_KEY: LazyLock<String> = LazyLock::new(|| {
    env::var("HTTPAUTH_REDIS_KEY").unwrap_or_else(|_| "httpauth:users".to_string())
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    File,
    Sql,
    Redis,
}

impl FromStr for BackendKind {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "sql" | "sqlite" | "postgres" => Ok(Self::Sql),
            "redis" => Ok(Self::Redis),
            other => Err(UserError::Unsupported(format!(
                "Unsupported backend type: {other}. Supported types are 'memory', 'file', 'sql' and 'redis'"
            ))),
        }
    }
}

/// Which user backend to build and where it lives
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// File path, database url or Redis url. Ignored for `Memory`.
    pub url: Option<String>,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, url: Option<String>) -> Self {
        Self { kind, url }
    }

    fn require_url(&self) -> Result<&str, UserError> {
        self.url.as_deref().ok_or_else(|| {
            UserError::Unsupported(format!("Backend {:?} requires a url", self.kind))
        })
    }
}

/// Construct the configured backend.
///
/// The file backend creates its file when missing.
pub async fn open_backend(config: &BackendConfig) -> Result<Arc<dyn AuthBackend>, UserError> {
    tracing::info!(kind = ?config.kind, "Initializing user backend");

    let backend: Arc<dyn AuthBackend> = match config.kind {
        BackendKind::Memory => Arc::new(MemoryAuthBackend::new()),
        BackendKind::File => Arc::new(FileAuthBackend::create(config.require_url()?).await?),
        BackendKind::Sql => Arc::new(SqlAuthBackend::connect(config.require_url()?).await?),
        BackendKind::Redis => Arc::new(RedisAuthBackend::open(config.require_url()?)?),
    };
    Ok(backend)
}
