use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Postgres, Sqlite};

use crate::userdb::{backend::AuthBackend, errors::UserError, types::UserData};

use super::config::DB_TABLE_USERS;
use super::postgres::*;
use super::schema::validate_table_name;
use super::sqlite::*;

#[derive(Clone, Debug)]
struct SqliteDataStore {
    pool: sqlx::SqlitePool,
}

#[derive(Clone, Debug)]
struct PostgresDataStore {
    pool: sqlx::PgPool,
}

trait DataStore: Send + Sync + std::fmt::Debug {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>>;
    fn as_postgres(&self) -> Option<&Pool<Postgres>>;
}

impl DataStore for SqliteDataStore {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        Some(&self.pool)
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        None
    }
}

impl DataStore for PostgresDataStore {
    fn as_sqlite(&self) -> Option<&Pool<Sqlite>> {
        None
    }

    fn as_postgres(&self) -> Option<&Pool<Postgres>> {
        Some(&self.pool)
    }
}

/// Relational user store over SQLite or PostgreSQL
#[derive(Debug)]
pub struct SqlAuthBackend {
    store: Box<dyn DataStore>,
    table_name: String,
}

impl SqlAuthBackend {
    /// Connect using the table named by `HTTPAUTH_DB_TABLE_USERS`.
    pub async fn connect(url: &str) -> Result<Self, UserError> {
        Self::connect_with_table(url, DB_TABLE_USERS.as_str()).await
    }

    /// Connect to `url` (`sqlite:` or `postgres://`), create the users table if
    /// needed and validate its schema.
    #[tracing::instrument(skip(url))]
    pub async fn connect_with_table(url: &str, table_name: &str) -> Result<Self, UserError> {
        validate_table_name(table_name)?;

        let store: Box<dyn DataStore> = if url.starts_with("sqlite:") {
            let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            let pool_opts = if url.contains(":memory:") || url.contains("mode=memory") {
                // Every connection to an in-memory database sees a different
                // database, so pin the pool to one long-lived connection.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new()
            };
            Box::new(SqliteDataStore {
                pool: pool_opts.connect_with(opts).await?,
            })
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Box::new(PostgresDataStore {
                pool: PgPoolOptions::new().connect(url).await?,
            })
        } else {
            return Err(UserError::Unsupported(format!(
                "Unsupported database url: {url}. Supported schemes are 'sqlite:' and 'postgres://'"
            )));
        };

        let backend = Self {
            store,
            table_name: table_name.to_string(),
        };
        backend.init().await?;

        tracing::info!(table = table_name, "Connected SQL user backend");
        Ok(backend)
    }

    async fn init(&self) -> Result<(), UserError> {
        let table_name = self.table_name.as_str();

        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool, table_name).await?;
                validate_user_tables_sqlite(pool, table_name).await
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool, table_name).await?;
                validate_user_tables_postgres(pool, table_name).await
            }
            _ => Err(UserError::Storage("Unsupported database type".to_string())),
        }
    }
}

#[async_trait]
impl AuthBackend for SqlAuthBackend {
    async fn save_user(&self, user: UserData) -> Result<(), UserError> {
        let table_name = self.table_name.as_str();

        if let Some(pool) = self.store.as_sqlite() {
            upsert_user_sqlite(pool, table_name, &user).await
        } else if let Some(pool) = self.store.as_postgres() {
            upsert_user_postgres(pool, table_name, &user).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        }
    }

    async fn user(&self, username: &str) -> Result<Option<UserData>, UserError> {
        let table_name = self.table_name.as_str();

        if let Some(pool) = self.store.as_sqlite() {
            get_user_sqlite(pool, table_name, username).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_user_postgres(pool, table_name, username).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        }
    }

    async fn users(&self) -> Result<Vec<UserData>, UserError> {
        let table_name = self.table_name.as_str();

        if let Some(pool) = self.store.as_sqlite() {
            get_all_users_sqlite(pool, table_name).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_all_users_postgres(pool, table_name).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        }
    }

    async fn delete_user(&self, username: &str) -> Result<(), UserError> {
        let table_name = self.table_name.as_str();

        if let Some(pool) = self.store.as_sqlite() {
            delete_user_sqlite(pool, table_name, username).await
        } else if let Some(pool) = self.store.as_postgres() {
            delete_user_postgres(pool, table_name, username).await
        } else {
            Err(UserError::Storage("Unsupported database type".to_string()))
        }
    }

    async fn close(&self) {
        if let Some(pool) = self.store.as_sqlite() {
            pool.close().await;
        } else if let Some(pool) = self.store.as_postgres() {
            pool.close().await;
        }
    }
}
