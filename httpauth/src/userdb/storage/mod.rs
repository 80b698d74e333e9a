mod config;
mod file;
mod memory;
mod postgres;
mod redis;
mod schema;
mod sql;
mod sqlite;

pub use config::{BackendConfig, BackendKind, open_backend};
pub use file::FileAuthBackend;
pub use memory::MemoryAuthBackend;
pub use redis::RedisAuthBackend;
pub use sql::SqlAuthBackend;
