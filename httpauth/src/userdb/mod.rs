mod backend;
mod errors;
mod storage;
mod types;

pub use backend::AuthBackend;
pub use errors::UserError;
pub use storage::{
    BackendConfig, BackendKind, FileAuthBackend, MemoryAuthBackend, RedisAuthBackend,
    SqlAuthBackend, open_backend,
};
pub use types::UserData;
