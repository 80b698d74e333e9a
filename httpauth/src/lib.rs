//! httpauth - cookie-session authentication with pluggable user stores
//!
//! An [`Authorizer`] verifies username/password pairs against an
//! [`AuthBackend`], binds the username to a signed `auth` cookie, and gates
//! routes with optional role checks. Flash messages and the page a visitor was
//! sent away from travel in their own cookies.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use httpauth::{AuthConfig, Authorizer};
//!
//! let config = AuthConfig::from_env()?;
//! let authorizer = Authorizer::from_config(&config).await?;
//! # Ok(())
//! # }
//! ```

mod authorizer;
mod config;
mod password;
mod role;
mod session;
mod userdb;
mod utils;

pub use authorizer::{
    AuthError, AuthenticatedUser, Authorizer, MSG_INVALID_CREDENTIALS, MSG_LOGGED_OUT,
    MSG_LOGIN_REQUIRED, MSG_SAVE_FAILED, MSG_USERNAME_TAKEN,
};
pub use config::{AuthConfig, ConfigError};
pub use password::{DEFAULT_BCRYPT_COST, HashError, PasswordHasher};
pub use role::{RoleError, RoleTable};
pub use session::{
    AUTH_SESSION, CookieOptions, CookieSessionStore, DEFAULT_COOKIE_MAX_AGE, MAX_COOKIE_SIZE,
    MAX_FLASHES, MESSAGES_SESSION,
    REDIRECTS_SESSION, Session, SessionError, SessionStore,
};
pub use userdb::{
    AuthBackend, BackendConfig, BackendKind, FileAuthBackend, MemoryAuthBackend,
    RedisAuthBackend, SqlAuthBackend, UserData, UserError, open_backend,
};
pub use utils::{UtilError, gen_random_bytes};
