mod config;
mod cookie;
mod errors;
mod store;
mod types;

pub use config::{
    AUTH_SESSION, DEFAULT_COOKIE_MAX_AGE, MAX_COOKIE_SIZE, MAX_FLASHES, MESSAGES_SESSION,
    REDIRECTS_SESSION,
};
pub use cookie::CookieSessionStore;
pub use errors::SessionError;
pub use store::SessionStore;
pub use types::{CookieOptions, Session};
