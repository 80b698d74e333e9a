//! Axum integration for httpauth
//!
//! Provides route middleware that gates requests through an
//! [`httpauth::Authorizer`], an [`AuthUser`] extractor, and a mapping from
//! authorizer errors to HTTP responses.

mod config;
mod error;
mod middleware;
mod session;

pub use config::HTTPAUTH_LOGIN_URL;
pub use error::IntoResponseError;
pub use middleware::{
    RoleGuard, is_authenticated_401, is_authenticated_redirect, is_authorized_with_role_403,
    is_authorized_with_role_redirect,
};
pub use session::{AuthRedirect, AuthUser};
