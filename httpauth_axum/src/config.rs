//! Route configuration for the axum integration

use std::sync::LazyLock;

/// Where anonymous GET requests are sent by the redirecting middleware and
/// by the [`AuthUser`](crate::AuthUser) rejection
/// Default: "/login"
pub static HTTPAUTH_LOGIN_URL: LazyLock<String> =
    LazyLock::new(|| login_url(std::env::var("HTTPAUTH_LOGIN_URL").ok()));

fn login_url(env_value: Option<String>) -> String {
    env_value
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| "/login".to_string())
}
