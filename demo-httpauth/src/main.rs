mod handlers;
mod server;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use httpauth::{AuthConfig, Authorizer, gen_random_bytes};
use httpauth_axum::{RoleGuard, is_authenticated_redirect, is_authorized_with_role_redirect};

use server::{init_tracing, serve};

const COOKIE_KEY_VAR: &str = "HTTPAUTH_COOKIE_KEY";

/// Read configuration from the environment, falling back to a throwaway
/// signing key so the demo runs without any setup.
fn load_config() -> Result<AuthConfig, Box<dyn std::error::Error>> {
    let fallback_key = match std::env::var(COOKIE_KEY_VAR) {
        Ok(key) if !key.is_empty() => None,
        _ => {
            tracing::warn!(
                "{} is not set; using a random key. Sessions will not survive a restart.",
                COOKIE_KEY_VAR
            );
            let key: String = gen_random_bytes(32)?
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect();
            Some(key)
        }
    };

    let config = AuthConfig::from_lookup(|var| match (&fallback_key, var) {
        (Some(key), COOKIE_KEY_VAR) => Some(key.clone()),
        _ => std::env::var(var).ok(),
    })?;
    Ok(config)
}

fn app(authorizer: Arc<Authorizer>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/logout", get(handlers::logout))
        .route(
            "/protected",
            get(handlers::protected).route_layer(from_fn_with_state(
                authorizer.clone(),
                is_authenticated_redirect,
            )),
        )
        .route(
            "/admin",
            get(handlers::admin).route_layer(from_fn_with_state(
                RoleGuard::new(authorizer.clone(), "admin"),
                is_authorized_with_role_redirect,
            )),
        )
        .with_state(authorizer)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_httpauth");

    let config = load_config()?;
    tracing::debug!("Configuration: {:?}", config);
    let authorizer = Arc::new(Authorizer::from_config(&config).await?);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    serve(port, app(authorizer.clone())).await?;

    authorizer.close().await;
    Ok(())
}
