use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use http::{HeaderMap, Method, header::SET_COOKIE};
use httpauth::{AuthError, Authorizer};

use super::config::HTTPAUTH_LOGIN_URL;
use super::error::status_for;
use super::session::AuthUser;

/// State for the role-checking middleware
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware::from_fn_with_state, routing::get, Router};
/// use httpauth::Authorizer;
/// use httpauth_axum::{RoleGuard, is_authorized_with_role_403};
///
/// fn admin_routes(authorizer: Arc<Authorizer>) -> Router {
///     Router::new()
///         .route("/admin", get(|| async { "admin" }))
///         .route_layer(from_fn_with_state(
///             RoleGuard::new(authorizer, "admin"),
///             is_authorized_with_role_403,
///         ))
/// }
/// ```
#[derive(Clone)]
pub struct RoleGuard {
    pub authorizer: Arc<Authorizer>,
    pub role: String,
}

impl RoleGuard {
    pub fn new(authorizer: Arc<Authorizer>, role: impl Into<String>) -> Self {
        Self {
            authorizer,
            role: role.into(),
        }
    }
}

// Helper function to carry session cookies written by the authorizer
fn append_cookies(mut response: Response, cookies: HeaderMap) -> Response {
    for value in cookies.get_all(SET_COOKIE) {
        response.headers_mut().append(SET_COOKIE, value.clone());
    }
    response
}

// Helper function to handle authorization errors
fn handle_auth_error(err: AuthError, method: &Method, redirect_on_error: bool) -> Response {
    match status_for(&err) {
        StatusCode::UNAUTHORIZED => {
            if redirect_on_error && method == Method::GET {
                Redirect::temporary(HTTPAUTH_LOGIN_URL.as_str()).into_response()
            } else {
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
        }
        StatusCode::FORBIDDEN => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        status if status.is_server_error() => {
            err.log();
            (status, "Internal server error").into_response()
        }
        status => (status, err.to_string()).into_response(),
    }
}

async fn authorize_then_run(
    authorizer: &Authorizer,
    require_role: Option<&str>,
    redirect_on_error: bool,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let mut cookies = HeaderMap::new();
    // Only GET requests are redirected, so only their paths are worth saving
    let redirect_on_error = redirect_on_error && parts.method == Method::GET;

    let response = match authorizer
        .authorize(&parts, &mut cookies, require_role, redirect_on_error)
        .await
    {
        Ok(user) => {
            tracing::debug!(username = %user.username, "Request authorized");
            parts.extensions.insert(AuthUser::from(user));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => handle_auth_error(err, &parts.method, redirect_on_error),
    };

    append_cookies(response, cookies)
}

/// Authentication checker with 401 response
pub async fn is_authenticated_401(
    State(authorizer): State<Arc<Authorizer>>,
    req: Request,
    next: Next,
) -> Response {
    authorize_then_run(&authorizer, None, false, req, next).await
}

/// Authentication checker with redirect
///
/// Anonymous GET requests are sent to `HTTPAUTH_LOGIN_URL` with their path
/// remembered, so the next login returns to it.
pub async fn is_authenticated_redirect(
    State(authorizer): State<Arc<Authorizer>>,
    req: Request,
    next: Next,
) -> Response {
    authorize_then_run(&authorizer, None, true, req, next).await
}

/// Role checker; anonymous requests get 401, insufficient roles 403
pub async fn is_authorized_with_role_403(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Response {
    authorize_then_run(&guard.authorizer, Some(guard.role.as_str()), false, req, next).await
}

/// Role checker; anonymous GET requests are redirected to log in,
/// insufficient roles get 403
pub async fn is_authorized_with_role_redirect(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Response {
    authorize_then_run(&guard.authorizer, Some(guard.role.as_str()), true, req, next).await
}
