use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use http::{HeaderMap, Method, StatusCode, request::Parts};
use httpauth::{AuthError, AuthenticatedUser, Authorizer};

use super::config::HTTPAUTH_LOGIN_URL;

pub struct AuthRedirect {
    method: Method,
}

impl AuthRedirect {
    fn new(method: Method) -> Self {
        Self { method }
    }

    fn into_response_with_method(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", HTTPAUTH_LOGIN_URL.as_str());
            Redirect::temporary(HTTPAUTH_LOGIN_URL.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        self.into_response_with_method()
    }
}

/// Authenticated user information, available as an Axum extractor
///
/// Routes behind one of the authentication middlewares get the user the
/// middleware bound to the request. Elsewhere the extractor asks the
/// [`Authorizer`] held in router state, without saving the visitor's path.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{routing::get, Router};
/// use httpauth::Authorizer;
/// use httpauth_axum::AuthUser;
///
/// async fn protected_handler(user: AuthUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
///
/// fn app(authorizer: Arc<Authorizer>) -> Router {
///     Router::new()
///         .route("/protected", get(protected_handler))
///         .with_state(authorizer)
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub email: String,
    /// Role name as stored; compare through the authorizer's role table
    pub role: String,
}

impl From<AuthenticatedUser> for AuthUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

impl AuthUser {
    async fn resolve<S>(parts: &Parts, state: &S) -> Result<Option<Self>, AuthError>
    where
        Arc<Authorizer>: FromRef<S>,
    {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(Some(user.clone()));
        }

        let authorizer = Arc::<Authorizer>::from_ref(state);
        // An extractor cannot write cookies; session updates are dropped.
        let mut discarded = HeaderMap::new();
        match authorizer.authorize(parts, &mut discarded, None, false).await {
            Ok(user) => Ok(Some(user.into())),
            Err(
                AuthError::NotAuthenticated
                | AuthError::SessionUnavailable(_)
                | AuthError::UserVanished(_),
            ) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<Authorizer>: FromRef<S>,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Self::resolve(parts, state).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AuthRedirect::new(parts.method.clone())),
            Err(e) => {
                tracing::error!("Failed to resolve session user: {}", e);
                Err(AuthRedirect::new(parts.method.clone()))
            }
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<Authorizer>: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Self::resolve(parts, state).await.map_err(|e| {
            tracing::error!("Failed to resolve session user: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        })
    }
}
