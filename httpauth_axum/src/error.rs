use http::{Result as HttpResponse, StatusCode};
use httpauth::AuthError;

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

/// Status code a handler should answer with for an authorizer failure
pub(crate) fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::NotAuthenticated
        | AuthError::SessionUnavailable(_)
        | AuthError::UserVanished(_)
        | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::InsufficientPrivilege { .. } => StatusCode::FORBIDDEN,
        AuthError::UserExists(_) | AuthError::AlreadyAuthenticated => StatusCode::CONFLICT,
        AuthError::UnknownRole(_) => StatusCode::BAD_REQUEST,
        AuthError::DeleteMissing(_) => StatusCode::NOT_FOUND,
        AuthError::Hashing(_)
        | AuthError::Storage(_)
        | AuthError::Session(_)
        | AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T> IntoResponseError<T> for Result<T, AuthError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            let status = status_for(&e);
            // Infrastructure details stay in the logs
            let body = if status.is_server_error() {
                e.log();
                "Internal server error".to_string()
            } else {
                e.to_string()
            };
            (status, body)
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for HttpResponse<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }
}
