use std::sync::Arc;

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use http::{HeaderMap, StatusCode, request::Parts};
use serde::Deserialize;

use httpauth::{AuthError, Authorizer, UserData};
use httpauth_axum::{AuthUser, IntoResponseError};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    messages: Vec<String>,
    user: Option<AuthUser>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    messages: Vec<String>,
}

#[derive(Template)]
#[template(path = "protected.html")]
struct ProtectedTemplate {
    messages: Vec<String>,
    user: AuthUser,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    messages: Vec<String>,
    users: Vec<UserData>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    username: String,
    password: String,
    #[serde(default)]
    email: String,
}

// Render a template, sending along any cookies the authorizer wrote
fn render(cookies: HeaderMap, template: impl Template) -> Response {
    match template.render() {
        Ok(html) => (cookies, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub(crate) async fn index(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
    user: Option<AuthUser>,
) -> Response {
    let mut cookies = HeaderMap::new();
    let messages = authorizer.messages(&parts, &mut cookies);
    render(cookies, IndexTemplate { messages, user })
}

pub(crate) async fn login_page(State(authorizer): State<Arc<Authorizer>>, parts: Parts) -> Response {
    let mut cookies = HeaderMap::new();
    let messages = authorizer.messages(&parts, &mut cookies);
    render(cookies, LoginTemplate { messages })
}

pub(crate) async fn login(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
    Form(form): Form<LoginForm>,
) -> Result<Response, (StatusCode, String)> {
    let mut cookies = HeaderMap::new();
    let result = authorizer
        .login(&parts, &mut cookies, &form.username, &form.password, "/")
        .await;

    let target = match result {
        Ok(target) => target,
        Err(AuthError::AlreadyAuthenticated) => "/".to_string(),
        // The failure message is already queued for the login page
        Err(AuthError::InvalidCredentials) => "/login".to_string(),
        Err(e) => return Err::<Response, _>(e).into_response_error(),
    };
    Ok((cookies, Redirect::to(&target)).into_response())
}

pub(crate) async fn register(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
    Form(form): Form<RegisterForm>,
) -> Result<Response, (StatusCode, String)> {
    let mut cookies = HeaderMap::new();
    let result = authorizer
        .register(&parts, &mut cookies, &form.username, &form.password, &form.email)
        .await;

    match result {
        Ok(()) => {
            authorizer
                .flash(&parts, &mut cookies, "Registered. You can log in now.")
                .into_response_error()?;
        }
        Err(AuthError::UserExists(_)) => {}
        Err(e) => return Err::<Response, _>(e).into_response_error(),
    }
    Ok((cookies, Redirect::to("/login")).into_response())
}

pub(crate) async fn logout(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
) -> Result<Response, (StatusCode, String)> {
    let mut cookies = HeaderMap::new();
    authorizer
        .logout(&parts, &mut cookies)
        .into_response_error()?;
    Ok((cookies, Redirect::to("/")).into_response())
}

// Protected by middleware; the user was bound to the request there
pub(crate) async fn protected(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
    user: AuthUser,
) -> Response {
    let mut cookies = HeaderMap::new();
    let messages = authorizer.messages(&parts, &mut cookies);
    render(cookies, ProtectedTemplate { messages, user })
}

pub(crate) async fn admin(
    State(authorizer): State<Arc<Authorizer>>,
    parts: Parts,
) -> Result<Response, (StatusCode, String)> {
    let users = authorizer.users().await.into_response_error()?;
    let mut cookies = HeaderMap::new();
    let messages = authorizer.messages(&parts, &mut cookies);
    Ok(render(cookies, AdminTemplate { messages, users }))
}
