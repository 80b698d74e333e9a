pub mod mock_browser;

pub use fixtures::*;
pub use mock_browser::MockBrowser;

use http::HeaderMap;
use httpauth::Authorizer;

/// Register `username` with `password` and an example email
pub async fn register(authorizer: &Authorizer, username: &str, password: &str) {
    let browser = MockBrowser::new();
    let mut res = HeaderMap::new();
    authorizer
        .register(
            &browser.request("/register"),
            &mut res,
            username,
            password,
            &format!("{username}@example.com"),
        )
        .await
        .expect("registration succeeds");
}

/// Register with an explicit role
pub async fn register_as(authorizer: &Authorizer, username: &str, password: &str, role: &str) {
    let browser = MockBrowser::new();
    let mut res = HeaderMap::new();
    authorizer
        .register_with_role(
            &browser.request("/register"),
            &mut res,
            username,
            password,
            "",
            role,
        )
        .await
        .expect("registration succeeds");
}

/// Log `browser` in, returning the redirect target
pub async fn login(
    authorizer: &Authorizer,
    browser: &mut MockBrowser,
    username: &str,
    password: &str,
) -> String {
    let mut res = HeaderMap::new();
    let target = authorizer
        .login(&browser.request("/login"), &mut res, username, password, "/")
        .await
        .expect("login succeeds");
    browser.absorb(&res);
    target
}
