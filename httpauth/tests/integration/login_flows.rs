use http::HeaderMap;
use httpauth::{
    AuthError, CookieOptions, CookieSessionStore, MAX_COOKIE_SIZE, MAX_FLASHES,
    MSG_INVALID_CREDENTIALS, MSG_LOGGED_OUT, MSG_USERNAME_TAKEN, Session, SessionStore,
};

use crate::common::{MockBrowser, login, memory_authorizer, register};

/// A registered user logs in once per anonymous session and the session
/// then authorizes as that user.
#[tokio::test]
async fn test_register_login_authorize() {
    // Given a registered user
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "correct horse").await;

    // When logging in from a fresh browser
    let mut browser = MockBrowser::new();
    let target = login(&authorizer, &mut browser, "alice", "correct horse").await;

    // Then the caller's destination is returned and the session is bound
    assert_eq!(target, "/");
    assert!(browser.has_cookie("auth"));

    let user = authorizer
        .authorize(&browser.request("/dashboard"), &mut HeaderMap::new(), None, false)
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, "user");

    // And a second login on the same session is refused without side effects
    let mut res = HeaderMap::new();
    let again = authorizer
        .login(&browser.request("/login"), &mut res, "alice", "correct horse", "/")
        .await;
    assert_eq!(again, Err(AuthError::AlreadyAuthenticated));
    assert!(res.is_empty());
}

/// Wrong password and unknown username are indistinguishable to the caller.
#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "secret").await;

    let mut outcomes = Vec::new();
    for (username, password) in [("alice", "wrong"), ("mallory", "secret")] {
        let mut browser = MockBrowser::new();
        let mut res = HeaderMap::new();
        let result = authorizer
            .login(&browser.request("/login"), &mut res, username, password, "/")
            .await;
        browser.absorb(&res);

        // No auth cookie was issued
        assert!(!browser.has_cookie("auth"));

        let messages = authorizer.messages(&browser.request("/login"), &mut HeaderMap::new());
        outcomes.push((result, messages));
    }

    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[0].0, Err(AuthError::InvalidCredentials));
    assert_eq!(outcomes[0].1, vec![MSG_INVALID_CREDENTIALS]);
}

/// The credential digest is bound to the username.
#[tokio::test]
async fn test_password_of_other_user_does_not_work() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "alice-pw").await;
    register(&authorizer, "bob", "bob-pw").await;

    let browser = MockBrowser::new();
    let result = authorizer
        .login(&browser.request("/login"), &mut HeaderMap::new(), "alice", "bob-pw", "/")
        .await;

    assert_eq!(result, Err(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_duplicate_registration_leaves_store_untouched() {
    // Given alice registered once
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "first").await;
    let before = authorizer.users().await.unwrap();

    // When registering the same username again
    let mut browser = MockBrowser::new();
    let mut res = HeaderMap::new();
    let result = authorizer
        .register(&browser.request("/register"), &mut res, "alice", "second", "x@y")
        .await;
    browser.absorb(&res);

    // Then it fails, tells the user, and the stored record is unchanged
    assert_eq!(result, Err(AuthError::UserExists("alice".to_string())));
    assert_eq!(
        authorizer.messages(&browser.request("/"), &mut HeaderMap::new()),
        vec![MSG_USERNAME_TAKEN]
    );
    assert_eq!(authorizer.users().await.unwrap(), before);

    // And the original password still works
    let mut fresh = MockBrowser::new();
    login(&authorizer, &mut fresh, "alice", "first").await;
}

#[tokio::test]
async fn test_logout_ends_session() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "alice", "pw").await;

    let mut res = HeaderMap::new();
    authorizer.logout(&browser.request("/logout"), &mut res).unwrap();
    browser.absorb(&res);

    assert!(!browser.has_cookie("auth"));
    let result = authorizer
        .authorize(&browser.request("/"), &mut HeaderMap::new(), None, false)
        .await;
    assert_eq!(result, Err(AuthError::NotAuthenticated));

    let mut res = HeaderMap::new();
    assert_eq!(
        authorizer.messages(&browser.request("/"), &mut res),
        vec![MSG_LOGGED_OUT]
    );
    browser.absorb(&res);

    // Messages are read once
    assert!(
        authorizer
            .messages(&browser.request("/"), &mut HeaderMap::new())
            .is_empty()
    );
}

#[tokio::test]
async fn test_logout_when_anonymous_still_reports() {
    let authorizer = memory_authorizer();
    let mut browser = MockBrowser::new();

    let mut res = HeaderMap::new();
    authorizer.logout(&browser.request("/logout"), &mut res).unwrap();
    browser.absorb(&res);

    assert_eq!(
        authorizer.messages(&browser.request("/"), &mut HeaderMap::new()),
        vec![MSG_LOGGED_OUT]
    );
}

/// Repeated failures keep the message cookie small enough for browsers to
/// store, so later messages still arrive.
#[tokio::test]
async fn test_repeated_failed_logins_keep_messages_cookie_bounded() {
    let authorizer = memory_authorizer();
    let mut browser = MockBrowser::new();

    for _ in 0..200 {
        let mut res = HeaderMap::new();
        let result = authorizer
            .login(&browser.request("/login"), &mut res, "ghost", "x", "/")
            .await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
        browser.absorb(&res);
    }

    let mut res = HeaderMap::new();
    authorizer.logout(&browser.request("/logout"), &mut res).unwrap();
    browser.absorb(&res);

    let set_cookie = res
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .find(|v| v.starts_with("messages="))
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    assert!(pair.len() <= MAX_COOKIE_SIZE);

    let messages = authorizer.messages(&browser.request("/"), &mut HeaderMap::new());
    assert_eq!(messages.len(), MAX_FLASHES);
    assert_eq!(messages.last().unwrap(), MSG_LOGGED_OUT);
    assert!(messages[..MAX_FLASHES - 1].iter().all(|m| m == MSG_INVALID_CREDENTIALS));
}

/// After logout the same browser may log in again.
#[tokio::test]
async fn test_login_after_logout() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "alice", "pw").await;

    let mut res = HeaderMap::new();
    authorizer.logout(&browser.request("/logout"), &mut res).unwrap();
    browser.absorb(&res);

    login(&authorizer, &mut browser, "alice", "pw").await;
    assert!(browser.has_cookie("auth"));
}

/// Credentials longer than bcrypt can read are refused, never truncated.
#[tokio::test]
async fn test_over_long_credentials_cannot_register_or_log_in() {
    let authorizer = memory_authorizer();
    let username = "a".repeat(72);

    let browser = MockBrowser::new();
    let result = authorizer
        .register(&browser.request("/register"), &mut HeaderMap::new(), &username, "correct", "")
        .await;
    assert!(matches!(result, Err(AuthError::Hashing(_))));
    assert!(authorizer.users().await.unwrap().is_empty());

    let result = authorizer
        .login(&browser.request("/login"), &mut HeaderMap::new(), &username, "WRONG", "/")
        .await;
    assert_eq!(result, Err(AuthError::InvalidCredentials));
}

/// A session signed under another key is unreadable, not trusted.
#[tokio::test]
async fn test_forged_session_is_rejected() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;

    let mut browser = MockBrowser::new();
    let forged =
        CookieSessionStore::new(b"attacker-key".to_vec(), CookieOptions::default()).unwrap();
    let mut session = Session::new("auth");
    session.set("username", "alice");
    let mut res = HeaderMap::new();
    forged.save(&session, &mut res).unwrap();
    browser.absorb(&res);

    let result = authorizer
        .authorize(&browser.request("/"), &mut HeaderMap::new(), None, false)
        .await;
    assert!(matches!(result, Err(AuthError::SessionUnavailable(_))));
}
