use std::sync::Arc;

use http::HeaderMap;
use httpauth::{AuthBackend, AuthError, MSG_INVALID_CREDENTIALS, MSG_LOGIN_REQUIRED, MemoryAuthBackend};
use proptest::prelude::*;

use crate::common::{
    MockBrowser, authorizer_with, login, memory_authorizer, register, register_as, test_roles,
};

/// Register, duplicate register, failed and successful logins, then a forced
/// login that returns the visitor to the page they were sent away from.
#[tokio::test]
async fn test_saved_path_scenario() {
    let backend = Arc::new(MemoryAuthBackend::new());
    let authorizer = authorizer_with(backend.clone());
    let mut browser = MockBrowser::new();

    // Register("alice","pw1","a@x.com") → ok
    let mut res = HeaderMap::new();
    authorizer
        .register(&browser.request("/register"), &mut res, "alice", "pw1", "a@x.com")
        .await
        .unwrap();
    let original_hash = backend.user("alice").await.unwrap().unwrap().hash;

    // Register("alice","pw2","a2@x.com") → UserExists, pw1's hash kept
    let mut res = HeaderMap::new();
    let dup = authorizer
        .register(&browser.request("/register"), &mut res, "alice", "pw2", "a2@x.com")
        .await;
    browser.absorb(&res);
    assert_eq!(dup, Err(AuthError::UserExists("alice".to_string())));
    let stored = backend.user("alice").await.unwrap().unwrap();
    assert_eq!(stored.hash, original_hash);
    assert_eq!(stored.email, "a@x.com");

    // Login("alice","wrong") → InvalidCredentials
    let mut res = HeaderMap::new();
    let wrong = authorizer
        .login(&browser.request("/login"), &mut res, "alice", "wrong", "/home")
        .await;
    browser.absorb(&res);
    assert_eq!(wrong, Err(AuthError::InvalidCredentials));

    // Login("alice","pw1","/home") → "/home"
    let mut res = HeaderMap::new();
    let target = authorizer
        .login(&browser.request("/login"), &mut res, "alice", "pw1", "/home")
        .await
        .unwrap();
    browser.absorb(&res);
    assert_eq!(target, "/home");

    // Anonymous visitor hits /secret with redirect on failure
    let mut visitor = MockBrowser::new();
    let mut res = HeaderMap::new();
    let denied = authorizer
        .authorize(&visitor.request("/secret"), &mut res, None, true)
        .await;
    visitor.absorb(&res);
    assert_eq!(denied, Err(AuthError::NotAuthenticated));
    assert!(visitor.has_cookie("redirects"));

    // The next login goes back to /secret instead of /home
    let mut res = HeaderMap::new();
    let target = authorizer
        .login(&visitor.request("/login"), &mut res, "alice", "pw1", "/home")
        .await
        .unwrap();
    visitor.absorb(&res);
    assert_eq!(target, "/secret");

    // The saved path is consumed
    let mut res = HeaderMap::new();
    authorizer.logout(&visitor.request("/logout"), &mut res).unwrap();
    visitor.absorb(&res);
    let target = login(&authorizer, &mut visitor, "alice", "pw1").await;
    assert_eq!(target, "/");
}

#[tokio::test]
async fn test_redirect_on_failure_queues_message() {
    let authorizer = memory_authorizer();
    let mut browser = MockBrowser::new();

    let mut res = HeaderMap::new();
    let _ = authorizer
        .authorize(&browser.request("/secret"), &mut res, None, true)
        .await;
    browser.absorb(&res);

    assert_eq!(
        authorizer.messages(&browser.request("/login"), &mut HeaderMap::new()),
        vec![MSG_LOGIN_REQUIRED]
    );
}

/// A path too long for a cookie is not remembered, but the visitor is still
/// told to log in.
#[tokio::test]
async fn test_over_long_path_is_not_saved() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();

    let path = format!("/{}", "p".repeat(5000));
    let mut res = HeaderMap::new();
    let denied = authorizer
        .authorize(&browser.request(&path), &mut res, None, true)
        .await;
    browser.absorb(&res);

    assert_eq!(denied, Err(AuthError::NotAuthenticated));
    assert!(!browser.has_cookie("redirects"));
    assert_eq!(
        authorizer.messages(&browser.request("/login"), &mut HeaderMap::new()),
        vec![MSG_LOGIN_REQUIRED]
    );
    assert_eq!(login(&authorizer, &mut browser, "alice", "pw").await, "/");
}

#[tokio::test]
async fn test_no_redirect_without_flag() {
    let authorizer = memory_authorizer();
    let browser = MockBrowser::new();

    let mut res = HeaderMap::new();
    let result = authorizer
        .authorize(&browser.request("/secret"), &mut res, None, false)
        .await;

    assert_eq!(result, Err(AuthError::NotAuthenticated));
    assert!(res.is_empty());
}

/// The most recent denied path replaces any earlier one.
#[tokio::test]
async fn test_latest_saved_path_wins() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();

    for path in ["/first", "/second"] {
        let mut res = HeaderMap::new();
        let _ = authorizer
            .authorize(&browser.request(path), &mut res, None, true)
            .await;
        browser.absorb(&res);
    }

    let target = login(&authorizer, &mut browser, "alice", "pw").await;
    assert_eq!(target, "/second");
}

/// Deleting a user invalidates their live session on its next use.
#[tokio::test]
async fn test_deleted_user_session_is_expired() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "alice", "pw").await;

    authorizer.delete_user("alice").await.unwrap();

    let mut res = HeaderMap::new();
    let result = authorizer
        .authorize(&browser.request("/secret"), &mut res, None, true)
        .await;
    browser.absorb(&res);

    assert_eq!(result, Err(AuthError::UserVanished("alice".to_string())));
    assert!(!browser.has_cookie("auth"));
    assert_eq!(
        authorizer.messages(&browser.request("/"), &mut HeaderMap::new()),
        vec![MSG_LOGIN_REQUIRED]
    );

    // The expired session now reads as anonymous
    let result = authorizer
        .authorize(&browser.request("/"), &mut HeaderMap::new(), None, false)
        .await;
    assert_eq!(result, Err(AuthError::NotAuthenticated));
}

#[tokio::test]
async fn test_role_hierarchy() {
    let authorizer = memory_authorizer();
    register_as(&authorizer, "root", "pw", "admin").await;
    register(&authorizer, "alice", "pw").await;

    let mut admin = MockBrowser::new();
    login(&authorizer, &mut admin, "root", "pw").await;
    let mut user = MockBrowser::new();
    login(&authorizer, &mut user, "alice", "pw").await;

    // admin (80) satisfies user (30) and admin (80)
    for required in ["guest", "user", "admin"] {
        let granted = authorizer
            .authorize_role(&admin.request("/"), &mut HeaderMap::new(), required, false)
            .await;
        assert!(granted.is_ok(), "admin should satisfy {required}");
    }

    // user (30) satisfies guest and user but not admin
    assert!(
        authorizer
            .authorize_role(&user.request("/"), &mut HeaderMap::new(), "user", false)
            .await
            .is_ok()
    );

    let mut res = HeaderMap::new();
    let denied = authorizer
        .authorize_role(&user.request("/admin"), &mut res, "admin", true)
        .await;
    assert_eq!(
        denied,
        Err(AuthError::InsufficientPrivilege {
            role: "user".to_string(),
            required: "admin".to_string(),
        })
    );
    // Insufficient privilege does not send the user to log in again
    assert!(res.is_empty());
}

/// Roles missing from the table never grant access.
#[tokio::test]
async fn test_unknown_roles_fail_closed() {
    let backend = Arc::new(MemoryAuthBackend::new());
    let authorizer = authorizer_with(backend.clone());
    register_as(&authorizer, "root", "pw", "admin").await;

    // A record whose role was dropped from configuration
    let mut orphan = backend.user("root").await.unwrap().unwrap();
    orphan.username = "legacy".to_string();
    orphan.role = "superuser".to_string();
    backend.save_user(orphan).await.unwrap();

    let mut root = MockBrowser::new();
    login(&authorizer, &mut root, "root", "pw").await;

    // Required role unknown
    let result = authorizer
        .authorize_role(&root.request("/"), &mut HeaderMap::new(), "owner", false)
        .await;
    assert!(matches!(result, Err(AuthError::InsufficientPrivilege { .. })));

    // User role unknown; the digest is bound to "root", so log in with a
    // freshly hashed record instead
    let mut legacy = backend.user("legacy").await.unwrap().unwrap();
    legacy.hash = httpauth::PasswordHasher::new(4)
        .unwrap()
        .hash("legacy", "pw")
        .await
        .unwrap();
    backend.save_user(legacy).await.unwrap();

    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "legacy", "pw").await;

    // Authenticated without a role requirement, but no role check passes
    assert!(
        authorizer
            .authorize(&browser.request("/"), &mut HeaderMap::new(), None, false)
            .await
            .is_ok()
    );
    for required in ["guest", "user", "admin"] {
        let result = authorizer
            .authorize_role(&browser.request("/"), &mut HeaderMap::new(), required, false)
            .await;
        assert!(
            matches!(result, Err(AuthError::InsufficientPrivilege { .. })),
            "unknown role must not satisfy {required}"
        );
    }
}

#[tokio::test]
async fn test_failed_login_keeps_saved_path() {
    let authorizer = memory_authorizer();
    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();

    let mut res = HeaderMap::new();
    let _ = authorizer
        .authorize(&browser.request("/secret"), &mut res, None, true)
        .await;
    browser.absorb(&res);

    let mut res = HeaderMap::new();
    let failed = authorizer
        .login(&browser.request("/login"), &mut res, "alice", "nope", "/")
        .await;
    browser.absorb(&res);
    assert_eq!(failed, Err(AuthError::InvalidCredentials));
    assert_eq!(
        authorizer.messages(&browser.request("/login"), &mut HeaderMap::new()),
        vec![MSG_LOGIN_REQUIRED, MSG_INVALID_CREDENTIALS]
    );

    let target = login(&authorizer, &mut browser, "alice", "pw").await;
    assert_eq!(target, "/secret");
}

proptest! {
    /// Role permission agrees with the numeric order of levels.
    #[test]
    fn test_permission_matches_level_order(have in "(guest|user|admin)", need in "(guest|user|admin)") {
        let roles = test_roles();
        let expected = roles.level(&have).unwrap() >= roles.level(&need).unwrap();
        prop_assert_eq!(roles.permits(&have, &need), expected);
    }
}
