use std::path::PathBuf;
use std::sync::Arc;

use http::HeaderMap;
use httpauth::{
    AuthBackend, AuthConfig, AuthError, Authorizer, BackendConfig, BackendKind, FileAuthBackend,
    SqlAuthBackend, UserError,
};

use crate::common::{MockBrowser, TEST_BCRYPT_COST, authorizer_with, login, register};

fn scratch_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "httpauth-it-{}.{extension}",
        uuid::Uuid::new_v4()
    ))
}

/// Full register/login/authorize/delete cycle against one backend
async fn exercise_authorizer(backend: Arc<dyn AuthBackend>) {
    let authorizer = authorizer_with(backend);

    register(&authorizer, "alice", "pw").await;
    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "alice", "pw").await;

    let user = authorizer
        .authorize(&browser.request("/"), &mut HeaderMap::new(), Some("user"), false)
        .await
        .unwrap();
    assert_eq!(user.username, "alice");

    let mut res = HeaderMap::new();
    authorizer
        .update(&browser.request("/account"), &mut res, None, Some("new@example.com"))
        .await
        .unwrap();
    assert_eq!(
        authorizer.current_user(&browser.request("/")).await.unwrap().email,
        "new@example.com"
    );

    assert_eq!(authorizer.users().await.unwrap().len(), 1);

    authorizer.delete_user("alice").await.unwrap();
    assert_eq!(
        authorizer.delete_user("alice").await,
        Err(AuthError::DeleteMissing("alice".to_string()))
    );
    assert!(authorizer.users().await.unwrap().is_empty());

    authorizer.close().await;
}

#[tokio::test]
async fn test_file_backend_flow() {
    let path = scratch_path("json");
    let backend = FileAuthBackend::create(&path).await.unwrap();

    exercise_authorizer(Arc::new(backend)).await;

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_sqlite_memory_backend_flow() {
    let backend = SqlAuthBackend::connect_with_table("sqlite::memory:", "flow_users")
        .await
        .unwrap();

    exercise_authorizer(Arc::new(backend)).await;
}

/// Accounts registered through one authorizer survive into a new one over
/// the same file.
#[tokio::test]
async fn test_file_backend_persists_across_authorizers() {
    let path = scratch_path("json");

    {
        let backend = FileAuthBackend::create(&path).await.unwrap();
        let authorizer = authorizer_with(Arc::new(backend));
        register(&authorizer, "alice", "pw").await;
        authorizer.close().await;
    }

    let backend = FileAuthBackend::open(&path).await.unwrap();
    let authorizer = authorizer_with(Arc::new(backend));
    let mut browser = MockBrowser::new();
    login(&authorizer, &mut browser, "alice", "pw").await;

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_missing_file_backend() {
    let result = FileAuthBackend::open(scratch_path("json")).await;
    assert!(matches!(result, Err(UserError::MissingBackend(_))));
}

#[tokio::test]
async fn test_from_config_with_sqlite() {
    let mut config = AuthConfig::new(b"config-key".to_vec());
    config.bcrypt_cost = TEST_BCRYPT_COST;
    config.backend = BackendConfig::new(BackendKind::Sql, Some("sqlite::memory:".to_string()));

    let authorizer = Authorizer::from_config(&config).await.unwrap();
    register(&authorizer, "alice", "pw").await;

    let mut browser = MockBrowser::new();
    assert_eq!(login(&authorizer, &mut browser, "alice", "pw").await, "/");
}

#[tokio::test]
async fn test_from_config_rejects_bad_settings() {
    let mut config = AuthConfig::new(Vec::new());
    assert!(matches!(
        Authorizer::from_config(&config).await,
        Err(AuthError::Config(_))
    ));

    config.cookie_key = b"k".to_vec();
    config.bcrypt_cost = 99;
    assert!(matches!(
        Authorizer::from_config(&config).await,
        Err(AuthError::Config(_))
    ));

    config.bcrypt_cost = TEST_BCRYPT_COST;
    config.default_role = "nobody".to_string();
    assert!(matches!(
        Authorizer::from_config(&config).await,
        Err(AuthError::Config(_))
    ));
}
