//! Login, session persistence, refresh and logout against the fake backend.

#![allow(clippy::unwrap_used)]

use inventory_client::{ApiClient, ClientError, SessionStore, session};
use inventory_core::form::{LoginForm, RegisterForm};
use inventory_integration_tests::FakeBackend;

struct Harness {
    backend: FakeBackend,
    api: ApiClient,
    store: SessionStore,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let backend = FakeBackend::start().await.unwrap();
    backend
        .add_user("alice", "alice@example.com", "correct-horse")
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = backend.config(dir.path().join("session.json")).unwrap();
    let api = ApiClient::new(&config).unwrap();
    let store = SessionStore::new(config.session_file.clone());
    Harness {
        backend,
        api,
        store,
        _dir: dir,
    }
}

fn credentials(username: &str, password: &str) -> inventory_core::form::Credentials {
    LoginForm {
        username: username.to_owned(),
        password: password.to_owned(),
    }
    .validate()
    .unwrap()
}

#[tokio::test]
async fn test_login_persists_verified_session() {
    let h = harness().await;

    let logged_in = session::login(&h.api, &h.store, &credentials("alice", "correct-horse"))
        .await
        .unwrap();
    assert_eq!(logged_in.profile().unwrap().username, "alice");
    assert!(h.store.path().exists());

    let restored = session::restore(&h.api, &h.store).await.unwrap().unwrap();
    assert!(restored.is_verified());
    assert_eq!(restored.profile().unwrap().email, "alice@example.com");
}

#[tokio::test]
async fn test_wrong_password_leaves_no_session() {
    let h = harness().await;

    let err = session::login(&h.api, &h.store, &credentials("alice", "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)), "{err:?}");
    assert!(!h.store.path().exists());
    assert!(session::restore(&h.api, &h.store).await.unwrap().is_none());
}

#[tokio::test]
async fn test_register_reports_server_field_errors() {
    let h = harness().await;
    let form = RegisterForm {
        username: "alice".to_owned(),
        email: "other@example.com".to_owned(),
        password: "another-pass".to_owned(),
    };

    let err = h.api.register(&form.validate().unwrap()).await.unwrap_err();
    let errors = err.field_errors().unwrap();
    assert!(errors.contains("username"));

    let form = RegisterForm {
        username: "bob".to_owned(),
        ..form
    };
    let user = h.api.register(&form.validate().unwrap()).await.unwrap();
    assert_eq!(user.username, "bob");
    assert!(user.id.is_some());
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let h = harness().await;
    session::login(&h.api, &h.store, &credentials("alice", "correct-horse"))
        .await
        .unwrap();

    h.backend.expire_access_tokens().await;
    // Rejected but kept on disk so the refresh token can still be used.
    assert!(session::restore(&h.api, &h.store).await.unwrap().is_none());
    assert!(h.store.path().exists());

    let refreshed = session::refresh(&h.api, &h.store).await.unwrap();
    assert_eq!(refreshed.profile().unwrap().username, "alice");
    assert!(session::restore(&h.api, &h.store).await.unwrap().is_some());
}

#[tokio::test]
async fn test_logout_blacklists_and_clears() {
    let h = harness().await;
    let s = session::login(&h.api, &h.store, &credentials("alice", "correct-horse"))
        .await
        .unwrap();
    assert_eq!(h.backend.live_refresh_tokens().await, 1);

    session::logout(&h.api, &h.store, &s).await.unwrap();
    assert_eq!(h.backend.live_refresh_tokens().await, 0);
    assert!(!h.store.path().exists());

    let err = session::refresh(&h.api, &h.store).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn test_logout_clears_even_when_blacklist_fails() {
    let h = harness().await;
    let s = session::login(&h.api, &h.store, &credentials("alice", "correct-horse"))
        .await
        .unwrap();
    h.api.blacklist(&s).await.unwrap();

    let err = session::logout(&h.api, &h.store, &s).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)), "{err:?}");
    assert!(!h.store.path().exists());
}
