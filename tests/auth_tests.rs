use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use forumbridge::clients::{IdentityProvider, ProviderError, ProviderProfile, ProviderWork};
use forumbridge::config::Config;
use forumbridge::crypto::KeyRing;
use forumbridge::state::SharedState;
use http_body_util::BodyExt;
use rsa::Pkcs1v15Encrypt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

/// Accepts `password` for every account; `external_id` is derived from the identity.
/// A few identities return responses without an embedded user object.
struct StubProvider {
    logins: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn login(&self, identity: &str, password: &str) -> Result<Value, ProviderError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if password != "password" {
            return Err(ProviderError::InvalidCredentials);
        }
        match identity {
            "broken" => return Ok(json!({"message": "ok"})),
            "cat" => return Ok(json!({"auth": {"token": signed_looking_token(555)}})),
            "mute" => return Ok(json!({"auth": {"token": signed_looking_token(556)}})),
            "opaque" => return Ok(json!({"ticket": "opaque-ticket"})),
            "ghost" => return Ok(json!({"token": "ghost-token"})),
            _ => {}
        }
        Ok(json!({
            "token": format!("provider-token-{identity}"),
            "user_info": {"id": format!("ext-{identity}"), "nickname": identity},
        }))
    }

    async fn fetch_profile(
        &self,
        token: &str,
        known_id: Option<&str>,
    ) -> Result<Option<ProviderProfile>, ProviderError> {
        let profile = match (token, known_id) {
            (_, Some("555")) => ProviderProfile {
                external_id: "555".to_string(),
                nickname: Some("Cat".to_string()),
                avatar_url: Some("https://cdn.example/cat.png".to_string()),
                description: None,
            },
            (_, Some("556")) => return Err(ProviderError::Upstream("profile offline".to_string())),
            ("opaque-ticket", None) => ProviderProfile {
                external_id: "777".to_string(),
                nickname: None,
                avatar_url: None,
                description: None,
            },
            _ => return Ok(None),
        };
        Ok(Some(profile))
    }

    async fn fetch_work(&self, _work_id: i64) -> Result<Option<ProviderWork>, ProviderError> {
        Ok(None)
    }
}

/// A JWT-shaped token whose payload names `user_id`; the signature is junk.
fn signed_looking_token(user_id: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"user_id": user_id, "iat": 1}).to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

struct TestApp {
    router: Router,
    shared: Arc<SharedState>,
    keys: Arc<KeyRing>,
    provider: Arc<StubProvider>,
}

async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let keys = Arc::new(KeyRing::generate(1024).expect("Failed to generate keys"));
    let provider = Arc::new(StubProvider {
        logins: AtomicUsize::new(0),
    });

    let shared = Arc::new(
        SharedState::with_components(config, keys.clone(), provider.clone())
            .await
            .expect("Failed to create shared state"),
    );
    let state = forumbridge::api::create_app_state(shared.clone(), None);
    let router = forumbridge::api::router(state).await;

    TestApp {
        router,
        shared,
        keys,
        provider,
    }
}

fn encrypt(keys: &KeyRing, plaintext: &str) -> String {
    let ciphertext = keys
        .public_key()
        .encrypt(&mut rsa::rand_core::OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
        .unwrap();
    STANDARD.encode(ciphertext)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn login_raw(app: &Router, identity: &str, encrypted: &str) -> (StatusCode, Value) {
    let body = json!({"identity": identity, "password": encrypted});
    send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn login(app: &TestApp, identity: &str) -> String {
    let (status, body) = login_raw(&app.router, identity, &encrypt(&app.keys, "password")).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn get_authed(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_public_key_endpoint() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app.router,
        Request::builder()
            .uri("/api/auth/public-key")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["public_key"].as_str().unwrap(),
        app.keys.public_key_pem()
    );
}

#[tokio::test]
async fn test_login_issues_session_and_creates_user() {
    let app = spawn_app().await;

    let (status, body) =
        login_raw(&app.router, "alice", &encrypt(&app.keys, "password")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["user"]["external_id"], "ext-alice");
    assert_eq!(data["user"]["display_name"], "alice");

    let expires_at = data["expires_at"].as_i64().unwrap();
    let week = chrono::Utc::now().timestamp() + 7 * 24 * 3600;
    assert!((expires_at - week).abs() < 60);

    let token = data["token"].as_str().unwrap();
    let (status, me) = get_authed(&app.router, "/api/users/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["external_id"], "ext-alice");

    let stored = app
        .shared
        .store
        .users()
        .get_credentials(me["data"]["id"].as_i64().unwrap() as i32)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.login_identity, "alice");
    assert_ne!(stored.encrypted_secret, "password");
    assert_eq!(
        app.keys.vault().open(&stored.encrypted_secret).unwrap(),
        "password"
    );
}

#[tokio::test]
async fn test_repeat_login_reuses_user() {
    let app = spawn_app().await;

    let first = login(&app, "bob").await;
    let second = login(&app, "bob").await;
    assert_ne!(first, second);

    assert_eq!(app.shared.store.users().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_user() {
    let app = spawn_app().await;

    let attempts = (0..4).map(|_| login(&app, "carol"));
    let tokens = futures::future::join_all(attempts).await;

    assert_eq!(tokens.len(), 4);
    assert_eq!(app.shared.store.users().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_ciphertext_never_reaches_provider() {
    let app = spawn_app().await;

    let (status, body) = login_raw(&app.router, "alice", "%%% not base64 %%%").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_encryption");
    assert_eq!(app.provider.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_failures_are_distinguished() {
    let app = spawn_app().await;

    let (status, body) = login_raw(&app.router, "alice", &encrypt(&app.keys, "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "invalid_credentials");

    let (status, body) =
        login_raw(&app.router, "broken", &encrypt(&app.keys, "password")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "login_failed");

    let (status, body) = login_raw(&app.router, "  ", "abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    assert_eq!(app.shared.store.users().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_session_token_rejections() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app.router,
        Request::builder()
            .uri("/api/users/me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "missing_token");

    let (status, body) = get_authed(&app.router, "/api/users/me", "not.a.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_malformed");

    login(&app, "dave").await;
    let (expired, _) = app
        .keys
        .session_codec(chrono::Duration::seconds(-120))
        .issue(1)
        .unwrap();
    let (status, body) = get_authed(&app.router, "/api/users/me", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_expired");

    let (ghost, _) = app
        .keys
        .session_codec(chrono::Duration::days(7))
        .issue(999)
        .unwrap();
    let (status, body) = get_authed(&app.router, "/api/users/me", &ghost).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "user_not_found");
}

#[tokio::test]
async fn test_first_user_is_site_owner() {
    let app = spawn_app().await;

    let owner = login(&app, "owner").await;
    let member = login(&app, "member").await;

    let (_, me) = get_authed(&app.router, "/api/users/me", &owner).await;
    assert_eq!(me["data"]["id"], 1);
    assert_eq!(me["data"]["is_admin"], true);

    let (_, me) = get_authed(&app.router, "/api/users/me", &member).await;
    assert_eq!(me["data"]["is_admin"], false);

    let (status, _) = get_authed(&app.router, "/api/admin/users", &member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = get_authed(&app.router, "/api/admin/users", &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_banned_user_is_locked_out() {
    let app = spawn_app().await;

    let owner = login(&app, "owner").await;
    let member = login(&app, "mallory").await;

    let (status, _) = send(
        &app.router,
        Request::builder()
            .method("PUT")
            .uri("/api/admin/settings/ban-screen")
            .header("Authorization", format!("Bearer {owner}"))
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"html": "<p>Banned: {reason}</p>"}).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/admin/users/ban")
            .header("Authorization", format!("Bearer {owner}"))
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({"user_id": 2, "reason": "<spam>"}).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_authed(&app.router, "/api/users/me", &member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "account_banned");
    assert_eq!(body["data"]["ban_reason"], "<spam>");
    assert_eq!(body["data"]["ban_screen"], "<p>Banned: &lt;spam&gt;</p>");

    let (status, body) =
        login_raw(&app.router, "mallory", &encrypt(&app.keys, "password")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "account_banned");
    assert!(body["data"]["token"].is_null());
}

#[tokio::test]
async fn test_provider_session_refresh_uses_stored_credentials() {
    let app = spawn_app().await;

    let token = login(&app, "erin").await;
    assert_eq!(app.provider.logins.load(Ordering::SeqCst), 1);

    let (status, _) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/auth/provider-session")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.provider.logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_login_resolves_identity_from_token_payload() {
    let app = spawn_app().await;

    let token = login(&app, "cat").await;
    let (status, me) = get_authed(&app.router, "/api/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["external_id"], "555");
    assert_eq!(me["data"]["display_name"], "Cat");
    assert_eq!(me["data"]["avatar_url"], "https://cdn.example/cat.png");

    // A failing profile lookup still logs the user in under the payload id.
    let token = login(&app, "mute").await;
    let (_, me) = get_authed(&app.router, "/api/users/me", &token).await;
    assert_eq!(me["data"]["external_id"], "556");
    assert_eq!(me["data"]["display_name"], "User 556");
}

#[tokio::test]
async fn test_login_falls_back_to_profile_endpoint() {
    let app = spawn_app().await;

    let token = login(&app, "opaque").await;
    let (status, me) = get_authed(&app.router, "/api/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["external_id"], "777");
    assert_eq!(me["data"]["display_name"], "User 777");
}

#[tokio::test]
async fn test_unresolvable_identity_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = login_raw(&app.router, "ghost", &encrypt(&app.keys, "password")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "login_failed");
    assert!(body["data"]["token"].is_null());
    assert_eq!(app.shared.store.users().count().await.unwrap(), 0);
}
