use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use forumbridge::clients::{IdentityProvider, ProviderError, ProviderProfile, ProviderWork};
use forumbridge::config::Config;
use forumbridge::crypto::KeyRing;
use forumbridge::state::SharedState;
use http_body_util::BodyExt;
use rsa::Pkcs1v15Encrypt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct StubProvider;

#[async_trait]
impl IdentityProvider for StubProvider {
    async fn login(&self, identity: &str, _password: &str) -> Result<Value, ProviderError> {
        Ok(json!({
            "token": format!("provider-token-{identity}"),
            "user_info": {"id": format!("ext-{identity}"), "nickname": identity},
        }))
    }

    async fn fetch_profile(
        &self,
        _token: &str,
        _known_id: Option<&str>,
    ) -> Result<Option<ProviderProfile>, ProviderError> {
        Ok(None)
    }

    async fn fetch_work(&self, work_id: i64) -> Result<Option<ProviderWork>, ProviderError> {
        let owner = match work_id {
            42 => "ext-alice",
            43 => "ext-bob",
            500 => return Err(ProviderError::Upstream("work lookup returned 500".to_string())),
            _ => return Ok(None),
        };
        Ok(Some(ProviderWork {
            id: work_id,
            work_name: format!("Work {work_id}"),
            preview: Some("https://cdn.example/cover.png".to_string()),
            description: Some(String::new()),
            praise_times: 10,
            view_times: 100,
            user_info: Some(json!({"id": owner})),
        }))
    }
}

struct TestApp {
    router: Router,
    keys: Arc<KeyRing>,
}

async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let keys = Arc::new(KeyRing::generate(1024).expect("Failed to generate keys"));
    let shared = Arc::new(
        SharedState::with_components(config, keys.clone(), Arc::new(StubProvider))
            .await
            .expect("Failed to create shared state"),
    );
    let state = forumbridge::api::create_app_state(shared, None);

    TestApp {
        router: forumbridge::api::router(state).await,
        keys,
    }
}

impl TestApp {
    async fn login(&self, identity: &str) -> String {
        let ciphertext = self
            .keys
            .public_key()
            .encrypt(&mut rsa::rand_core::OsRng, Pkcs1v15Encrypt, b"password")
            .unwrap();
        let body = json!({"identity": identity, "password": STANDARD.encode(ciphertext)});

        let (status, body) = self.call("POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn create_post(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/posts",
                Some(token),
                Some(json!({"title": title, "content": "Hello world", "category_id": 1})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create post failed: {body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_and_categories() {
    let app = spawn_app().await;

    let (status, body) = app.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = app.call("GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(
        headers["content-type"].to_str().unwrap(),
        mime::APPLICATION_JSON.as_ref()
    );
}

#[tokio::test]
async fn test_post_lifecycle() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let (status, _) = app
        .call("POST", "/api/posts", None, Some(json!({"title": "t", "content": "c"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            "POST",
            "/api/posts",
            Some(&alice),
            Some(json!({"title": "   ", "content": "c"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let post_id = app.create_post(&alice, "First post").await;

    let (status, body) = app
        .call("GET", &format!("/api/posts/{post_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);
    assert_eq!(body["data"]["author"]["display_name"], "alice");

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/posts/{post_id}"),
            Some(&bob),
            Some(json!({"title": "Hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/posts/{post_id}"),
            Some(&alice),
            Some(json!({"title": "Edited"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["content"], "Hello world");

    let (_, body) = app.call("GET", "/api/posts?category_id=1", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = app.call("GET", "/api/posts?category_id=2", None, None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.call("GET", "/api/users/1/posts", None, None).await;
    assert_eq!(body["data"][0]["id"], post_id);

    let (status, _) = app
        .call("DELETE", &format!("/api/posts/{post_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("GET", &format!("/api/posts/{post_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_pinning_requires_admin() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let alice = app.login("alice").await;

    let older = app.create_post(&alice, "Older").await;
    app.create_post(&alice, "Newer").await;

    let (status, _) = app
        .call("PUT", &format!("/api/posts/{older}/pin"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("PUT", &format!("/api/posts/{older}/pin"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_pinned"], true);

    let (_, body) = app.call("GET", "/api/posts", None, None).await;
    assert_eq!(body["data"][0]["id"], older);
}

#[tokio::test]
async fn test_likes_toggle_and_notify() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let post_id = app.create_post(&alice, "Like me").await;

    let like_uri = format!("/api/posts/{post_id}/like");
    let (_, body) = app.call("POST", &like_uri, Some(&bob), None).await;
    assert_eq!(body["data"], json!({"liked": true, "likes": 1}));

    let (_, body) = app
        .call("GET", &format!("/api/posts/{post_id}"), Some(&bob), None)
        .await;
    assert_eq!(body["data"]["is_liked"], true);

    let (_, body) = app.call("POST", &like_uri, Some(&bob), None).await;
    assert_eq!(body["data"], json!({"liked": false, "likes": 0}));

    let (_, body) = app.call("POST", &like_uri, Some(&alice), None).await;
    assert_eq!(body["data"]["liked"], true);

    let (_, body) = app
        .call("GET", "/api/notifications", Some(&alice), None)
        .await;
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "like");
    assert_eq!(notifications[0]["sender"]["display_name"], "bob");
}

#[tokio::test]
async fn test_comments_replies_and_mentions() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let carol = app.login("carol").await;
    let post_id = app.create_post(&alice, "Discuss").await;
    let comments_uri = format!("/api/posts/{post_id}/comments");

    let (status, body) = app
        .call(
            "POST",
            &comments_uri,
            Some(&bob),
            Some(json!({"content": "Nice one @carol and @nobody"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .call(
            "POST",
            &comments_uri,
            Some(&carol),
            Some(json!({"content": "Thanks", "parent_id": comment_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            &comments_uri,
            Some(&carol),
            Some(json!({"content": "x".repeat(1001)})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let kinds = |body: &Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["kind"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    assert_eq!(kinds(&body), vec!["comment"]);
    let (_, body) = app.call("GET", "/api/notifications", Some(&bob), None).await;
    assert_eq!(kinds(&body), vec!["reply"]);
    let (_, body) = app.call("GET", "/api/notifications", Some(&carol), None).await;
    assert_eq!(kinds(&body), vec!["mention"]);

    let (_, body) = app.call("GET", &comments_uri, None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .call("POST", &format!("/api/comments/{comment_id}/like"), Some(&carol), None)
        .await;
    assert_eq!(body["data"]["likes"], 1);

    let delete_uri = format!("/api/posts/{post_id}/comments/{comment_id}");
    let (status, _) = app.call("DELETE", &delete_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &delete_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call("GET", &comments_uri, None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_notifications_mark_read() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let first = app.create_post(&alice, "One").await;
    let second = app.create_post(&alice, "Two").await;

    for id in [first, second] {
        app.call("POST", &format!("/api/posts/{id}/like"), Some(&bob), None)
            .await;
    }

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    let id = body["data"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .call("POST", &format!("/api/notifications/{id}/read"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("POST", &format!("/api/notifications/{id}/read"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call("POST", "/api/notifications/read-all", Some(&alice), None)
        .await;
    assert_eq!(body["data"]["updated"], 1);

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|n| n["is_read"] == true)
    );
}

#[tokio::test]
async fn test_follow_graph() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let (status, _) = app.call("POST", "/api/users/1/follow", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.call("POST", "/api/users/1/follow", Some(&bob), None).await;
    assert_eq!(body["data"]["following"], true);
    let (_, body) = app.call("POST", "/api/users/1/follow", Some(&bob), None).await;
    assert_eq!(body["data"]["following"], true);

    let (_, body) = app.call("GET", "/api/users/1", Some(&bob), None).await;
    assert_eq!(body["data"]["followers_count"], 1);
    assert_eq!(body["data"]["is_following"], true);

    let (_, body) = app.call("GET", "/api/users/1/followers", None, None).await;
    assert_eq!(body["data"][0]["display_name"], "bob");
    let (_, body) = app.call("GET", "/api/users/2/following", None, None).await;
    assert_eq!(body["data"][0]["id"], 1);

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["kind"], "follow");

    let (_, body) = app.call("DELETE", "/api/users/1/follow", Some(&bob), None).await;
    assert_eq!(body["data"]["following"], false);
    let (_, body) = app.call("GET", "/api/users/1", None, None).await;
    assert_eq!(body["data"]["followers_count"], 0);
    assert_eq!(body["data"]["is_following"], false);

    let (status, _) = app.call("GET", "/api/users/99", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_work_submission_and_likes() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let (status, _) = app
        .call("POST", "/api/works", Some(&alice), Some(json!({"work_id": 43})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call("POST", "/api/works", Some(&alice), Some(json!({"work_id": 7})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call("POST", "/api/works", Some(&alice), Some(json!({"work_id": 500})))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "upstream_error");

    let (status, _) = app
        .call(
            "POST",
            "/api/works",
            Some(&alice),
            Some(json!({"work_id": 42, "bcm_url": "javascript:alert(1)"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("POST", "/api/works", Some(&alice), Some(json!({"work_id": 42})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Work 42");
    assert_eq!(body["data"]["likes"], 10);
    assert!(body["data"]["description"].is_null());

    let (_, body) = app
        .call("POST", "/api/works/42/like", Some(&bob), None)
        .await;
    assert_eq!(body["data"], json!({"liked": true, "likes": 11}));

    let (_, body) = app.call("GET", "/api/works/42", Some(&bob), None).await;
    assert_eq!(body["data"]["is_liked"], true);
    assert_eq!(body["data"]["owner"]["display_name"], "alice");

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["data"][0]["kind"], "work_like");

    let (_, body) = app.call("GET", "/api/trending/works", None, None).await;
    assert_eq!(body["data"][0]["work_id"], 42);
}

#[tokio::test]
async fn test_work_comment_threads() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let carol = app.login("carol").await;

    let comments_uri = "/api/works/42/comments";
    let (status, _) = app
        .call("POST", comments_uri, Some(&bob), Some(json!({"content": "Early"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.call("POST", "/api/works", Some(&alice), Some(json!({"work_id": 42})))
        .await;

    let (status, body) = app
        .call("POST", comments_uri, Some(&bob), Some(json!({"content": "  Great maze  "})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["work_id"], 42);
    assert_eq!(body["data"]["content"], "Great maze");
    assert_eq!(body["data"]["author"]["display_name"], "bob");
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .call(
            "POST",
            comments_uri,
            Some(&carol),
            Some(json!({"content": "Agreed", "parent_id": comment_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            comments_uri,
            Some(&carol),
            Some(json!({"content": "Lost", "parent_id": 999})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call("GET", "/api/notifications", Some(&alice), None).await;
    assert_eq!(body["data"][0]["kind"], "work_comment");
    let (_, body) = app.call("GET", "/api/notifications", Some(&bob), None).await;
    assert_eq!(body["data"][0]["kind"], "work_reply");

    let like_uri = format!("/api/works/comments/{comment_id}/like");
    let (_, body) = app.call("POST", &like_uri, Some(&carol), None).await;
    assert_eq!(body["data"], json!({"liked": true, "likes": 1}));

    let (status, body) = app.call("GET", comments_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    let thread = body["data"].as_array().unwrap();
    assert_eq!(thread.len(), 2);
    let liked: Vec<_> = thread.iter().filter(|c| c["is_liked"] == true).collect();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["id"], comment_id);

    let (_, body) = app.call("POST", &like_uri, Some(&carol), None).await;
    assert_eq!(body["data"], json!({"liked": false, "likes": 0}));

    let report_uri = format!("/api/works/comments/{comment_id}/report");
    let (status, _) = app
        .call("POST", &report_uri, Some(&carol), Some(json!({"reason": "no"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = app
        .call("POST", &report_uri, Some(&carol), Some(json!({"reason": "Off topic spam"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["target_type"], "work_comment");
    assert_eq!(body["data"]["target_id"], comment_id.to_string());

    let (_, body) = app
        .call("GET", "/api/admin/reports?status=pending", Some(&owner), None)
        .await;
    assert_eq!(body["data"][0]["target_type"], "work_comment");

    let delete_uri = format!("/api/works/comments/{comment_id}");
    let (status, _) = app.call("DELETE", &delete_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &delete_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("POST", &like_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.call("GET", comments_uri, None, None).await;
    let thread = body["data"].as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["content"], "Agreed");
    assert_eq!(thread[0]["parent_id"], comment_id);
}

#[tokio::test]
async fn test_trending_posts_rank_engagement() {
    let app = spawn_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;

    let quiet = app.create_post(&alice, "Quiet").await;
    let popular = app.create_post(&alice, "Popular").await;

    app.call("POST", &format!("/api/posts/{popular}/like"), Some(&bob), None)
        .await;
    for _ in 0..3 {
        app.call("GET", &format!("/api/posts/{popular}"), None, None)
            .await;
    }

    let (status, body) = app.call("GET", "/api/trending/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![popular, quiet]);
}

#[tokio::test]
async fn test_reports_and_resolution() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let alice = app.login("alice").await;
    let post_id = app.create_post(&owner, "Reported").await;

    let (status, _) = app
        .call(
            "POST",
            "/api/reports",
            Some(&alice),
            Some(json!({"target_type": "post", "target_id": post_id, "reason": "bad"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/reports",
            Some(&alice),
            Some(json!({"target_type": "planet", "target_id": 1, "reason": "Spam content"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/reports",
            Some(&alice),
            Some(json!({"target_type": "post", "target_id": 999, "reason": "Spam content"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            "POST",
            "/api/reports",
            Some(&alice),
            Some(json!({"target_type": "post", "target_id": post_id.to_string(), "reason": "Spam content"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let report_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .call("GET", "/api/admin/reports", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .call("GET", "/api/admin/reports?status=pending", Some(&owner), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resolve_uri = format!("/api/admin/reports/{report_id}/resolve");
    let (status, _) = app
        .call("POST", &resolve_uri, Some(&owner), Some(json!({"status": "pending"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("POST", &resolve_uri, Some(&owner), Some(json!({"status": "resolved"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "resolved");
    assert_eq!(body["data"]["resolved_by"], 1);

    let (_, body) = app
        .call("GET", "/api/admin/reports?status=pending", Some(&owner), None)
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_management() {
    let app = spawn_app().await;
    let owner = app.login("owner").await;
    let alice = app.login("alice").await;
    app.login("bob").await;

    let (status, _) = app
        .call(
            "POST",
            "/api/admin/users/ban",
            Some(&owner),
            Some(json!({"user_id": 1, "reason": "self"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/admin/users/admin",
            Some(&owner),
            Some(json!({"user_id": 2, "is_admin": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            "/api/admin/users/admin",
            Some(&alice),
            Some(json!({"user_id": 3, "is_admin": true})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .call("GET", "/api/admin/users?q=bo&page=1&limit=10", Some(&alice), None)
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["users"][0]["display_name"], "bob");

    let (_, body) = app
        .call("GET", "/api/admin/settings/ban-screen", Some(&alice), None)
        .await;
    assert!(body["data"]["html"].as_str().unwrap().contains("Account Suspended"));

    let (status, _) = app
        .call(
            "PUT",
            "/api/admin/settings/ban-screen",
            Some(&alice),
            Some(json!({"html": "  "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
