//! End-to-end tests against the real router: a fresh SQLite file per test,
//! requests driven through `tower::ServiceExt::oneshot`, sessions carried
//! the way a browser would — via the auth cookie.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use vent_api::auth::{AppState, AppStateInner, AuthConfig};

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = vent_db::Database::open(&dir.path().join("test.db")).unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db,
            config: AuthConfig {
                jwt_secret: "test-secret".into(),
                secure_cookies: false,
            },
        });

        Self {
            router: vent_api::router(state),
            _dir: dir,
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value, Option<String>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value, set_cookie)
    }

    /// Registers a user and returns the session cookie to send back.
    async fn register(&self, email: &str, password: &str) -> String {
        let (status, _, set_cookie) = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({"email": email, "password": password})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        cookie_pair(&set_cookie.unwrap())
    }

    /// Creates a post and returns its id.
    async fn create_post(&self, cookie: &str, content: &str, emotion: &str, category: &str) -> String {
        let (status, body, _) = self
            .request(
                "POST",
                "/posts",
                Some(cookie),
                Some(json!({"content": content, "emotion": emotion, "category": category})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["post"]["id"].as_str().unwrap().to_string()
    }

    async fn create_comment(&self, cookie: &str, post_id: &str, content: &str) -> String {
        let (status, body, _) = self
            .request(
                "POST",
                "/comments",
                Some(cookie),
                Some(json!({"postId": post_id, "content": content})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["comment"]["id"].as_str().unwrap().to_string()
    }

    async fn notifications(&self, cookie: &str) -> Vec<Value> {
        let (status, body, _) = self.request("GET", "/notifications", Some(cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        body["notifications"].as_array().unwrap().clone()
    }
}

/// "authToken=..." without the attributes, ready to send back as a Cookie.
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

fn collect_keys(value: &Value, keys: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                keys.push(k.clone());
                collect_keys(v, keys);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_keys(v, keys);
            }
        }
        _ => {}
    }
}

// -- Auth --

#[tokio::test]
async fn register_sets_cookie_and_writes_welcome_notification() {
    let app = TestApp::new();

    let (status, body, set_cookie) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "secret1"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@x.com");
    // The token travels only in the cookie, never in the body
    assert!(body["token"].is_null());

    let set_cookie = set_cookie.unwrap();
    assert!(set_cookie.starts_with("authToken="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));

    let cookie = cookie_pair(&set_cookie);
    let notifications = app.notifications(&cookie).await;
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0]["message"].as_str().unwrap().contains("Welcome"));
    assert_eq!(notifications[0]["isRead"], false);
}

#[tokio::test]
async fn register_validates_input_and_rejects_duplicates() {
    let app = TestApp::new();

    let (status, _, _) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "not-an-email", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.register("a@x.com", "secret1").await;
    let (status, body, _) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@x.com", "password": "secret2"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");

    // Same address in different case is still a duplicate
    let (status, _, _) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "A@X.com", "password": "secret2"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failure_is_generic_for_unknown_email_and_bad_password() {
    let app = TestApp::new();
    app.register("a@x.com", "secret1").await;

    let (wrong_pw_status, wrong_pw_body, _) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "wrong-pass"})),
        )
        .await;
    let (no_user_status, no_user_body, _) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "nobody@x.com", "password": "secret1"})),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    // Anti-enumeration: the two failures are indistinguishable
    assert_eq!(wrong_pw_body, no_user_body);
}

#[tokio::test]
async fn login_succeeds_and_issues_a_working_session() {
    let app = TestApp::new();
    app.register("a@x.com", "secret1").await;

    let (status, body, set_cookie) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@x.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.com");

    let cookie = cookie_pair(&set_cookie.unwrap());
    let (status, body, _) = app.request("GET", "/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn me_is_null_for_anonymous_and_clears_invalid_cookies() {
    let app = TestApp::new();

    let (status, body, _) = app.request("GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].is_null());

    let (status, body, set_cookie) = app
        .request("GET", "/auth/me", Some("authToken=garbage"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"].is_null());
    assert!(set_cookie.unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new();
    let cookie = app.register("a@x.com", "secret1").await;

    let (status, _, set_cookie) = app.request("POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let set_cookie = set_cookie.unwrap();
    assert!(set_cookie.starts_with("authToken=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

// -- Anonymity --

#[tokio::test]
async fn feed_never_exposes_author_identity() {
    let app = TestApp::new();
    let author = app.register("a@x.com", "secret1").await;
    let commenter = app.register("b@x.com", "secret1").await;
    let post_id = app.create_post(&author, "hi", "sad", "Work").await;
    app.create_comment(&commenter, &post_id, "hang in there").await;

    // Anonymous viewer
    let (status, body, _) = app.request("GET", "/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let mut keys = Vec::new();
    collect_keys(&body, &mut keys);
    for key in &keys {
        assert_ne!(key, "authorId");
        assert_ne!(key, "authorEmail");
        assert_ne!(key, "email");
    }
    let raw = body.to_string();
    assert!(!raw.contains("a@x.com"));
    assert!(!raw.contains("b@x.com"));

    let post = &body["posts"][0];
    assert_eq!(post["isMine"], false);
    assert_eq!(post["comments"][0]["isMine"], false);

    // The author recognizes their post but not the foreign comment
    let (_, body, _) = app.request("GET", "/posts", Some(&author), None).await;
    assert_eq!(body["posts"][0]["isMine"], true);
    assert_eq!(body["posts"][0]["comments"][0]["isMine"], false);

    // The commenter: reverse
    let (_, body, _) = app.request("GET", "/posts", Some(&commenter), None).await;
    assert_eq!(body["posts"][0]["isMine"], false);
    assert_eq!(body["posts"][0]["comments"][0]["isMine"], true);
}

#[tokio::test]
async fn feed_filters_by_emotion_and_category() {
    let app = TestApp::new();
    let cookie = app.register("a@x.com", "secret1").await;
    app.create_post(&cookie, "one", "sad", "Work").await;
    app.create_post(&cookie, "two", "happy", "Work").await;
    app.create_post(&cookie, "three", "sad", "Health").await;

    let (_, body, _) = app.request("GET", "/posts?emotion=sad", None, None).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);

    let (_, body, _) = app
        .request("GET", "/posts?emotion=sad&category=Work", None, None)
        .await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "one");
}

#[tokio::test]
async fn dashboard_requires_identity_and_shows_only_own_posts_with_emails() {
    let app = TestApp::new();
    let a = app.register("a@x.com", "secret1").await;
    let b = app.register("b@x.com", "secret1").await;
    let post_id = app.create_post(&a, "mine", "sad", "Work").await;
    app.create_post(&b, "theirs", "happy", "General").await;
    app.create_comment(&b, &post_id, "a comment").await;

    let (status, _, _) = app.request("GET", "/posts?dashboard=true", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body, _) = app
        .request("GET", "/posts?dashboard=true", Some(&a), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "mine");
    assert_eq!(posts[0]["authorEmail"], "a@x.com");
    // Dashboard context reveals commenter identity to the post owner
    assert_eq!(posts[0]["comments"][0]["authorEmail"], "b@x.com");
}

// -- Ownership --

#[tokio::test]
async fn only_the_author_can_edit_or_delete_a_post() {
    let app = TestApp::new();
    let a = app.register("a@x.com", "secret1").await;
    let b = app.register("b@x.com", "secret1").await;
    let post_id = app.create_post(&a, "original", "sad", "Work").await;

    let update = json!({"content": "hijacked", "emotion": "happy", "category": "General"});
    let (status, body, _) = app
        .request("PUT", &format!("/posts/{post_id}"), Some(&b), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "FORBIDDEN");

    let (status, _, _) = app
        .request("DELETE", &format!("/posts/{post_id}"), Some(&b), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No session at all fails closed earlier
    let (status, _, _) = app
        .request("PUT", &format!("/posts/{post_id}"), None, Some(update))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body, _) = app
        .request(
            "PUT",
            &format!("/posts/{post_id}"),
            Some(&a),
            Some(json!({"content": "edited", "emotion": "excited", "category": "Family"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["content"], "edited");
    assert_eq!(body["post"]["emotion"], "excited");

    // The stored record reflects the change
    let (_, body, _) = app.request("GET", "/posts", None, None).await;
    assert_eq!(body["posts"][0]["content"], "edited");
    assert_eq!(body["posts"][0]["category"], "Family");
}

#[tokio::test]
async fn missing_post_is_not_found_before_any_ownership_check() {
    let app = TestApp::new();
    let b = app.register("b@x.com", "secret1").await;

    let ghost = uuid::Uuid::new_v4();
    let (status, body, _) = app
        .request(
            "PUT",
            &format!("/posts/{ghost}"),
            Some(&b),
            Some(json!({"content": "x", "emotion": "sad", "category": "Work"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");

    let (status, _, _) = app
        .request("DELETE", &format!("/posts/{ghost}"), Some(&b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_deletion_honors_dual_ownership() {
    let app = TestApp::new();
    let post_author = app.register("a@x.com", "secret1").await;
    let commenter = app.register("b@x.com", "secret1").await;
    let third = app.register("c@x.com", "secret1").await;
    let post_id = app.create_post(&post_author, "hi", "sad", "Work").await;

    // A third party can delete neither
    let comment_id = app.create_comment(&commenter, &post_id, "one").await;
    let (status, _, _) = app
        .request("DELETE", &format!("/comments/{comment_id}"), Some(&third), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The comment author can delete their own comment
    let (status, _, _) = app
        .request("DELETE", &format!("/comments/{comment_id}"), Some(&commenter), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // The post author can delete a comment they did not write
    let comment_id = app.create_comment(&commenter, &post_id, "two").await;
    let (status, _, _) = app
        .request("DELETE", &format!("/comments/{comment_id}"), Some(&post_author), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Gone now
    let (status, _, _) = app
        .request("DELETE", &format!("/comments/{comment_id}"), Some(&post_author), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commenting_requires_an_existing_post() {
    let app = TestApp::new();
    let cookie = app.register("a@x.com", "secret1").await;

    let ghost = uuid::Uuid::new_v4();
    let (status, _, _) = app
        .request(
            "POST",
            "/comments",
            Some(&cookie),
            Some(json!({"postId": ghost, "content": "into the void"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Reports & notifications --

#[tokio::test]
async fn report_notifies_the_author_and_deduplicates() {
    let app = TestApp::new();
    let author = app.register("a@x.com", "secret1").await;
    let reporter = app.register("b@x.com", "secret1").await;
    let post_id = app.create_post(&author, "hi", "sad", "Work").await;

    let before = app.notifications(&author).await.len();

    let (status, _, _) = app
        .request(
            "POST",
            "/reports",
            Some(&reporter),
            Some(json!({"postId": post_id, "reason": "spam"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let after = app.notifications(&author).await;
    assert_eq!(after.len(), before + 1);
    // Newest first; names the category, never the reporter
    let message = after[0]["message"].as_str().unwrap();
    assert!(message.contains("Work"));
    assert!(!message.contains("b@x.com"));

    // The reporter gets nothing
    assert_eq!(app.notifications(&reporter).await.len(), 1); // welcome only

    // Duplicate report from the same reporter
    let (status, body, _) = app
        .request(
            "POST",
            "/reports",
            Some(&reporter),
            Some(json!({"postId": post_id, "reason": "still spam"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");
}

#[tokio::test]
async fn self_report_is_rejected_regardless_of_prior_state() {
    let app = TestApp::new();
    let author = app.register("a@x.com", "secret1").await;
    let post_id = app.create_post(&author, "hi", "sad", "Work").await;

    for _ in 0..2 {
        let (status, _, _) = app
            .request(
                "POST",
                "/reports",
                Some(&author),
                Some(json!({"postId": post_id, "reason": "testing"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn reporting_a_missing_post_is_not_found() {
    let app = TestApp::new();
    let cookie = app.register("a@x.com", "secret1").await;

    let ghost = uuid::Uuid::new_v4();
    let (status, _, _) = app
        .request(
            "POST",
            "/reports",
            Some(&cookie),
            Some(json!({"postId": ghost, "reason": "spam"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notification_acknowledgment_is_owner_scoped_and_one_way() {
    let app = TestApp::new();
    let a = app.register("a@x.com", "secret1").await;
    let b = app.register("b@x.com", "secret1").await;

    let notifications = app.notifications(&a).await;
    let welcome = &notifications[0];
    let id = welcome["id"].as_str().unwrap().to_string();
    assert_eq!(welcome["isRead"], false);

    // Another identity sees 404, not 403 — existence is never confirmed
    let (status, _, _) = app
        .request("PATCH", "/notifications", Some(&b), Some(json!({"id": id})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body, _) = app
        .request("PATCH", "/notifications", Some(&a), Some(json!({"id": id})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["isRead"], true);

    // Acknowledging again is a no-op returning the read state
    let (status, body, _) = app
        .request("PATCH", "/notifications", Some(&a), Some(json!({"id": id})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["isRead"], true);
}

// -- Lifecycle --

#[tokio::test]
async fn deleting_a_post_removes_it_and_its_comments_from_the_feed() {
    let app = TestApp::new();
    let a = app.register("a@x.com", "secret1").await;
    let b = app.register("b@x.com", "secret1").await;
    let post_id = app.create_post(&a, "hi", "sad", "Work").await;
    let comment_id = app.create_comment(&b, &post_id, "bye").await;

    let (status, _, _) = app
        .request("DELETE", &format!("/posts/{post_id}"), Some(&a), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body, _) = app.request("GET", "/posts", None, None).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);

    // The cascaded comment is unreachable
    let (status, _, _) = app
        .request("DELETE", &format!("/comments/{comment_id}"), Some(&b), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_require_a_session() {
    let app = TestApp::new();

    let (status, _, _) = app
        .request(
            "POST",
            "/posts",
            None,
            Some(json!({"content": "hi", "emotion": "sad", "category": "Work"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app.request("GET", "/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A forged token is as good as none
    let (status, _, _) = app
        .request("GET", "/notifications", Some("authToken=for.ged.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_content_is_rejected_before_any_write() {
    let app = TestApp::new();
    let cookie = app.register("a@x.com", "secret1").await;

    let (status, body, _) = app
        .request(
            "POST",
            "/posts",
            Some(&cookie),
            Some(json!({"content": "   ", "emotion": "sad", "category": "Work"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION");

    let (_, body, _) = app.request("GET", "/posts", None, None).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}
