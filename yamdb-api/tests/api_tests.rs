//! Integration tests for yamdb-api endpoints
//!
//! Each test runs the full router against a throwaway SQLite database with a
//! mailer that records confirmation codes instead of sending them.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use yamdb_api::{build_router, AppState};
use yamdb_common::api::TokenIssuer;
use yamdb_common::db::init::init_database;
use yamdb_common::db::settings::RuntimeSettings;
use yamdb_common::db::users::{self, NewUser};
use yamdb_common::db::{AuthState, Role, User};
use yamdb_common::mail::{ConfirmationMail, Mailer};
use yamdb_common::{Locale, MessageKey, Messages};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<ConfirmationMail>>,
}

impl RecordingMailer {
    fn last_code(&self) -> i64 {
        self.sent.lock().unwrap().last().expect("no mail sent").code
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &ConfirmationMail) -> yamdb_common::Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

struct TestApp {
    _dir: TempDir,
    pool: SqlitePool,
    router: Router,
    mailer: Arc<RecordingMailer>,
    tokens: TokenIssuer,
    messages: Messages,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("yamdb.db")).await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let tokens = TokenIssuer::new("test-secret", 3600);

        let state = AppState::new(
            pool.clone(),
            Messages::new(Locale::En),
            tokens.clone(),
            mailer.clone(),
            RuntimeSettings::default(),
        );

        Self {
            _dir: dir,
            pool,
            router: build_router(state),
            mailer,
            tokens,
            messages: Messages::new(Locale::En),
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, json)
    }

    /// Insert a user directly and mint a token for it
    async fn user_with_token(&self, username: &str, role: Role) -> (User, String) {
        let new = NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
            ..NewUser::default()
        };
        let user = users::insert(&self.pool, &new, AuthState::Consumed, None).await.unwrap();
        let token = self.tokens.issue(&user).unwrap();
        (user, token)
    }

    async fn create_title(&self, admin_token: &str, name: &str) -> i64 {
        let (status, body) = self
            .request(
                "POST",
                "/v1/titles/",
                Some(admin_token),
                Some(json!({"name": name, "year": 2000})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    fn message(&self, key: MessageKey) -> String {
        self.messages.get(key).to_string()
    }
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "yamdb-api");
    assert!(body["version"].is_string());
    assert_eq!(body["git_hash"], env!("GIT_HASH"));
    assert_eq!(body["build_timestamp"], env!("BUILD_TIMESTAMP"));
}

// =============================================================================
// Signup and token
// =============================================================================

#[tokio::test]
async fn test_signup_token_and_profile_flow() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/v1/auth/signup/",
            None,
            Some(json!({"username": "alice", "email": "alice@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "alice", "email": "alice@example.com"}));

    let code = app.mailer.last_code();
    let (status, body) = app
        .request(
            "POST",
            "/v1/auth/token/",
            None,
            Some(json!({"username": "alice", "confirmation_code": code})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.request("GET", "/v1/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");

    // Replaying the consumed code
    let (status, body) = app
        .request(
            "POST",
            "/v1/auth/token/",
            None,
            Some(json!({"username": "alice", "confirmation_code": code.to_string()})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], app.message(MessageKey::CodeAlreadyUsed));
}

#[tokio::test]
async fn test_signup_me_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/v1/auth/signup/",
            None,
            Some(json!({"username": "me", "email": "broken"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["message"], app.message(MessageKey::ReservedUsername));
}

#[tokio::test]
async fn test_token_wrong_code_and_unknown_user() {
    let app = TestApp::new().await;
    app.request(
        "POST",
        "/v1/auth/signup/",
        None,
        Some(json!({"username": "alice", "email": "alice@example.com"})),
    )
    .await;

    let (status, body) = app
        .request(
            "POST",
            "/v1/auth/token/",
            None,
            Some(json!({"username": "alice", "confirmation_code": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], app.message(MessageKey::WrongCode));

    let (status, _) = app
        .request(
            "POST",
            "/v1/auth/token/",
            None,
            Some(json!({"username": "alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/v1/auth/token/",
            None,
            Some(json!({"username": "ghost", "confirmation_code": 123456})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized_everywhere() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/v1/titles/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], app.message(MessageKey::InvalidToken));

    let (status, _) = app.request("GET", "/v1/titles/", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let other_issuer = TokenIssuer::new("another-secret", 3600);
    let (user, _) = app.user_with_token("alice", Role::User).await;
    let forged = other_issuer.issue(&user).unwrap();
    let (status, _) = app.request("GET", "/v1/users/me/", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_patch_me_keeps_role() {
    let app = TestApp::new().await;
    let (_, token) = app.user_with_token("alice", Role::User).await;

    let (status, body) = app
        .request(
            "PATCH",
            "/v1/users/me/",
            Some(&token),
            Some(json!({"role": "admin", "bio": "Film buff"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["bio"], "Film buff");

    let stored = users::find_by_username(&app.pool, "alice").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::User);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/v1/users/me/", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "not_authenticated");
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = TestApp::new().await;
    let (_, user_token) = app.user_with_token("alice", Role::User).await;
    let (_, moderator_token) = app.user_with_token("mod", Role::Moderator).await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;

    let (status, _) = app.request("GET", "/v1/users/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request("GET", "/v1/users/", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request("GET", "/v1/users/", Some(&moderator_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("GET", "/v1/users/?search=ali", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "alice");

    let (status, body) = app
        .request(
            "POST",
            "/v1/users/",
            Some(&admin_token),
            Some(json!({"username": "bob", "email": "bob@example.com", "role": "moderator"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "moderator");

    let (status, body) = app
        .request(
            "POST",
            "/v1/users/",
            Some(&admin_token),
            Some(json!({"username": "carol", "email": "carol@example.com", "role": "root"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid role: root.");

    let (status, body) = app
        .request(
            "PATCH",
            "/v1/users/bob/",
            Some(&admin_token),
            Some(json!({"role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = app.request("DELETE", "/v1/users/bob/", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request("GET", "/v1/users/bob/", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_superuser_without_admin_role_manages_users() {
    let app = TestApp::new().await;
    let new = NewUser {
        username: "root".to_string(),
        email: "root@example.com".to_string(),
        is_superuser: true,
        ..NewUser::default()
    };
    let root = users::insert(&app.pool, &new, AuthState::Consumed, None).await.unwrap();
    let token = app.tokens.issue(&root).unwrap();

    let (status, _) = app.request("GET", "/v1/users/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Catalog and titles
// =============================================================================

#[tokio::test]
async fn test_catalog_write_permissions() {
    let app = TestApp::new().await;
    let (_, user_token) = app.user_with_token("alice", Role::User).await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let genre = json!({"name": "Drama", "slug": "drama"});

    let (status, _) = app.request("POST", "/v1/genres/", None, Some(genre.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .request("POST", "/v1/genres/", Some(&user_token), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("POST", "/v1/genres/", Some(&admin_token), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, genre);

    let (status, body) = app
        .request("POST", "/v1/genres/", Some(&admin_token), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], app.message(MessageKey::SlugTaken));

    let (status, body) = app.request("GET", "/v1/genres/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([{"name": "Drama", "slug": "drama"}]));

    let (status, _) = app
        .request("DELETE", "/v1/genres/drama/", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .request("DELETE", "/v1/genres/drama/", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_title_year_in_future_rejected() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;

    let (status, body) = app
        .request(
            "POST",
            "/v1/titles/",
            Some(&admin_token),
            Some(json!({"name": "Future", "year": 2999})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], app.message(MessageKey::YearInFuture));
}

#[tokio::test]
async fn test_title_with_relations() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;

    app.request(
        "POST",
        "/v1/genres/",
        Some(&admin_token),
        Some(json!({"name": "Drama", "slug": "drama"})),
    )
    .await;
    app.request(
        "POST",
        "/v1/categories/",
        Some(&admin_token),
        Some(json!({"name": "Movie", "slug": "movie"})),
    )
    .await;

    let (status, body) = app
        .request(
            "POST",
            "/v1/titles/",
            Some(&admin_token),
            Some(json!({"name": "Heat", "year": 1995, "genre": ["drama"], "category": "movie"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["genre"], json!([{"name": "Drama", "slug": "drama"}]));
    assert_eq!(body["category"], json!({"name": "Movie", "slug": "movie"}));
    assert_eq!(body["rating"], Value::Null);
    let heat_id = body["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "POST",
            "/v1/titles/",
            Some(&admin_token),
            Some(json!({"name": "Ronin", "year": 1998, "genre": ["thriller"]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Genre thriller does not exist.");

    let (status, body) = app.request("GET", "/v1/titles/?genre=drama", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = app.request("GET", "/v1/titles/?year=1990", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    // Omitted fields are kept, an explicit null clears the category
    let uri = format!("/v1/titles/{}/", heat_id);
    let (status, body) = app
        .request("PATCH", &uri, Some(&admin_token), Some(json!({"description": "LA crime"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["slug"], "movie");

    let (status, body) = app
        .request("PATCH", &uri, Some(&admin_token), Some(json!({"category": null})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["description"], "LA crime");
    assert_eq!(body["genre"], json!([{"name": "Drama", "slug": "drama"}]));
}

#[tokio::test]
async fn test_title_list_pagination_links() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    for name in ["A", "B", "C"] {
        app.create_title(&admin_token, name).await;
    }

    let (status, body) = app.request("GET", "/v1/titles/?limit=2", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], "/v1/titles/?limit=2&offset=2");
    assert_eq!(body["previous"], Value::Null);
}

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/v1/titles/?year=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = app.request("GET", "/v1/genres/?limit=x", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_huge_offset_returns_empty_page() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request("GET", &format!("/v1/titles/?offset={}", i64::MAX), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["next"], Value::Null);
}

// =============================================================================
// Reviews, rating and comments
// =============================================================================

#[tokio::test]
async fn test_duplicate_review_is_conflict() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let (_, token) = app.user_with_token("alice", Role::User).await;
    let title_id = app.create_title(&admin_token, "Heat").await;
    let uri = format!("/v1/titles/{}/reviews/", title_id);

    let (status, body) = app
        .request("POST", &uri, Some(&token), Some(json!({"text": "Great", "score": 9})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "alice");
    assert_eq!(body["title"], title_id);

    let (status, body) = app
        .request("POST", &uri, Some(&token), Some(json!({"text": "Again", "score": 3})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(body["error"]["message"], app.message(MessageKey::DuplicateReview));
}

#[tokio::test]
async fn test_rating_is_truncated_mean() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let title_id = app.create_title(&admin_token, "Heat").await;
    let uri = format!("/v1/titles/{}/reviews/", title_id);

    for (name, score) in [("a", 7), ("b", 8), ("c", 8)] {
        let (_, token) = app.user_with_token(name, Role::User).await;
        let (status, _) = app
            .request("POST", &uri, Some(&token), Some(json!({"text": "ok", "score": score})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.request("GET", &format!("/v1/titles/{}/", title_id), None, None).await;
    assert_eq!(body["rating"], 7);
}

#[tokio::test]
async fn test_review_score_and_anonymous_create() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let (_, token) = app.user_with_token("alice", Role::User).await;
    let title_id = app.create_title(&admin_token, "Heat").await;
    let uri = format!("/v1/titles/{}/reviews/", title_id);

    let (status, _) = app
        .request("POST", &uri, None, Some(json!({"text": "x", "score": 5})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .request("POST", &uri, Some(&token), Some(json!({"text": "x", "score": 11})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], app.message(MessageKey::ScoreOutOfRange));

    let (status, _) = app
        .request("POST", "/v1/titles/999/reviews/", Some(&token), Some(json!({"text": "x", "score": 5})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_edit_permissions() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let (_, author_token) = app.user_with_token("alice", Role::User).await;
    let (_, other_token) = app.user_with_token("bob", Role::User).await;
    let (_, moderator_token) = app.user_with_token("mod", Role::Moderator).await;
    let title_id = app.create_title(&admin_token, "Heat").await;

    let (_, review) = app
        .request(
            "POST",
            &format!("/v1/titles/{}/reviews/", title_id),
            Some(&author_token),
            Some(json!({"text": "Great", "score": 9})),
        )
        .await;
    let uri = format!("/v1/titles/{}/reviews/{}/", title_id, review["id"]);

    let (status, _) = app
        .request("PATCH", &uri, Some(&other_token), Some(json!({"score": 1})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request("PATCH", &uri, Some(&author_token), Some(json!({"score": 8})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 8);
    assert_eq!(body["text"], "Great");

    let (status, _) = app
        .request("PATCH", &uri, Some(&moderator_token), Some(json!({"text": "Edited"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("DELETE", &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request("DELETE", &uri, Some(&author_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_scoped_to_title_review() {
    let app = TestApp::new().await;
    let (_, admin_token) = app.user_with_token("boss", Role::Admin).await;
    let (_, token) = app.user_with_token("alice", Role::User).await;
    let heat = app.create_title(&admin_token, "Heat").await;
    let ronin = app.create_title(&admin_token, "Ronin").await;

    let (_, review) = app
        .request(
            "POST",
            &format!("/v1/titles/{}/reviews/", heat),
            Some(&token),
            Some(json!({"text": "Great", "score": 9})),
        )
        .await;
    let review_id = review["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "POST",
            &format!("/v1/titles/{}/reviews/{}/comments/", heat, review_id),
            Some(&token),
            Some(json!({"text": "Agreed"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "alice");
    assert_eq!(body["review"], review_id);

    let (status, body) = app
        .request(
            "GET",
            &format!("/v1/titles/{}/reviews/{}/comments/", ronin, review_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], app.message(MessageKey::ReviewNotFound));

    let (status, body) = app
        .request(
            "GET",
            &format!("/v1/titles/{}/reviews/{}/comments/", heat, review_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}
