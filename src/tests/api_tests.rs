use super::{ALICE, BOB, create_test_service};
use crate::api::handlers::{AppState, api_routes};
use crate::auth::jwt::JwtService;
use crate::core::session::Language;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    jwt: Arc<JwtService>,
}

impl TestApp {
    fn new() -> Self {
        let jwt = Arc::new(JwtService::new("test-secret".to_string()));
        let state = AppState {
            service: Arc::new(create_test_service()),
            jwt: Arc::clone(&jwt),
            default_language: Language::Es,
        };
        TestApp {
            router: api_routes(state),
            jwt,
        }
    }

    fn token(&self, actor: &str) -> String {
        self.jwt.generate_token(actor, None).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(&self, method: &str, uri: &str, actor: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(actor)));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn create_group(&self, actor: &str, name: &str) -> Value {
        let (status, body) = self
            .call("POST", "/groups", actor, Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

#[tokio::test]
async fn test_missing_or_bad_token() {
    let app = TestApp::new();

    let request = Request::builder().uri("/groups").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/groups")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_groups() {
    let app = TestApp::new();
    let group = app.create_group(ALICE, "Family 2026").await;
    assert_eq!(group["name"], "Family 2026");
    assert_eq!(group["max_budget"], 15.0);
    assert_eq!(group["admin_user_id"], ALICE);

    let (status, feed) = app.call("GET", "/groups", ALICE, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["loading"], false);
    assert!(feed["error"].is_null());
    let groups = feed["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["id"], group["id"]);
    assert_eq!(groups[0]["access_kind"], "admin");

    let (_, feed) = app.call("GET", "/groups", BOB, None).await;
    assert!(feed["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_join_flow() {
    let app = TestApp::new();
    let group = app.create_group(ALICE, "Family 2026").await;
    let code = group["invite_code"].as_str().unwrap().to_lowercase();

    let (status, _) = app
        .call(
            "POST",
            "/groups/join",
            BOB,
            Some(json!({ "code": "bad", "name": "Bob", "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, joined) = app
        .call(
            "POST",
            "/groups/join",
            BOB,
            Some(json!({ "code": code, "name": "Bob", "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["group"]["id"], group["id"]);
    assert_eq!(joined["participant"]["user_id"], BOB);

    let (status, _) = app
        .call(
            "POST",
            "/groups/join",
            BOB,
            Some(json!({ "code": code, "name": "Bob", "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, feed) = app.call("GET", "/groups", BOB, None).await;
    assert_eq!(feed["groups"][0]["access_kind"], "member");
}

#[tokio::test]
async fn test_permissions_map_to_status_codes() {
    let app = TestApp::new();
    let group = app.create_group(ALICE, "Family 2026").await;
    let uri = format!("/groups/{}", group["id"].as_str().unwrap());

    let (status, _) = app.call("GET", &uri, BOB, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("DELETE", &uri, BOB, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("GET", "/groups/missing", ALICE, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call("DELETE", &uri, ALICE, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (status, _) = app.call("GET", &uri, ALICE, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gift_endpoints() {
    let app = TestApp::new();
    let group = app.create_group(ALICE, "Family 2026").await;
    let group_id = group["id"].as_str().unwrap();

    let (status, participant) = app
        .call(
            "POST",
            &format!("/groups/{}/participants", group_id),
            ALICE,
            Some(json!({ "name": "Bob", "email": "bob@example.com", "user_id": BOB })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let gifts_uri = format!(
        "/groups/{}/participants/{}/gifts",
        group_id,
        participant["id"].as_str().unwrap()
    );

    let (status, body) = app
        .call("POST", &gifts_uri, BOB, Some(json!({ "title": "Book", "price": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("greater than 0"));

    let (status, gift) = app
        .call("POST", &gifts_uri, BOB, Some(json!({ "title": "Book", "price": 12.5 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let gift_uri = format!("{}/{}", gifts_uri, gift["id"].as_str().unwrap());
    let (status, updated) = app
        .call("PATCH", &gift_uri, BOB, Some(json!({ "price": 20.0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 20.0);

    let summary_uri = gifts_uri.replace("/gifts", "/summary");
    let (status, summary) = app.call("GET", &summary_uri, ALICE, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["over_budget"], true);

    let (status, _) = app.call("DELETE", &gift_uri, BOB, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, gifts) = app.call("GET", &gifts_uri, BOB, None).await;
    assert!(gifts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_session_language() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token(ALICE)))
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::empty())
        .unwrap();
    let (status, session) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["actor"], ALICE);
    assert_eq!(session["language"], "en");

    let (_, session) = app.call("GET", "/session", ALICE, None).await;
    assert_eq!(session["language"], "es");

    let (status, body) = app
        .call("PUT", "/session/language", ALICE, Some(json!({ "language": "en" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "en");

    // Nothing is kept server-side; the choice travels back in the token.
    let (_, session) = app.call("GET", "/session", ALICE, None).await;
    assert_eq!(session["language"], "es");

    let token = app.jwt.generate_token(ALICE, Some(Language::En)).unwrap();
    let request = Request::builder()
        .uri("/session")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (_, session) = app.send(request).await;
    assert_eq!(session["language"], "en");
}

#[tokio::test]
async fn test_activity_log_endpoint() {
    let app = TestApp::new();
    app.create_group(ALICE, "Family 2026").await;

    let (status, logs) = app.call("GET", "/logs", ALICE, None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "GROUP_CREATED");
}
