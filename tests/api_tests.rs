// tests/api_tests.rs

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use skillgauge_backend::config::{ApiConfig, Prompts};
use skillgauge_backend::domain::{Level, Skill};
use skillgauge_backend::generator::fallback_bank;
use skillgauge_backend::routes::build_router;
use skillgauge_backend::state::AppState;

/// Build state against a temp uploads dir. With `api_url = None` the
/// completion client stays disabled and the pipeline runs on its fallbacks.
fn test_state(api_url: Option<String>) -> (tempfile::TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().expect("temp uploads dir");
    let config = ApiConfig {
        api_key: api_url.as_ref().map(|_| "test-key".to_string()),
        api_url: api_url.unwrap_or_else(|| "http://127.0.0.1:9".into()),
        model: "primary".into(),
        alt_models: vec![],
        upload_dir: dir.path().to_string_lossy().into_owned(),
        ..ApiConfig::default()
    };
    let state = AppState::build(config, Prompts::default()).expect("state");
    (dir, Arc::new(state))
}

/// Spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(state: Arc<AppState>) -> String {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_responds_via_oneshot() {
    let (_dir, state) = test_state(None);
    let app = build_router(state);

    let response = app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn catalog_lists_the_full_skill_set() {
    let (_dir, state) = test_state(None);
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/v1/catalog", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["skills"].as_array().unwrap().len(), 12);
    assert_eq!(body["levels"].as_array().unwrap().len(), 3);
    assert_eq!(body["question_kinds"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn offline_flow_serves_exact_fallback_and_scores_the_session() {
    let (_dir, state) = test_state(None);
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    // Start a Communication/Beginner session.
    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "communication", "level": "beginner"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["sessionId"].as_str().unwrap().to_string();

    // With the client dead, the question is the exact Beginner fallback.
    let question: Value = client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": session_id, "kind": "text"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let (expected_q, expected_a) = fallback_bank(Skill::Communication, Level::Beginner);
    assert_eq!(question["content"].as_str().unwrap(), expected_q);
    assert_eq!(question["expected_answer"].as_str().unwrap(), expected_a);

    // Echoing the key points back satisfies the keyword grader.
    let evaluation: Value = client
        .post(format!("{}/api/v1/answer", address))
        .json(&json!({"sessionId": session_id, "answer": expected_a, "answer_kind": "text"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(evaluation["is_correct"], json!(true));
    assert!(!evaluation["explanation"].as_str().unwrap().is_empty());

    let finish: Value = client
        .post(format!("{}/api/v1/finish", address))
        .json(&json!({"sessionId": session_id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finish["score"], json!(100));

    // The finished session shows up in the history.
    let history: Value = client
        .get(format!("{}/api/v1/history", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = history.as_array().unwrap();
    assert!(rows.iter().any(|r| r["id"].as_str() == Some(session_id.as_str())
        && r["score"] == json!(100)));
}

#[tokio::test]
async fn unknown_level_label_defaults_to_intermediate() {
    let (_dir, state) = test_state(None);
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "negotiation", "level": "grandmaster"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["level"], json!("intermediate"));
}

#[tokio::test]
async fn any_answer_gets_a_fully_populated_evaluation() {
    let (_dir, state) = test_state(None);
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "leadership", "level": "advanced"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["sessionId"].as_str().unwrap();

    client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": session_id, "kind": "audio"}))
        .send()
        .await
        .unwrap();

    // Even an empty submission yields a verdict with both fields present.
    let evaluation: Value = client
        .post(format!("{}/api/v1/answer", address))
        .json(&json!({"sessionId": session_id, "answer": "", "answer_kind": "text"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(evaluation["is_correct"].is_boolean());
    assert!(!evaluation["explanation"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn image_question_renders_a_placeholder_reference() {
    let (_dir, state) = test_state(None);
    let media = state.media.clone();
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "teamwork", "level": "intermediate"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["sessionId"].as_str().unwrap();

    let question: Value = client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": session_id, "kind": "image"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let reference = question["media_ref"].as_str().expect("image questions carry media");
    assert!(reference.starts_with("images/"));
    let svg = std::fs::read_to_string(media.resolve(reference)).unwrap();
    assert!(svg.contains("Teamwork Question (Intermediate Level)"));
}

#[tokio::test]
async fn unknown_session_is_404_and_bad_upload_is_400() {
    let (_dir, state) = test_state(None);
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": "missing", "kind": "text"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "creativity", "level": "beginner"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["sessionId"].as_str().unwrap();

    // Submitting before any question was asked is rejected.
    let response = client
        .post(format!("{}/api/v1/answer", address))
        .json(&json!({"sessionId": session_id, "answer": "hello", "answer_kind": "text"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": session_id, "kind": "text"}))
        .send()
        .await
        .unwrap();

    // A media answer with an undecodable payload is rejected.
    let response = client
        .post(format!("{}/api/v1/answer", address))
        .json(&json!({
            "sessionId": session_id,
            "answer_kind": "audio",
            "mediaBase64": "!!! not base64 !!!",
            "mediaExt": "wav"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn remote_generation_flows_through_the_http_surface() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(
            r#"{"text": "{\"question\": \"How do you delegate under pressure?\", \"expected_answer\": \"Prioritization, trust, clear handoffs\"}"}"#,
        )
        .create_async()
        .await;

    let (_dir, state) = test_state(Some(server.url()));
    let address = spawn_app(state).await;
    let client = reqwest::Client::new();

    let session: Value = client
        .post(format!("{}/api/v1/session", address))
        .json(&json!({"skill": "leadership", "level": "intermediate"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["sessionId"].as_str().unwrap();

    let question: Value = client
        .post(format!("{}/api/v1/question", address))
        .json(&json!({"sessionId": session_id, "kind": "text"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        question["content"].as_str().unwrap(),
        "How do you delegate under pressure?"
    );
}
