//! Integration tests for the session API.
//!
//! Runs against the in-memory store and mock provider; each test spawns its
//! own application instance with isolated state.
//! Run with: cargo test -p support-service --test session_api

use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use support_service::config::SupportConfig;
use support_service::startup::Application;

/// Spawn the application on a random port and return its base URL.
async fn spawn_app() -> String {
    std::env::set_var("ENVIRONMENT", "test");
    std::env::set_var("APP__PORT", "0");
    std::env::set_var("SUPPORT_STORE_BACKEND", "memory");
    std::env::set_var("SUPPORT_MOCK_PROVIDER", "true");
    std::env::set_var("GOOGLE_API_KEY", "test-api-key");
    std::env::set_var("SUPPORT_TEXT_MODEL", "gemini-2.0-flash");

    let config = SupportConfig::load().expect("Failed to load config");
    let app = Application::build(config)
        .await
        .expect("Failed to build application");

    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    format!("http://localhost:{}", port)
}

async fn create_session(client: &Client, base: &str, body: serde_json::Value) -> String {
    let response = client
        .post(format!("{}/api/session/new", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to create session");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["sessionId"]
        .as_str()
        .expect("Missing sessionId")
        .to_string()
}

#[tokio::test]
async fn full_turn_appends_user_then_assistant() {
    let base = spawn_app().await;
    let client = Client::new();

    let session_id = create_session(&client, &base, json!({})).await;

    let response = client
        .post(format!("{}/api/session/chat", base))
        .json(&json!({ "sessionId": session_id, "message": "Where is my order?" }))
        .send()
        .await
        .expect("Failed to send turn");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(!body["reply"].as_str().unwrap().is_empty());
    assert_eq!(body["escalation"], false);
    assert_eq!(body["fallback"], false);

    let response = client
        .get(format!("{}/api/session/{}", base, session_id))
        .send()
        .await
        .expect("Failed to fetch session");
    assert!(response.status().is_success());

    let session: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let messages = session["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["text"], "Where is my order?");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn chat_with_unknown_session_is_404() {
    let base = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/session/chat", base))
        .json(&json!({ "sessionId": "no-such-session", "message": "hello" }))
        .send()
        .await
        .expect("Failed to send turn");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn chat_with_empty_message_is_rejected() {
    let base = spawn_app().await;
    let client = Client::new();

    let session_id = create_session(&client, &base, json!({})).await;

    let response = client
        .post(format!("{}/api/session/chat", base))
        .json(&json!({ "sessionId": session_id, "message": "" }))
        .send()
        .await
        .expect("Failed to send turn");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn fetching_unknown_session_is_404() {
    let base = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/session/no-such-session", base))
        .send()
        .await
        .expect("Failed to fetch session");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn ending_a_session_appends_the_terminal_marker() {
    let base = spawn_app().await;
    let client = Client::new();

    let session_id = create_session(&client, &base, json!({})).await;

    client
        .post(format!("{}/api/session/chat", base))
        .json(&json!({ "sessionId": session_id, "message": "hello" }))
        .send()
        .await
        .expect("Failed to send turn");

    let response = client
        .post(format!("{}/api/session/{}/end", base, session_id))
        .send()
        .await
        .expect("Failed to end session");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["ok"], true);

    let session: serde_json::Value = client
        .get(format!("{}/api/session/{}", base, session_id))
        .send()
        .await
        .expect("Failed to fetch session")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(session["ended"], true);
    let messages = session["messages"].as_array().unwrap();
    let last = messages.last().unwrap();
    assert_eq!(last["role"], "system");
}

#[tokio::test]
async fn listing_shows_only_sessions_with_messages() {
    let base = spawn_app().await;
    let client = Client::new();

    // Two sessions for the same owner; only one receives a message.
    let active = create_session(&client, &base, json!({ "userId": "user-77" })).await;
    let _abandoned = create_session(&client, &base, json!({ "userId": "user-77" })).await;

    client
        .post(format!("{}/api/session/chat", base))
        .json(&json!({ "sessionId": active, "message": "hi there" }))
        .send()
        .await
        .expect("Failed to send turn");

    let response = client
        .get(format!("{}/api/session/list/user-77", base))
        .send()
        .await
        .expect("Failed to list sessions");
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], active);
}
