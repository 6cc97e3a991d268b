// ABOUTME: HTTP tests for generation endpoints and the backend callback webhook
// ABOUTME: Session checks, status codes, response shapes and the shared-secret gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{session_token, StubBackend, TestApp, TEST_BACKEND_SECRET};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

const GENERATIONS: &str = "/api/generations";
const CALLBACK: &str = "/api/webhook/generation-callback";

async fn create_generation(app: &TestApp, token: &str) -> Value {
    let response = AxumTestRequest::post(GENERATIONS)
        .bearer(token)
        .json(&json!({ "prompt": "Create a 3-step onboarding flow" }))
        .send(app.router())
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_create_returns_pending_generation() {
    let app = TestApp::new().await;
    app.seed_user("user_http", 5).await;
    let token = session_token("user_http", Some("user_http@example.com"));

    let body = create_generation(&app, &token).await;

    assert_eq!(body["status"], "pending");
    assert_eq!(body["prompt"], "Create a 3-step onboarding flow");
    assert_eq!(body["webhookCallId"], "wc_0");
    assert!(body["jsonResult"].is_null());
    assert_eq!(app.user("user_http").await.credit_balance, 4);
}

#[tokio::test]
async fn test_create_requires_a_session() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::post(GENERATIONS)
        .json(&json!({ "prompt": "anything" }))
        .send(app.router())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_create_with_no_credits_is_bad_request() {
    let app = TestApp::new().await;
    app.seed_user("user_empty", 0).await;
    let token = session_token("user_empty", None);

    let response = AxumTestRequest::post(GENERATIONS)
        .bearer(&token)
        .json(&json!({ "prompt": "Create a flow" }))
        .send(app.router())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INSUFFICIENT_CREDITS");
    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_create_dispatch_failure_is_retryable_bad_gateway() {
    let app = TestApp::with_backend(StubBackend::failing()).await;
    app.seed_user("user_down", 5).await;
    let token = session_token("user_down", None);

    let response = AxumTestRequest::post(GENERATIONS)
        .bearer(&token)
        .json(&json!({ "prompt": "Create a flow" }))
        .send(app.router())
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_ERROR");
    assert_eq!(body["error"]["retryable"], true);
    assert_eq!(app.user("user_down").await.credit_balance, 5);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = TestApp::new().await;
    app.seed_user("user_malformed", 5).await;
    let token = session_token("user_malformed", None);

    let response = AxumTestRequest::post(GENERATIONS)
        .bearer(&token)
        .header("content-type", "application/json")
        .raw_body("{not json")
        .send(app.router())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_status_and_list_are_owner_only() {
    let app = TestApp::new().await;
    app.seed_user("user_a", 5).await;
    app.seed_user("user_b", 5).await;
    let token_a = session_token("user_a", None);
    let token_b = session_token("user_b", None);

    let created = create_generation(&app, &token_a).await;
    let id = created["id"].as_str().unwrap().to_owned();
    let path = format!("{GENERATIONS}/{id}");

    let own = AxumTestRequest::get(&path)
        .bearer(&token_a)
        .send(app.router())
        .await;
    own.assert_status(StatusCode::OK);
    assert_eq!(own.json::<Value>()["id"], id.as_str());

    let foreign = AxumTestRequest::get(&path)
        .bearer(&token_b)
        .send(app.router())
        .await;
    foreign.assert_status(StatusCode::NOT_FOUND);

    let list_a = AxumTestRequest::get(GENERATIONS)
        .bearer(&token_a)
        .send(app.router())
        .await;
    list_a.assert_status(StatusCode::OK);
    let body: Value = list_a.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["generations"][0]["id"], id.as_str());

    let list_b: Value = AxumTestRequest::get(GENERATIONS)
        .bearer(&token_b)
        .send(app.router())
        .await
        .json();
    assert_eq!(list_b["count"], 0);
}

#[tokio::test]
async fn test_status_with_malformed_id_is_not_found() {
    let app = TestApp::new().await;
    app.seed_user("user_ids", 5).await;
    let token = session_token("user_ids", None);

    let response = AxumTestRequest::get(&format!("{GENERATIONS}/not-a-uuid"))
        .bearer(&token)
        .send(app.router())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_accepts_paging_query() {
    let app = TestApp::new().await;
    app.seed_user("user_pages", 5).await;
    let token = session_token("user_pages", None);
    for _ in 0..3 {
        create_generation(&app, &token).await;
    }

    let body: Value = AxumTestRequest::get(&format!("{GENERATIONS}?limit=2&offset=0"))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(body["count"], 2);

    let body: Value = AxumTestRequest::get(&format!("{GENERATIONS}?limit=2&offset=2"))
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_list_rejects_malformed_paging_with_envelope() {
    let app = TestApp::new().await;
    app.seed_user("user_bad_page", 5).await;
    let token = session_token("user_bad_page", None);

    let response = AxumTestRequest::get(&format!("{GENERATIONS}?limit=abc"))
        .bearer(&token)
        .send(app.router())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_callback_completes_generation() {
    let app = TestApp::new().await;
    app.seed_user("user_cb", 5).await;
    let token = session_token("user_cb", None);
    let created = create_generation(&app, &token).await;

    let response = AxumTestRequest::post(CALLBACK)
        .header("x-webhook-secret", TEST_BACKEND_SECRET)
        .json(&json!({
            "webhookCallId": "wc_0",
            "jsonResult": { "nodes": [{ "name": "Start" }] }
        }))
        .send(app.router())
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["generationId"], created["id"]);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["replayed"], false);

    let status: Value = AxumTestRequest::get(&format!(
        "{GENERATIONS}/{}",
        created["id"].as_str().unwrap()
    ))
    .bearer(&token)
    .send(app.router())
    .await
    .json();
    assert_eq!(status["status"], "completed");
    let result: Value = serde_json::from_str(status["jsonResult"].as_str().unwrap()).unwrap();
    assert_eq!(result["nodes"][0]["name"], "Start");

    let sent = app.emails.wait_for(1).await;
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn test_callback_replay_reports_replayed() {
    let app = TestApp::new().await;
    app.seed_user("user_replay_http", 5).await;
    let token = session_token("user_replay_http", None);
    create_generation(&app, &token).await;

    for expected in [false, true] {
        let body: Value = AxumTestRequest::post(CALLBACK)
            .header("x-webhook-secret", TEST_BACKEND_SECRET)
            .json(&json!({ "webhookCallId": "wc_0", "status": "failed" }))
            .send(app.router())
            .await
            .json();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["replayed"], expected);
    }
}

#[tokio::test]
async fn test_callback_secret_gate() {
    let app = TestApp::new().await;
    app.seed_user("user_gate", 5).await;
    let token = session_token("user_gate", None);
    let created = create_generation(&app, &token).await;
    let payload = json!({ "webhookCallId": "wc_0", "jsonResult": {} });

    let missing = AxumTestRequest::post(CALLBACK)
        .json(&payload)
        .send(app.router())
        .await;
    missing.assert_status(StatusCode::UNAUTHORIZED);

    let wrong = AxumTestRequest::post(CALLBACK)
        .header("x-webhook-secret", "not-the-secret")
        .json(&payload)
        .send(app.router())
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);

    let still_pending: Value = AxumTestRequest::get(&format!(
        "{GENERATIONS}/{}",
        created["id"].as_str().unwrap()
    ))
    .bearer(&token)
    .send(app.router())
    .await
    .json();
    assert_eq!(still_pending["status"], "pending");
}

#[tokio::test]
async fn test_callback_input_errors() {
    let app = TestApp::new().await;

    let missing_id = AxumTestRequest::post(CALLBACK)
        .header("x-webhook-secret", TEST_BACKEND_SECRET)
        .json(&json!({ "jsonResult": {} }))
        .send(app.router())
        .await;
    missing_id.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        missing_id.json::<Value>()["error"]["code"],
        "MISSING_REQUIRED_FIELD"
    );

    let unknown = AxumTestRequest::post(CALLBACK)
        .header("x-webhook-secret", TEST_BACKEND_SECRET)
        .json(&json!({ "webhookCallId": "wc_unknown" }))
        .send(app.router())
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_conflict_is_409() {
    let app = TestApp::new().await;
    app.seed_user("user_409", 5).await;
    let token = session_token("user_409", None);
    create_generation(&app, &token).await;

    let send = |status: &'static str| {
        AxumTestRequest::post(CALLBACK)
            .header("x-webhook-secret", TEST_BACKEND_SECRET)
            .json(&json!({ "webhookCallId": "wc_0", "status": status }))
    };

    send("completed").send(app.router()).await.assert_status(StatusCode::OK);
    let conflict = send("failed").send(app.router()).await;
    conflict.assert_status(StatusCode::CONFLICT);
    let body: Value = conflict.json();
    assert_eq!(body["error"]["code"], "STATE_CONFLICT");
    assert_eq!(body["error"]["details"]["currentStatus"], "completed");
}
