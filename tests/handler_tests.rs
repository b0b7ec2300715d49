//! Utility endpoints behind the gate

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{empty_request, json_request, TestApp};

#[tokio::test]
async fn welcome_is_gated() {
    let app = TestApp::new();

    let response = app.send(empty_request(Method::GET, "/", None)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Welcome to the keygate API");
    assert_eq!(response.header("x-ratelimit-limit"), Some("10"));
}

#[tokio::test]
async fn echo_returns_content() {
    let app = TestApp::new();

    let response = app.echo(None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"echo": "hi"}));
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn format_and_unformat_numbers() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            Method::POST,
            "/format-number",
            None,
            json!({"value": 1234567.891}),
        ))
        .await;
    assert_eq!(response.body["formatted"], "1,234,567.89");

    let response = app
        .send(json_request(
            Method::POST,
            "/format-number",
            None,
            json!({"value": 1234.4, "decimal_places": 0}),
        ))
        .await;
    assert_eq!(response.body["formatted"], "1,234");

    let response = app
        .send(json_request(
            Method::POST,
            "/unformat-number",
            None,
            json!({"formatted": "1,234,567.89"}),
        ))
        .await;
    assert_eq!(response.body["value"], 1234567.89);

    let response = app
        .send(json_request(
            Method::POST,
            "/unformat-number",
            None,
            json!({"formatted": "twelve"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["param"], "formatted");
}

#[tokio::test]
async fn webhook_extracts_variables() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            Method::POST,
            "/webhook",
            None,
            json!({"order": {"id": 7, "items": ["a", "b"]}}),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["variables"],
        json!({"order.id": 7, "order.items.0": "a", "order.items.1": "b"})
    );
}
