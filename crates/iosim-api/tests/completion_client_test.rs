#![allow(clippy::unwrap_used)]
// Integration tests for `CompletionClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iosim_api::{
    CompletionClient, CompletionRequest, Error, Message, StopReason, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CompletionClient) {
    let server = MockServer::start().await;
    let endpoint = Url::parse(&format!("{}/v1/messages", server.uri())).unwrap();
    let key: SecretString = "test-key".to_string().into();
    let transport = TransportConfig::default().with_timeout(Duration::from_secs(2));
    let client = CompletionClient::new(endpoint, "test-model", &key, &transport).unwrap();
    (server, client)
}

fn request() -> CompletionRequest {
    CompletionRequest::new(vec![Message::user("show clock")])
        .with_system_prompt("You are a Cisco router")
        .with_max_tokens(128)
}

// ── Success path ────────────────────────────────────────────────────

#[tokio::test]
async fn test_complete_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 128,
            "system": "You are a Cisco router",
            "messages": [{ "role": "user", "content": "show clock" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "text", "text": "{\"valid\": true," },
                { "type": "text", "text": " \"output\": \"*12:00:00 UTC\"}" }
            ],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 40, "output_tokens": 12 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.complete(&request()).await.unwrap();
    assert_eq!(
        resp.content,
        "{\"valid\": true, \"output\": \"*12:00:00 UTC\"}"
    );
    assert_eq!(resp.tokens_used.total(), 52);
    assert_eq!(resp.stop_reason, Some(StopReason::EndTurn));
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.complete(&request()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let result = client.complete(&request()).await;
    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 7 })),
        "expected RateLimited(7), got: {result:?}"
    );
}

#[tokio::test]
async fn test_api_error_envelope_is_decoded() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&server)
        .await;

    let err = client.complete(&request()).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.api_error_kind(), Some("overloaded_error"));
    assert!(err.to_string().contains("Overloaded"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.complete(&request()).await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body == "not json"),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_empty_content_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 1, "output_tokens": 0 }
        })))
        .mount(&server)
        .await;

    let result = client.complete(&request()).await;
    assert!(matches!(result, Err(Error::EmptyCompletion)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({ "content": [] })),
        )
        .mount(&server)
        .await;

    let result = client.complete(&request()).await;
    assert!(
        matches!(result, Err(Error::Timeout { timeout_secs: 2 })),
        "expected Timeout, got: {result:?}"
    );
}
