// crates/conversion-relay-upstream/tests/partnerstack_client.rs
// ============================================================================
// Module: PartnerStack Client Tests
// Description: Tests for the reqwest-backed conversion client.
// Purpose: Validate the outbound request shape and reply passthrough.
// Dependencies: conversion-relay-upstream, conversion-relay-core, tiny_http
// ============================================================================

//! ## Overview
//! Tests the PartnerStack client against a local `tiny_http` stub for:
//! - Request shape: method, bearer header, content type, JSON body
//! - Reply passthrough: success and failure statuses with raw body text
//! - Transport failures: unreachable upstream

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use conversion_relay_core::BearerToken;
use conversion_relay_core::ClientError;
use conversion_relay_core::ConversionClient;
use conversion_relay_core::ConversionPayloadBuilder;
use conversion_relay_core::OptionalField;
use conversion_relay_upstream::PartnerStackClient;
use conversion_relay_upstream::PartnerStackClientConfig;
use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Request captured by the stub upstream.
#[derive(Debug)]
struct CapturedRequest {
    /// HTTP method.
    method: String,
    /// Request path.
    path: String,
    /// `Authorization` header value.
    authorization: Option<String>,
    /// `Content-Type` header value.
    content_type: Option<String>,
    /// Raw request body.
    body: String,
}

/// Spawns a one-shot stub upstream replying with the given status and body.
fn spawn_upstream(
    status: u16,
    body: &'static str,
) -> (String, mpsc::Receiver<CapturedRequest>, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/conversion/xid");
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv(name))
                    .map(|header| header.value.as_str().to_string())
            };
            let authorization = header("Authorization");
            let content_type = header("Content-Type");
            let method = request.method().as_str().to_string();
            let path = request.url().to_string();
            let mut text = String::new();
            request.as_reader().read_to_string(&mut text).unwrap();
            tx.send(CapturedRequest {
                method,
                path,
                authorization,
                content_type,
                body: text,
            })
            .unwrap();
            let response = Response::from_string(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });

    (url, rx, handle)
}

/// Builds a client for the given endpoint URL.
fn client_for(url: &str) -> PartnerStackClient {
    PartnerStackClient::new(PartnerStackClientConfig {
        url: Url::parse(url).unwrap(),
        user_agent: "conversion-relay-test".to_string(),
    })
    .unwrap()
}

/// Returns an upstream URL that nothing listens on.
fn unused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/conversion/xid")
}

// ============================================================================
// SECTION: Request Shape
// ============================================================================

/// Tests that the outbound request carries the bearer token and JSON body.
#[tokio::test]
async fn submit_posts_json_with_bearer_token() {
    let (url, rx, handle) = spawn_upstream(201, r#"{"id":"abc"}"#);
    let client = client_for(&url);
    let payload = ConversionPayloadBuilder::new(json!("cust-1"), json!("xid-1"))
        .optional(OptionalField::Email, Some(&json!("a@example.com")))
        .sub_ids(Some(&json!(["s1"])))
        .build();
    let token = BearerToken::new("ps-secret").unwrap();

    let reply = client.submit(&token, &payload).await.unwrap();
    assert_eq!(reply.status, 201);
    assert_eq!(reply.body, r#"{"id":"abc"}"#);

    let captured = rx.recv().unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/conversion/xid");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer ps-secret"));
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(
        body,
        json!({"customer_key": "cust-1", "xid": "xid-1", "email": "a@example.com", "sub_ids": ["s1"]})
    );
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Reply Passthrough
// ============================================================================

/// Tests that failure statuses are returned as replies, not errors.
#[tokio::test]
async fn failure_status_is_returned_as_reply() {
    let (url, _rx, handle) = spawn_upstream(422, r#"{"error":"bad xid"}"#);
    let client = client_for(&url);
    let payload = ConversionPayloadBuilder::new(json!("c"), json!("x")).build();
    let token = BearerToken::new("t").unwrap();

    let reply = client.submit(&token, &payload).await.unwrap();
    assert_eq!(reply.status, 422);
    assert!(!reply.is_success());
    assert_eq!(reply.body, r#"{"error":"bad xid"}"#);
    handle.join().unwrap();
}

/// Tests that a plain-text body is passed through unchanged.
#[tokio::test]
async fn text_body_is_passed_through() {
    let (url, _rx, handle) = spawn_upstream(200, "OK");
    let client = client_for(&url);
    let payload = ConversionPayloadBuilder::new(json!("c"), json!("x")).build();
    let token = BearerToken::new("t").unwrap();

    let reply = client.submit(&token, &payload).await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, "OK");
    handle.join().unwrap();
}

// ============================================================================
// SECTION: Request Failures
// ============================================================================

/// Tests that an unreachable upstream surfaces as a transport error.
#[tokio::test]
async fn unreachable_upstream_is_transport_error() {
    let client = client_for(&unused_url());
    let payload = ConversionPayloadBuilder::new(json!("c"), json!("x")).build();
    let token = BearerToken::new("t").unwrap();

    let err = client.submit(&token, &payload).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(!err.to_string().is_empty());
}

/// Tests that a token with control characters never reaches the network.
#[tokio::test]
async fn control_characters_in_token_are_invalid_credential() {
    let client = client_for(&unused_url());
    let payload = ConversionPayloadBuilder::new(json!("c"), json!("x")).build();
    let token = BearerToken::new("bad\ntoken").unwrap();

    let err = client.submit(&token, &payload).await.unwrap_err();
    assert_eq!(err, ClientError::InvalidCredential);
    assert_eq!(err.to_string(), "invalid bearer credential");
}
