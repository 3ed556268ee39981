// crates/conversion-relay-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for conversion-relay-core tests.
// Purpose: Provide a recording stub collaborator and relay builders.
// Dependencies: conversion-relay-core, serde_json
// ============================================================================

//! ## Overview
//! Provides a [`RecordingClient`] that returns a scripted reply and records
//! every submission, so tests can assert exact invocation counts.

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

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use conversion_relay_core::BearerToken;
use conversion_relay_core::ClientError;
use conversion_relay_core::ConversionClient;
use conversion_relay_core::ConversionPayload;
use conversion_relay_core::ConversionRelay;
use conversion_relay_core::RelayCredentials;
use conversion_relay_core::UpstreamReply;
use serde_json::Value;

// ============================================================================
// SECTION: Recording Client
// ============================================================================

/// Submission captured by [`RecordingClient`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Token passed to the client.
    pub token: String,
    /// Serialized payload passed to the client.
    pub payload: Value,
}

/// Stub collaborator returning a scripted result.
pub struct RecordingClient {
    /// Result returned for every call.
    result: Result<UpstreamReply, ClientError>,
    /// Captured submissions.
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingClient {
    /// Creates a client that replies with the given status and body.
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(UpstreamReply::new(status, body)),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Creates a client that fails every call.
    pub fn failing(error: ClientError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Returns captured submissions.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Returns the number of submissions.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl ConversionClient for RecordingClient {
    async fn submit(
        &self,
        token: &BearerToken,
        payload: &ConversionPayload,
    ) -> Result<UpstreamReply, ClientError> {
        let payload = serde_json::to_value(payload).expect("payload serializes");
        self.calls.lock().expect("calls lock").push(RecordedCall {
            token: token.expose().to_string(),
            payload,
        });
        self.result.clone()
    }
}

// ============================================================================
// SECTION: Relay Builders
// ============================================================================

/// Test token used by [`relay_with`].
pub const TEST_TOKEN: &str = "ps-test-token";

/// Builds a relay over the client with [`TEST_TOKEN`] configured.
pub fn relay_with(client: &Arc<RecordingClient>) -> ConversionRelay {
    ConversionRelay::new(client.clone(), RelayCredentials::bearer(TEST_TOKEN))
}

/// Builds a relay over the client with no token configured.
pub fn relay_without_token(client: &Arc<RecordingClient>) -> ConversionRelay {
    ConversionRelay::new(client.clone(), RelayCredentials::missing())
}
