// crates/conversion-relay-server/src/audit.rs
// ============================================================================
// Module: Relay Audit Logging
// Description: Structured audit events for relay request handling.
// Purpose: Emit metadata-only JSON-line logs for every handled request.
// Dependencies: conversion-relay-config, conversion-relay-core, serde
// ============================================================================

//! ## Overview
//! Audit events are serialized as one JSON object per line. They record request
//! metadata only: sizes, statuses and outcome labels. The bearer token and the
//! payload contents are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use conversion_relay_config::AuditConfig;
use conversion_relay_core::RelayOutcome;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Redaction label attached to every request event.
const REDACTION_METADATA_ONLY: &str = "metadata_only";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event for one handled relay request.
#[derive(Debug, Clone, Serialize)]
pub struct RelayAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier from `x-request-id` when provided.
    pub request_id: Option<String>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Inbound HTTP method.
    pub method: String,
    /// Response status returned to the caller.
    pub status: u16,
    /// Request outcome.
    pub outcome: RelayOutcome,
    /// Upstream status when an upstream call completed.
    pub upstream_status: Option<u16>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Redaction classification for payload logging.
    pub redaction: &'static str,
}

/// Inputs for [`RelayAuditEvent::new`].
#[derive(Debug, Clone)]
pub struct RelayAuditEventParams {
    /// Request identifier from `x-request-id` when provided.
    pub request_id: Option<String>,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Inbound HTTP method.
    pub method: String,
    /// Response status returned to the caller.
    pub status: u16,
    /// Request outcome.
    pub outcome: RelayOutcome,
    /// Upstream status when an upstream call completed.
    pub upstream_status: Option<u16>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl RelayAuditEvent {
    /// Creates a new request event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RelayAuditEventParams) -> Self {
        let error_kind = match params.outcome {
            RelayOutcome::Relayed => None,
            outcome => Some(outcome.as_str()),
        };
        Self {
            event: "relay_request",
            timestamp_ms: now_millis(),
            request_id: params.request_id,
            peer_ip: params.peer_ip,
            method: params.method,
            status: params.status,
            outcome: params.outcome,
            upstream_status: params.upstream_status,
            error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            redaction: REDACTION_METADATA_ONLY,
        }
    }
}

/// Audit event emitted once when the server starts listening.
#[derive(Debug, Clone, Serialize)]
pub struct RelayStartedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Bound listener address.
    pub bind: String,
    /// Relay route path.
    pub path: String,
    /// Whether a bearer token is configured.
    pub token_configured: bool,
}

impl RelayStartedEvent {
    /// Creates a new startup event with a consistent timestamp.
    #[must_use]
    pub fn new(bind: String, path: String, token_configured: bool) -> Self {
        Self {
            event: "relay_started",
            timestamp_ms: now_millis(),
            bind,
            path,
            token_configured,
        }
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for relay events.
pub trait RelayAuditSink: Send + Sync {
    /// Records a request event.
    fn record(&self, event: &RelayAuditEvent);

    /// Records a startup event.
    fn record_started(&self, _event: &RelayStartedEvent) {}
}

/// Audit sink that writes JSON lines to stderr.
pub struct RelayStderrAuditSink;

impl RelayAuditSink for RelayStderrAuditSink {
    fn record(&self, event: &RelayAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_started(&self, event: &RelayStartedEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct RelayFileAuditSink {
    /// Append-only audit log handle.
    file: Mutex<std::fs::File>,
}

impl RelayFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized line and flushes.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl RelayAuditSink for RelayFileAuditSink {
    fn record(&self, event: &RelayAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_started(&self, event: &RelayStartedEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// No-op audit sink.
pub struct RelayNoopAuditSink;

impl RelayAuditSink for RelayNoopAuditSink {
    fn record(&self, _event: &RelayAuditEvent) {}
}

/// Builds the audit sink selected by configuration.
///
/// # Errors
///
/// Returns an error when the configured audit file cannot be opened.
pub fn audit_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn RelayAuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(RelayNoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(RelayFileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(RelayStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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
        reason = "Test-only audit assertions."
    )]

    use conversion_relay_config::AuditConfig;
    use conversion_relay_core::RelayOutcome;
    use serde_json::Value;

    use super::RelayAuditEvent;
    use super::RelayAuditEventParams;
    use super::RelayAuditSink;
    use super::RelayFileAuditSink;
    use super::RelayStartedEvent;
    use super::audit_sink_from_config;

    fn params(outcome: RelayOutcome, status: u16) -> RelayAuditEventParams {
        RelayAuditEventParams {
            request_id: Some("req-1".to_string()),
            peer_ip: Some("127.0.0.1".to_string()),
            method: "POST".to_string(),
            status,
            outcome,
            upstream_status: None,
            request_bytes: 10,
            response_bytes: 20,
        }
    }

    #[test]
    fn relayed_event_has_no_error_kind() {
        let event = RelayAuditEvent::new(params(RelayOutcome::Relayed, 200));
        assert_eq!(event.event, "relay_request");
        assert_eq!(event.error_kind, None);
        assert_eq!(event.redaction, "metadata_only");
    }

    #[test]
    fn failed_event_carries_outcome_as_error_kind() {
        let event = RelayAuditEvent::new(params(RelayOutcome::InvalidRequest, 400));
        assert_eq!(event.error_kind, Some("invalid_request"));
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = RelayFileAuditSink::new(&path).unwrap();
        sink.record_started(&RelayStartedEvent::new(
            "127.0.0.1:8080".to_string(),
            "/functions/ps-conversion".to_string(),
            true,
        ));
        sink.record(&RelayAuditEvent::new(params(RelayOutcome::Relayed, 200)));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> =
            content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "relay_started");
        assert_eq!(lines[0]["token_configured"], true);
        assert_eq!(lines[1]["event"], "relay_request");
        assert_eq!(lines[1]["outcome"], "relayed");
        assert_eq!(lines[1]["request_id"], "req-1");
    }

    #[test]
    fn config_selects_file_sink_when_path_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selected.jsonl");
        let config = AuditConfig {
            enabled: true,
            path: Some(path.display().to_string()),
        };
        let sink = audit_sink_from_config(&config).unwrap();
        sink.record(&RelayAuditEvent::new(params(RelayOutcome::Fault, 500)));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"error_kind\":\"fault\""));
    }

    #[test]
    fn disabled_config_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disabled.jsonl");
        let config = AuditConfig {
            enabled: false,
            path: Some(path.display().to_string()),
        };
        let sink = audit_sink_from_config(&config).unwrap();
        sink.record(&RelayAuditEvent::new(params(RelayOutcome::Relayed, 200)));
        assert!(!path.exists());
    }
}
