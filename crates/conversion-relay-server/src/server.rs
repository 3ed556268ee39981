// crates/conversion-relay-server/src/server.rs
// ============================================================================
// Module: Relay Server
// Description: axum HTTP server exposing the conversion relay endpoint.
// Purpose: Adapt inbound HTTP requests to ConversionRelay and audit each one.
// Dependencies: axum, conversion-relay-core, conversion-relay-upstream, http-body-util, tokio
// ============================================================================

//! ## Overview
//! The server mounts a single route at `server.path` that accepts every
//! method, so non-POST requests reach the relay and receive its 405 envelope.
//! Non-POST bodies are never read. POST bodies are read up to
//! `server.max_body_bytes`; anything larger is answered with 413 before the
//! relay runs, and any other read failure is a 500 fault. Every response is
//! recorded through the configured [`RelayAuditSink`].
//! Security posture: callers are unauthenticated and bodies are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::any;
use conversion_relay_config::RelayConfig;
use conversion_relay_core::ConversionRelay;
use conversion_relay_core::RelayCredentials;
use conversion_relay_core::RelayOutcome;
use conversion_relay_core::RelayRequest;
use conversion_relay_core::RelayResponse;
use conversion_relay_upstream::PartnerStackClient;
use conversion_relay_upstream::PartnerStackClientConfig;
use http_body_util::LengthLimitError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::RelayAuditEvent;
use crate::audit::RelayAuditEventParams;
use crate::audit::RelayAuditSink;
use crate::audit::RelayStartedEvent;
use crate::audit::audit_sink_from_config;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying a caller-supplied request identifier.
const REQUEST_ID_HEADER: &str = "x-request-id";
/// Maximum request identifier length recorded in audit events.
const MAX_REQUEST_ID_LENGTH: usize = 128;
/// Body sent when a response envelope cannot be serialized.
const SERIALIZATION_FALLBACK: &[u8] = br#"{"error":"Unexpected server error"}"#;

// ============================================================================
// SECTION: Relay Server
// ============================================================================

/// Conversion relay HTTP server.
pub struct RelayServer {
    /// Server configuration.
    config: RelayConfig,
    /// Relay handler shared by request tasks.
    relay: Arc<ConversionRelay>,
    /// Audit sink for request and startup events.
    audit: Arc<dyn RelayAuditSink>,
}

impl RelayServer {
    /// Builds a server from configuration with explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when initialization fails.
    pub fn with_credentials(
        config: RelayConfig,
        credentials: RelayCredentials,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let url = config.upstream.parsed_url().map_err(|err| ServerError::Config(err.to_string()))?;
        let client = PartnerStackClient::new(PartnerStackClientConfig {
            url,
            user_agent: config.upstream.user_agent.clone(),
        })
        .map_err(|err| ServerError::Init(err.to_string()))?;
        let audit = audit_sink_from_config(&config.audit)
            .map_err(|err| ServerError::Init(format!("audit sink: {err}")))?;
        let relay = ConversionRelay::new(Arc::new(client), credentials);
        Ok(Self::with_parts(config, relay, audit))
    }

    /// Assembles a server from prebuilt parts.
    fn with_parts(
        config: RelayConfig,
        relay: ConversionRelay,
        audit: Arc<dyn RelayAuditSink>,
    ) -> Self {
        Self {
            config,
            relay: Arc::new(relay),
            audit,
        }
    }

    /// Builds the axum router for the relay endpoint.
    fn router(&self) -> Router {
        let state = Arc::new(ServerState {
            relay: Arc::clone(&self.relay),
            audit: Arc::clone(&self.audit),
            max_body_bytes: self.config.server.max_body_bytes,
        });
        Router::new().route(&self.config.server.path, any(handle_conversion)).with_state(state)
    }

    /// Binds the configured address and serves until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(format!("listener address: {err}")))?;
        self.audit.record_started(&RelayStartedEvent::new(
            local.to_string(),
            self.config.server.path.clone(),
            self.relay.credentials().is_configured(),
        ));
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

// ============================================================================
// SECTION: HTTP Handling
// ============================================================================

/// Shared server state for the relay handler.
struct ServerState {
    /// Relay handler.
    relay: Arc<ConversionRelay>,
    /// Audit sink.
    audit: Arc<dyn RelayAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Handles one inbound relay request.
async fn handle_conversion(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let (response, request_bytes) = if method == Method::POST {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(bytes) => (state.relay.handle(&RelayRequest::post(bytes.to_vec())).await, bytes.len()),
            Err(err) => (body_read_failure(&err), 0),
        }
    } else {
        (state.relay.handle(&RelayRequest::new(method.as_str(), Vec::new())).await, 0)
    };
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let payload = response.body_bytes().unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_vec());

    state.audit.record(&RelayAuditEvent::new(RelayAuditEventParams {
        request_id: request_id(&headers),
        peer_ip: Some(peer.ip().to_string()),
        method: method.as_str().to_string(),
        status: status.as_u16(),
        outcome: response.outcome,
        upstream_status: response.upstream_status,
        request_bytes,
        response_bytes: payload.len(),
    }));

    (status, [(CONTENT_TYPE, HeaderValue::from_static("application/json"))], payload)
}

/// Maps a body read error to a response: the length limit is 413, anything
/// else is a fault.
fn body_read_failure(err: &axum::Error) -> RelayResponse {
    if is_length_limit(err) {
        RelayResponse::payload_too_large()
    } else {
        RelayResponse::error(500, RelayOutcome::Fault, format!("failed to read request body: {err}"))
    }
}

/// Returns true when the error chain contains a body length limit error.
fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(candidate) = current {
        if candidate.is::<LengthLimitError>() {
            return true;
        }
        current = candidate.source();
    }
    false
}

/// Extracts a bounded request identifier from the request headers.
fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LENGTH)
        .map(str::to_string)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Relay server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
