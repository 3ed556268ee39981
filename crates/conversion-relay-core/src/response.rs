// crates/conversion-relay-core/src/response.rs
// ============================================================================
// Module: Relay Responses
// Description: Response envelopes returned to the relay caller.
// Purpose: Keep every caller-visible status and body shape in one place.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`RelayResponse`] pairs an HTTP status with one of the [`RelayBody`]
//! envelopes and a [`RelayOutcome`] label used for audit logging.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::upstream::UpstreamBody;
use crate::upstream::UpstreamReply;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error label used when PartnerStack rejects a conversion.
pub const UPSTREAM_ERROR_MESSAGE: &str = "PartnerStack error";
/// Fallback message for faults that carry no message.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected server error";
/// Error message for bodies over the configured limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";

// ============================================================================
// SECTION: Outcome Labels
// ============================================================================

/// Request outcome classification.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayOutcome {
    /// Upstream accepted the conversion.
    Relayed,
    /// Upstream returned a non-2xx status.
    UpstreamRejected,
    /// Request used a method other than POST.
    MethodNotAllowed,
    /// Required fields were missing or falsy.
    InvalidRequest,
    /// The bearer credential is not configured.
    Misconfigured,
    /// Request body exceeded the configured limit.
    PayloadTooLarge,
    /// Unexpected fault while relaying.
    Fault,
}

impl RelayOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relayed => "relayed",
            Self::UpstreamRejected => "upstream_rejected",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidRequest => "invalid_request",
            Self::Misconfigured => "misconfigured",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Fault => "fault",
        }
    }
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Caller-visible JSON envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayBody {
    /// Local failure: `{ "error": <message> }`.
    Error {
        /// Error message.
        error: String,
    },
    /// Upstream rejection: `{ "error": "PartnerStack error", "details": <body> }`.
    UpstreamError {
        /// Fixed error label.
        error: &'static str,
        /// Parsed or raw upstream body.
        details: UpstreamBody,
    },
    /// Upstream success: `{ "ok": true, "partnerstack": <body> }`.
    Success {
        /// Always true.
        ok: bool,
        /// Parsed or raw upstream body.
        partnerstack: UpstreamBody,
    },
}

/// Response returned by [`crate::ConversionRelay::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    /// HTTP status code for the caller.
    pub status: u16,
    /// JSON envelope for the caller.
    pub body: RelayBody,
    /// Outcome label for audit logging.
    pub outcome: RelayOutcome,
    /// Upstream status when an upstream reply was received.
    pub upstream_status: Option<u16>,
}

impl RelayResponse {
    /// Builds a local error response.
    #[must_use]
    pub fn error(status: u16, outcome: RelayOutcome, message: impl Into<String>) -> Self {
        Self {
            status,
            body: RelayBody::Error {
                error: message.into(),
            },
            outcome,
            upstream_status: None,
        }
    }

    /// Builds the 413 response for oversized bodies.
    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::error(413, RelayOutcome::PayloadTooLarge, PAYLOAD_TOO_LARGE_MESSAGE)
    }

    /// Maps an upstream reply onto the caller response.
    ///
    /// Success statuses collapse to 200; failure statuses are propagated as-is.
    #[must_use]
    pub fn from_upstream(reply: &UpstreamReply) -> Self {
        let body = reply.parsed_body();
        if reply.is_success() {
            Self {
                status: 200,
                body: RelayBody::Success {
                    ok: true,
                    partnerstack: body,
                },
                outcome: RelayOutcome::Relayed,
                upstream_status: Some(reply.status),
            }
        } else {
            Self {
                status: reply.status,
                body: RelayBody::UpstreamError {
                    error: UPSTREAM_ERROR_MESSAGE,
                    details: body,
                },
                outcome: RelayOutcome::UpstreamRejected,
                upstream_status: Some(reply.status),
            }
        }
    }

    /// Serializes the body envelope to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn body_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.body)
    }

    /// Returns the body envelope as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.body)
    }
}
