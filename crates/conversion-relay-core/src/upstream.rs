// crates/conversion-relay-core/src/upstream.rs
// ============================================================================
// Module: Upstream Collaborator
// Description: Client seam and reply model for the PartnerStack endpoint.
// Purpose: Decouple relay semantics from the HTTP client implementation.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ConversionClient`] is the single outbound seam of the relay. The relay
//! hands it the bearer token and payload and receives an [`UpstreamReply`]
//! holding the raw status and body text. [`UpstreamBody`] models the
//! parse-or-fallback rule for that text as two variants instead of a failed
//! parse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::payload::ConversionPayload;
use crate::relay::BearerToken;

// ============================================================================
// SECTION: Client Seam
// ============================================================================

/// Outbound conversion client.
#[async_trait]
pub trait ConversionClient: Send + Sync {
    /// Submits a single conversion with the given bearer token.
    ///
    /// Implementations make exactly one attempt and report any non-2xx status
    /// through [`UpstreamReply`] rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when no reply could be obtained.
    async fn submit(
        &self,
        token: &BearerToken,
        payload: &ConversionPayload,
    ) -> Result<UpstreamReply, ClientError>;
}

/// Errors raised when the upstream call cannot complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Network or protocol failure before a reply was read.
    #[error("{0}")]
    Transport(String),
    /// Payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialization(String),
    /// Client could not be constructed.
    #[error("client build failed: {0}")]
    Build(String),
    /// Bearer token cannot be encoded as a header value.
    #[error("invalid bearer credential")]
    InvalidCredential,
}

// ============================================================================
// SECTION: Upstream Reply
// ============================================================================

/// Raw reply from the upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl UpstreamReply {
    /// Creates a reply from a status and body text.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Parses the body text, falling back to raw text.
    #[must_use]
    pub fn parsed_body(&self) -> UpstreamBody {
        UpstreamBody::parse(&self.body)
    }
}

/// Upstream body, either structured JSON or the raw text it failed to parse as.
///
/// Serializes as the JSON value itself, or as `{ "raw": <text> }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamBody {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not valid JSON.
    Raw {
        /// Unparsed body text.
        raw: String,
    },
}

impl UpstreamBody {
    /// Parses body text as JSON, keeping the text when parsing fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        serde_json::from_str::<Value>(text).map_or_else(
            |_| Self::Raw {
                raw: text.to_string(),
            },
            Self::Json,
        )
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only serialization assertions.")]

    use serde_json::json;

    use super::UpstreamBody;
    use super::UpstreamReply;

    #[test]
    fn json_body_is_parsed() {
        assert_eq!(UpstreamBody::parse(r#"{"id":"abc"}"#), UpstreamBody::Json(json!({"id": "abc"})));
        assert_eq!(UpstreamBody::parse(" null "), UpstreamBody::Json(json!(null)));
    }

    #[test]
    fn text_body_falls_back_to_raw() {
        let body = UpstreamBody::parse("OK");
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"raw": "OK"}));
        let empty = UpstreamBody::parse("");
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"raw": ""}));
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(UpstreamReply::new(200, "").is_success());
        assert!(UpstreamReply::new(299, "").is_success());
        assert!(!UpstreamReply::new(199, "").is_success());
        assert!(!UpstreamReply::new(302, "").is_success());
        assert!(!UpstreamReply::new(422, "").is_success());
    }
}
