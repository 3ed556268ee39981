// crates/conversion-relay-core/src/relay.rs
// ============================================================================
// Module: Conversion Relay
// Description: Request handler relaying conversions to PartnerStack.
// Purpose: Validate, attach credentials, forward once, and map the reply.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ConversionRelay::handle`] runs a linear sequence of checks and makes zero
//! or one upstream calls:
//! 1. method must be POST (405 otherwise);
//! 2. the body decodes to a [`ConversionEvent`];
//! 3. `customer_key` and `xid` must be truthy (400 otherwise);
//! 4. a bearer credential must be configured (500 otherwise);
//! 5. the payload is built and submitted once;
//! 6. the reply is mapped by [`RelayResponse::from_upstream`].
//!
//! Any other failure becomes a 500 carrying the fault message. The relay holds
//! no mutable state, so concurrent calls need no coordination.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::event::ConversionEvent;
use crate::response::RelayOutcome;
use crate::response::RelayResponse;
use crate::response::UNEXPECTED_ERROR_MESSAGE;
use crate::upstream::ClientError;
use crate::upstream::ConversionClient;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Inbound request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    /// The designated write method.
    Post,
    /// Any other method, by name.
    Other(String),
}

impl RequestMethod {
    /// Classifies a method name (case-sensitive, as on the wire).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == "POST" { Self::Post } else { Self::Other(name.to_string()) }
    }
}

/// Inbound relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// Request method.
    pub method: RequestMethod,
    /// Raw request body; empty when absent.
    pub body: Vec<u8>,
}

impl RelayRequest {
    /// Builds a POST request with the given body.
    #[must_use]
    pub fn post(body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: RequestMethod::Post,
            body: body.into(),
        }
    }

    /// Builds a request with an arbitrary method name.
    #[must_use]
    pub fn new(method: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: RequestMethod::from_name(method),
            body: body.into(),
        }
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// PartnerStack bearer token.
///
/// # Invariants
/// - Never empty.
/// - `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a token; empty tokens are rejected.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() { None } else { Some(Self(token)) }
    }

    /// Returns the token for header construction.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Credentials injected into the relay at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayCredentials {
    /// Bearer token, when configured.
    token: Option<BearerToken>,
}

impl RelayCredentials {
    /// Credentials with a bearer token; an empty token counts as unset.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: BearerToken::new(token),
        }
    }

    /// Credentials with no token configured.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            token: None,
        }
    }

    /// Builds credentials from an optional raw token.
    #[must_use]
    pub fn from_option(token: Option<String>) -> Self {
        Self {
            token: token.and_then(BearerToken::new),
        }
    }

    /// Returns the configured token.
    #[must_use]
    pub const fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Returns true when a token is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

// ============================================================================
// SECTION: Relay
// ============================================================================

/// Conversion relay handler.
#[derive(Clone)]
pub struct ConversionRelay {
    /// Outbound PartnerStack client.
    client: Arc<dyn ConversionClient>,
    /// Injected credentials.
    credentials: RelayCredentials,
}

impl ConversionRelay {
    /// Builds a relay over a client and injected credentials.
    #[must_use]
    pub fn new(client: Arc<dyn ConversionClient>, credentials: RelayCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Returns the injected credentials.
    #[must_use]
    pub const fn credentials(&self) -> &RelayCredentials {
        &self.credentials
    }

    /// Handles one relay request; never fails.
    pub async fn handle(&self, request: &RelayRequest) -> RelayResponse {
        match self.relay(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    /// Runs the relay steps, surfacing local failures as [`RelayError`].
    async fn relay(&self, request: &RelayRequest) -> Result<RelayResponse, RelayError> {
        if request.method != RequestMethod::Post {
            return Err(RelayError::MethodNotAllowed);
        }
        let event = ConversionEvent::from_body(&request.body)?;
        if !event.has_required_fields() {
            return Err(RelayError::MissingRequiredFields);
        }
        let token = self.credentials.token().ok_or(RelayError::MissingCredential)?;
        let payload = event.to_payload()?;
        let reply = self.client.submit(token, &payload).await?;
        Ok(RelayResponse::from_upstream(&reply))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Local relay failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Method other than POST.
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// `customer_key` or `xid` missing or falsy.
    #[error("Missing required fields: customer_key and xid")]
    MissingRequiredFields,
    /// Bearer credential not configured.
    #[error("Server misconfigured: PARTNERSTACK_TOKEN not set")]
    MissingCredential,
    /// Non-empty body that is not JSON.
    #[error("invalid JSON body: {0}")]
    MalformedBody(String),
    /// Upstream call failed before a reply was read.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl RelayError {
    /// Maps the failure onto its caller response.
    #[must_use]
    pub fn into_response(self) -> RelayResponse {
        match self {
            Self::MethodNotAllowed => {
                RelayResponse::error(405, RelayOutcome::MethodNotAllowed, self.to_string())
            }
            Self::MissingRequiredFields => {
                RelayResponse::error(400, RelayOutcome::InvalidRequest, self.to_string())
            }
            Self::MissingCredential => {
                RelayResponse::error(500, RelayOutcome::Misconfigured, self.to_string())
            }
            Self::MalformedBody(_) | Self::Client(_) => {
                RelayResponse::error(500, RelayOutcome::Fault, fault_message(&self))
            }
        }
    }
}

/// Returns the fault message, or the generic message when it is blank.
fn fault_message(err: &RelayError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() { UNEXPECTED_ERROR_MESSAGE.to_string() } else { message }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
