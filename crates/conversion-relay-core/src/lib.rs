// crates/conversion-relay-core/src/lib.rs
// ============================================================================
// Module: Conversion Relay Core Library
// Description: Conversion event model, payload builder, and relay handler.
// Purpose: Validate inbound conversions and forward them to PartnerStack.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Conversion Relay Core owns the request-to-response contract of the relay:
//! [`ConversionRelay::handle`] validates an inbound submission, attaches the
//! injected bearer credential, forwards a normalized [`ConversionPayload`]
//! through a [`ConversionClient`], and maps the upstream reply onto a
//! [`RelayResponse`].
//! Invariants:
//! - At most one upstream call is made per request.
//! - Optional payload fields are omitted, never sent as null or empty.
//! - Every failure maps to exactly one response; nothing is retried.
//!
//! Security posture: inbound bodies are untrusted and the bearer token never
//! leaves [`BearerToken`] except as an outbound header.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod event;
pub mod payload;
pub mod relay;
pub mod response;
pub mod upstream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use event::ConversionEvent;
pub use event::is_truthy;
pub use payload::ConversionPayload;
pub use payload::ConversionPayloadBuilder;
pub use payload::OptionalField;
pub use relay::BearerToken;
pub use relay::ConversionRelay;
pub use relay::RelayCredentials;
pub use relay::RelayError;
pub use relay::RelayRequest;
pub use relay::RequestMethod;
pub use response::RelayBody;
pub use response::RelayOutcome;
pub use response::RelayResponse;
pub use upstream::ClientError;
pub use upstream::ConversionClient;
pub use upstream::UpstreamBody;
pub use upstream::UpstreamReply;
