// crates/conversion-relay-server/src/lib.rs
// ============================================================================
// Module: Conversion Relay Server Library
// Description: HTTP front end and audit logging for the conversion relay.
// Purpose: Serve the relay endpoint over axum with JSON-line audit events.
// Dependencies: axum, conversion-relay-config, conversion-relay-core, tokio
// ============================================================================

//! ## Overview
//! [`RelayServer`] wires the configured [`conversion_relay_upstream`] client
//! and credentials into a [`conversion_relay_core::ConversionRelay`] and
//! exposes it on one HTTP route. [`audit`] defines the metadata-only events
//! and the sinks they are written to.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::RelayAuditEvent;
pub use audit::RelayAuditEventParams;
pub use audit::RelayAuditSink;
pub use audit::RelayFileAuditSink;
pub use audit::RelayNoopAuditSink;
pub use audit::RelayStartedEvent;
pub use audit::RelayStderrAuditSink;
pub use audit::audit_sink_from_config;
pub use server::RelayServer;
pub use server::ServerError;
