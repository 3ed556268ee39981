// crates/conversion-relay-upstream/src/lib.rs
// ============================================================================
// Module: Conversion Relay Upstream Library
// Description: HTTP client for the PartnerStack conversion endpoint.
// Purpose: Provide the reqwest-backed ConversionClient used in production.
// Dependencies: conversion-relay-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`PartnerStackClient`] implements [`conversion_relay_core::ConversionClient`]
//! over an async reqwest client. Each submission is one `POST` with a bearer
//! token and a JSON body; the reply status and body text are returned as-is.
//! Invariants:
//! - Exactly one attempt per submission; nothing is retried.
//! - No request timeout is set beyond the client defaults.
//! - Non-2xx statuses are replies, not errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod partnerstack;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use partnerstack::PartnerStackClient;
pub use partnerstack::PartnerStackClientConfig;
