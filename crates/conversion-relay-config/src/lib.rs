// crates/conversion-relay-config/src/lib.rs
// ============================================================================
// Module: Conversion Relay Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for conversion-relay.toml semantics.
// Dependencies: conversion-relay-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `conversion-relay-config` defines the configuration model for the
//! conversion relay: listener settings, the upstream endpoint, the name of the
//! environment variable holding the bearer token, and audit sinks. Validation
//! is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
