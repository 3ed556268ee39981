// crates/conversion-relay-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for conversion relay configuration. The output is static
//! and must always load through [`crate::RelayConfig::from_toml_str`].

/// Returns a canonical example `conversion-relay.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
path = "/functions/ps-conversion"
max_body_bytes = 65536

[upstream]
url = "https://partnerlinks.io/conversion/xid"
token_env = "PARTNERSTACK_TOKEN"
user_agent = "conversion-relay/0.1.0"

[audit]
enabled = true
"#,
    )
}
