// crates/conversion-relay-config/src/config.rs
// ============================================================================
// Module: Conversion Relay Configuration
// Description: Configuration loading and validation for the conversion relay.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: conversion-relay-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The bearer token is never stored in the file: it is read from the
//! environment variable named by `upstream.token_env` and handed to the relay
//! as [`RelayCredentials`]. An unset token is not a load error; the relay
//! reports it per request.
//! Security posture: config inputs are untrusted and the token is treated as a
//! secret.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use conversion_relay_core::RelayCredentials;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "conversion-relay.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CONVERSION_RELAY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum accepted request body limit in bytes.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 1024 * 1024;
/// Maximum length of the route path and user agent.
pub(crate) const MAX_LABEL_LENGTH: usize = 256;
/// Characters rejected in the route path (query, fragment and route syntax).
const RESERVED_PATH_CHARS: [char; 6] = ['?', '#', ':', '*', '{', '}'];
/// Default bind address for the relay server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default route path for the relay endpoint.
pub const DEFAULT_PATH: &str = "/functions/ps-conversion";
/// Default PartnerStack conversion-by-XID endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://partnerlinks.io/conversion/xid";
/// Default environment variable holding the PartnerStack bearer token.
pub const DEFAULT_TOKEN_ENV: &str = "PARTNERSTACK_TOKEN";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Conversion relay configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream PartnerStack configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl RelayConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// An explicit path (argument or [`CONFIG_ENV_VAR`]) must exist. When
    /// neither is set and the default file is absent, defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Resolves credentials from the process environment.
    #[must_use]
    pub fn credentials(&self) -> RelayCredentials {
        self.credentials_from(|name| env::var(name).ok())
    }

    /// Resolves credentials through a variable lookup.
    ///
    /// Unset and empty variables both yield missing credentials.
    #[must_use]
    pub fn credentials_from<F>(&self, lookup: F) -> RelayCredentials
    where
        F: Fn(&str) -> Option<String>,
    {
        RelayCredentials::from_option(lookup(&self.upstream.token_env))
    }
}

/// Relay server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Route path for the relay endpoint.
    #[serde(default = "default_path")]
    pub path: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            path: default_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !self.path.starts_with('/') {
            return Err(ConfigError::Invalid("server.path must start with '/'".to_string()));
        }
        if self.path.len() > MAX_LABEL_LENGTH {
            return Err(ConfigError::Invalid("server.path exceeds max length".to_string()));
        }
        if self.path.chars().any(|ch| ch.is_whitespace() || RESERVED_PATH_CHARS.contains(&ch)) {
            return Err(ConfigError::Invalid(
                "server.path must not contain whitespace or route syntax (? # : * { })".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must not exceed {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Upstream PartnerStack configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Conversion endpoint URL.
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// User agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamConfig {
    /// Returns the parsed upstream URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is invalid or not http(s).
    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.url.trim())
            .map_err(|err| ConfigError::Invalid(format!("invalid upstream.url: {err}")))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ConfigError::Invalid(format!(
                    "upstream.url scheme must be http or https, got {scheme}"
                )));
            }
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid("upstream.url requires a host".to_string()));
        }
        Ok(url)
    }

    /// Validates upstream configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_url()?;
        let token_env = self.token_env.trim();
        if token_env.is_empty() {
            return Err(ConfigError::Invalid("upstream.token_env must be non-empty".to_string()));
        }
        if token_env.contains('=') || token_env.contains('\0') {
            return Err(ConfigError::Invalid(
                "upstream.token_env must not contain '=' or NUL".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.user_agent must be non-empty".to_string()));
        }
        if self.user_agent.len() > MAX_LABEL_LENGTH {
            return Err(ConfigError::Invalid("upstream.user_agent exceeds max length".to_string()));
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag is true when the path was given explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default route path.
fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

/// Default request body limit (64 KiB).
const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Default upstream URL.
fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

/// Default token environment variable.
fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// Default outbound user agent.
fn default_user_agent() -> String {
    format!("conversion-relay/{}", env!("CARGO_PKG_VERSION"))
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}
