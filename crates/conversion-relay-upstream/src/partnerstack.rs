// crates/conversion-relay-upstream/src/partnerstack.rs
// ============================================================================
// Module: PartnerStack Client
// Description: reqwest client for the PartnerStack conversion-by-XID endpoint.
// Purpose: Submit one conversion and return the raw reply.
// Dependencies: conversion-relay-core, reqwest, url
// ============================================================================

//! ## Overview
//! The client serializes the payload itself so serialization faults surface as
//! [`ClientError::Serialization`] rather than as transport failures. Redirects
//! follow the reqwest default policy.
//! Security posture: the bearer token is sent only in the `Authorization`
//! header and is marked sensitive so it never appears in debug output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use conversion_relay_core::BearerToken;
use conversion_relay_core::ClientError;
use conversion_relay_core::ConversionClient;
use conversion_relay_core::ConversionPayload;
use conversion_relay_core::UpstreamReply;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`PartnerStackClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerStackClientConfig {
    /// Conversion endpoint URL.
    pub url: Url,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// PartnerStack conversion client.
#[derive(Debug, Clone)]
pub struct PartnerStackClient {
    /// Conversion endpoint URL.
    url: Url,
    /// Shared HTTP client.
    client: Client,
}

impl PartnerStackClient {
    /// Builds a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the HTTP client cannot be built.
    pub fn new(config: PartnerStackClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            url: config.url,
            client,
        })
    }
}

#[async_trait]
impl ConversionClient for PartnerStackClient {
    async fn submit(
        &self,
        token: &BearerToken,
        payload: &ConversionPayload,
    ) -> Result<UpstreamReply, ClientError> {
        let body =
            payload.to_json_bytes().map_err(|err| ClientError::Serialization(err.to_string()))?;
        let authorization = bearer_header(token)?;
        let response = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(UpstreamReply::new(status, text))
    }
}

/// Builds a sensitive `Authorization: Bearer` header value.
fn bearer_header(token: &BearerToken) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
        .map_err(|_| ClientError::InvalidCredential)?;
    value.set_sensitive(true);
    Ok(value)
}
