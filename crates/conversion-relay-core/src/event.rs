// crates/conversion-relay-core/src/event.rs
// ============================================================================
// Module: Conversion Event
// Description: Inbound conversion submission model and truthiness rules.
// Purpose: Decode untrusted request bodies into per-request conversion events.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ConversionEvent`] is decoded from the inbound body once per request and
//! discarded with the response. Fields keep the JSON value the caller sent so
//! the relay forwards them verbatim.
//! Invariants:
//! - An empty or whitespace-only body decodes to an event with no fields.
//! - A JSON value that is not an object decodes to an event with no fields.
//! - Field presence is decided by [`is_truthy`], never by key presence alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::payload::ConversionPayload;
use crate::payload::ConversionPayloadBuilder;
use crate::payload::OptionalField;
use crate::relay::RelayError;

// ============================================================================
// SECTION: Conversion Event
// ============================================================================

/// Inbound conversion submission.
///
/// # Invariants
/// - `None` and a falsy value are treated identically by payload building.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConversionEvent {
    /// Caller's identifier for the customer (required).
    #[serde(default)]
    pub customer_key: Option<Value>,
    /// Tracking identifier captured earlier in the funnel (required).
    #[serde(default)]
    pub xid: Option<Value>,
    /// Customer email.
    #[serde(default)]
    pub email: Option<Value>,
    /// Customer display name.
    #[serde(default)]
    pub name: Option<Value>,
    /// Source site or app identifier.
    #[serde(default)]
    pub origin: Option<Value>,
    /// Best-effort client IP address (unvalidated).
    #[serde(default)]
    pub ip_address: Option<Value>,
    /// Best-effort client user agent (unvalidated).
    #[serde(default)]
    pub user_agent: Option<Value>,
    /// External conversion type label.
    #[serde(default)]
    pub external_type: Option<Value>,
    /// Sub-identifiers; only forwarded when a JSON array.
    #[serde(default)]
    pub sub_ids: Option<Value>,
}

impl ConversionEvent {
    /// Decodes an inbound request body.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedBody`] when a non-empty body is not JSON.
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| RelayError::MalformedBody(err.to_string()))?;
        Self::from_value(value)
    }

    /// Decodes a parsed JSON value; non-objects yield an empty event.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedBody`] when the object cannot be decoded.
    pub fn from_value(value: Value) -> Result<Self, RelayError> {
        match value {
            Value::Object(map) => serde_json::from_value(Value::Object(map))
                .map_err(|err| RelayError::MalformedBody(err.to_string())),
            _ => Ok(Self::default()),
        }
    }

    /// Returns true when both required fields are present and truthy.
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        truthy(self.customer_key.as_ref()).is_some() && truthy(self.xid.as_ref()).is_some()
    }

    /// Builds the outbound payload, omitting absent and falsy optional fields.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MissingRequiredFields`] when `customer_key` or
    /// `xid` is missing or falsy.
    pub fn to_payload(&self) -> Result<ConversionPayload, RelayError> {
        let (Some(customer_key), Some(xid)) =
            (truthy(self.customer_key.as_ref()), truthy(self.xid.as_ref()))
        else {
            return Err(RelayError::MissingRequiredFields);
        };
        let payload = ConversionPayloadBuilder::new(customer_key.clone(), xid.clone())
            .optional(OptionalField::Email, self.email.as_ref())
            .optional(OptionalField::Name, self.name.as_ref())
            .optional(OptionalField::Origin, self.origin.as_ref())
            .optional(OptionalField::IpAddress, self.ip_address.as_ref())
            .optional(OptionalField::UserAgent, self.user_agent.as_ref())
            .optional(OptionalField::ExternalType, self.external_type.as_ref())
            .sub_ids(self.sub_ids.as_ref())
            .build();
        Ok(payload)
    }
}

// ============================================================================
// SECTION: Truthiness
// ============================================================================

/// Returns true when a JSON value counts as present.
///
/// `null`, `false`, numeric zero, the empty string and the string `"0"` are
/// falsy; every other value, including empty arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the value when it is present and truthy.
pub(crate) fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| is_truthy(value))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
