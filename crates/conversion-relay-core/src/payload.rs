// crates/conversion-relay-core/src/payload.rs
// ============================================================================
// Module: Conversion Payload
// Description: Outbound PartnerStack conversion payload and its builder.
// Purpose: Express optional-field omission as explicit conditional inserts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`ConversionPayloadBuilder`] starts from the two required fields and inserts
//! each optional key only when its source value is truthy. `sub_ids` is
//! inserted only when the source value is a JSON array.
//! Invariants:
//! - Serialized payloads never contain `null` or placeholder values.
//! - Required fields are always serialized first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::event::truthy;

// ============================================================================
// SECTION: Optional Fields
// ============================================================================

/// Optional scalar fields of the outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalField {
    /// `email`.
    Email,
    /// `name`.
    Name,
    /// `origin`.
    Origin,
    /// `ip_address`.
    IpAddress,
    /// `user_agent`.
    UserAgent,
    /// `external_type`.
    ExternalType,
}

impl OptionalField {
    /// All optional scalar fields in serialization order.
    pub const ALL: [Self; 6] = [
        Self::Email,
        Self::Name,
        Self::Origin,
        Self::IpAddress,
        Self::UserAgent,
        Self::ExternalType,
    ];
}

// ============================================================================
// SECTION: Payload
// ============================================================================

/// Outbound conversion payload sent to PartnerStack.
///
/// # Invariants
/// - Constructed only through [`ConversionPayloadBuilder`].
/// - `None` fields are omitted from the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPayload {
    /// Caller's identifier for the customer.
    customer_key: Value,
    /// Tracking identifier.
    xid: Value,
    /// Customer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<Value>,
    /// Customer display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<Value>,
    /// Source site or app identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<Value>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_address: Option<Value>,
    /// Client user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<Value>,
    /// External conversion type label.
    #[serde(skip_serializing_if = "Option::is_none")]
    external_type: Option<Value>,
    /// Sub-identifiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_ids: Option<Vec<Value>>,
}

impl ConversionPayload {
    /// Serializes the payload to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Returns the mutable storage slot for an optional field.
    const fn slot_mut(&mut self, field: OptionalField) -> &mut Option<Value> {
        match field {
            OptionalField::Email => &mut self.email,
            OptionalField::Name => &mut self.name,
            OptionalField::Origin => &mut self.origin,
            OptionalField::IpAddress => &mut self.ip_address,
            OptionalField::UserAgent => &mut self.user_agent,
            OptionalField::ExternalType => &mut self.external_type,
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder that conditionally inserts optional payload fields.
#[derive(Debug, Clone)]
pub struct ConversionPayloadBuilder {
    /// Payload under construction.
    payload: ConversionPayload,
}

impl ConversionPayloadBuilder {
    /// Starts a payload from the required fields.
    #[must_use]
    pub const fn new(customer_key: Value, xid: Value) -> Self {
        Self {
            payload: ConversionPayload {
                customer_key,
                xid,
                email: None,
                name: None,
                origin: None,
                ip_address: None,
                user_agent: None,
                external_type: None,
                sub_ids: None,
            },
        }
    }

    /// Inserts an optional field when the value is present and truthy.
    #[must_use]
    pub fn optional(mut self, field: OptionalField, value: Option<&Value>) -> Self {
        if let Some(value) = truthy(value) {
            *self.payload.slot_mut(field) = Some(value.clone());
        }
        self
    }

    /// Inserts `sub_ids` only when the value is a JSON array.
    #[must_use]
    pub fn sub_ids(mut self, value: Option<&Value>) -> Self {
        if let Some(Value::Array(items)) = value {
            self.payload.sub_ids = Some(items.clone());
        }
        self
    }

    /// Finishes the payload.
    #[must_use]
    pub fn build(self) -> ConversionPayload {
        self.payload
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
