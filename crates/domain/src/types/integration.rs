//! Integration identifiers and definition shapes
//!
//! The set of integrations is closed and compiled in. String ids coming from
//! callers are parsed into [`IntegrationId`]; anything else is rejected before
//! it can become a key in a tenant document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_wire_name_conversions;

/// Closed set of integrations a tenant can enable.
///
/// Discriminants are dense and start at zero so the registry can index its
/// catalog directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationId {
    Email,
    Sms,
    Whatsapp,
    Voice,
    Facebook,
    Instagram,
}

impl_wire_name_conversions!(IntegrationId {
    Email => "email",
    Sms => "sms",
    Whatsapp => "whatsapp",
    Voice => "voice",
    Facebook => "facebook",
    Instagram => "instagram",
});

impl IntegrationId {
    /// Every integration, in catalog order.
    pub const ALL: [Self; 6] =
        [Self::Email, Self::Sms, Self::Whatsapp, Self::Voice, Self::Facebook, Self::Instagram];

    /// Position of this integration in the catalog.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Grouping used by listing UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationCategory {
    Messaging,
    Voice,
    Social,
}

/// What a credential field holds. Only affects presentation and redaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Secret,
    Text,
    Url,
    PhoneNumber,
}

/// One credential field an integration declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialFieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: CredentialKind,
}

/// Value type accepted by a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Boolean,
    Integer,
    Text,
    TextList,
}

impl SettingKind {
    /// Whether `value` has the shape this kind requires.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Text => value.is_string(),
            Self::TextList => {
                value.as_array().is_some_and(|items| items.iter().all(Value::is_string))
            }
        }
    }

    /// Human-readable expectation used in validation messages.
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Boolean => "a boolean",
            Self::Integer => "an integer",
            Self::Text => "a string",
            Self::TextList => "a list of strings",
        }
    }
}

/// One setting an integration declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingSpec {
    pub key: &'static str,
    pub kind: SettingKind,
    pub description: &'static str,
}

/// Immutable description of an integration, owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationDefinition {
    pub id: IntegrationId,
    pub name: &'static str,
    pub category: IntegrationCategory,
    /// Key of this integration's entry in `connection_flags`
    pub flag_key: &'static str,
    pub credential_fields: &'static [CredentialFieldSpec],
    pub settings: &'static [SettingSpec],
    pub docs_url: &'static str,
    pub setup_notes: &'static str,
}

impl IntegrationDefinition {
    /// Credential fields that must be present and non-empty on connect.
    pub fn required_credentials(&self) -> impl Iterator<Item = &CredentialFieldSpec> + '_ {
        self.credential_fields.iter().filter(|field| field.required)
    }

    pub fn credential_field(&self, key: &str) -> Option<&CredentialFieldSpec> {
        self.credential_fields.iter().find(|field| field.key == key)
    }

    pub fn setting(&self, key: &str) -> Option<&SettingSpec> {
        self.settings.iter().find(|spec| spec.key == key)
    }
}
