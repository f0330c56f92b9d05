//! Compiled-in catalog of integrations
//!
//! The catalog is a static array indexed by [`IntegrationId`] discriminant, so
//! every lookup is O(1) and has no side effects. Besides lookups, the registry
//! owns schema validation: any credential or setting key that reaches a tenant
//! document has been checked against the definition here first.

use std::collections::BTreeMap;

use tenantlink_domain::{
    CredentialFieldSpec, CredentialKind, IntegrationCategory, IntegrationDefinition,
    IntegrationId, SettingKind, SettingSpec, SettingsMap, ValidationError,
};

const fn required(key: &'static str, label: &'static str, kind: CredentialKind) -> CredentialFieldSpec {
    CredentialFieldSpec { key, label, required: true, kind }
}

const fn optional(key: &'static str, label: &'static str, kind: CredentialKind) -> CredentialFieldSpec {
    CredentialFieldSpec { key, label, required: false, kind }
}

const fn setting(key: &'static str, kind: SettingKind, description: &'static str) -> SettingSpec {
    SettingSpec { key, kind, description }
}

static CATALOG: [IntegrationDefinition; 6] = [
    IntegrationDefinition {
        id: IntegrationId::Email,
        name: "Email",
        category: IntegrationCategory::Messaging,
        flag_key: "email_enabled",
        credential_fields: &[
            required("smtp_key", "SMTP API key", CredentialKind::Secret),
            optional("smtp_host", "SMTP host", CredentialKind::Text),
            optional("from_address", "Sender address", CredentialKind::Text),
        ],
        settings: &[
            setting("from_name", SettingKind::Text, "Display name on outgoing mail"),
            setting("reply_to", SettingKind::Text, "Reply-To header override"),
            setting("track_opens", SettingKind::Boolean, "Embed open-tracking pixels"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/email",
        setup_notes: "Create an API key with send permission in your SMTP provider.",
    },
    IntegrationDefinition {
        id: IntegrationId::Sms,
        name: "SMS",
        category: IntegrationCategory::Messaging,
        flag_key: "sms_enabled",
        credential_fields: &[
            required("account_sid", "Account SID", CredentialKind::Text),
            required("auth_token", "Auth token", CredentialKind::Secret),
            optional("sender_number", "Sender number", CredentialKind::PhoneNumber),
        ],
        settings: &[
            setting("daily_limit", SettingKind::Integer, "Maximum messages sent per day"),
            setting("retries", SettingKind::Integer, "Delivery retries per message"),
            setting("opt_out_keywords", SettingKind::TextList, "Keywords that unsubscribe"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/sms",
        setup_notes: "Copy the account SID and auth token from the provider console.",
    },
    IntegrationDefinition {
        id: IntegrationId::Whatsapp,
        name: "WhatsApp Business",
        category: IntegrationCategory::Messaging,
        flag_key: "whatsapp_enabled",
        credential_fields: &[
            required("phone_number_id", "Phone number ID", CredentialKind::Text),
            required("access_token", "Access token", CredentialKind::Secret),
            optional("business_account_id", "Business account ID", CredentialKind::Text),
        ],
        settings: &[
            setting("template_namespace", SettingKind::Text, "Message template namespace"),
            setting("auto_reply", SettingKind::Boolean, "Answer inbound messages automatically"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/whatsapp",
        setup_notes: "Use a permanent system-user token; temporary tokens expire within a day.",
    },
    IntegrationDefinition {
        id: IntegrationId::Voice,
        name: "Voice",
        category: IntegrationCategory::Voice,
        flag_key: "voice_enabled",
        credential_fields: &[
            required("api_key", "API key", CredentialKind::Secret),
            required("caller_id", "Caller ID", CredentialKind::PhoneNumber),
            optional("webhook_secret", "Webhook signing secret", CredentialKind::Secret),
        ],
        settings: &[
            setting("record_calls", SettingKind::Boolean, "Record inbound and outbound calls"),
            setting("max_call_minutes", SettingKind::Integer, "Hang up after this many minutes"),
            setting("greeting", SettingKind::Text, "Text read when a call is answered"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/voice",
        setup_notes: "The caller ID must be verified with the voice provider first.",
    },
    IntegrationDefinition {
        id: IntegrationId::Facebook,
        name: "Facebook Messenger",
        category: IntegrationCategory::Social,
        flag_key: "facebook_enabled",
        credential_fields: &[
            required("page_id", "Page ID", CredentialKind::Text),
            required("page_access_token", "Page access token", CredentialKind::Secret),
        ],
        settings: &[
            setting("auto_reply", SettingKind::Boolean, "Answer inbound messages automatically"),
            setting("reply_languages", SettingKind::TextList, "Languages auto-replies are sent in"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/facebook",
        setup_notes: "The page token needs the pages_messaging permission.",
    },
    IntegrationDefinition {
        id: IntegrationId::Instagram,
        name: "Instagram",
        category: IntegrationCategory::Social,
        flag_key: "instagram_enabled",
        credential_fields: &[
            required("account_id", "Instagram account ID", CredentialKind::Text),
            required("access_token", "Access token", CredentialKind::Secret),
        ],
        settings: &[
            setting("auto_reply", SettingKind::Boolean, "Answer direct messages automatically"),
            setting("story_mentions", SettingKind::Boolean, "Forward story mentions to the inbox"),
        ],
        docs_url: "https://docs.tenantlink.dev/integrations/instagram",
        setup_notes: "Only professional accounts linked to a Facebook page can connect.",
    },
];

/// Read-only access to the integration catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrationRegistry;

impl IntegrationRegistry {
    /// Every definition, in catalog order.
    pub fn definitions() -> &'static [IntegrationDefinition] {
        &CATALOG
    }

    /// Definition of a known integration.
    pub fn definition(id: IntegrationId) -> &'static IntegrationDefinition {
        &CATALOG[id.index()]
    }

    /// Look up a definition by its string id.
    pub fn get_definition(id: &str) -> Option<&'static IntegrationDefinition> {
        id.parse::<IntegrationId>().ok().map(Self::definition)
    }

    /// Connection flag key for a string id.
    pub fn flag_key(id: &str) -> Option<&'static str> {
        Self::get_definition(id).map(|definition| definition.flag_key)
    }

    /// Parse a caller-supplied id, rejecting anything outside the catalog.
    pub fn parse(id: &str) -> Result<IntegrationId, ValidationError> {
        id.parse().map_err(|_| ValidationError::UnknownIntegration { id: id.to_string() })
    }

    /// Check connect credentials against the definition.
    ///
    /// Required fields must be present and non-blank; undeclared keys are
    /// rejected so nothing outside the schema reaches the document.
    pub fn validate_credentials(
        definition: &IntegrationDefinition,
        credentials: &BTreeMap<String, String>,
    ) -> Result<(), ValidationError> {
        for field in definition.required_credentials() {
            let present = credentials.get(field.key).is_some_and(|value| !value.trim().is_empty());
            if !present {
                return Err(ValidationError::MissingCredential {
                    integration: definition.id.to_string(),
                    field: field.key.to_string(),
                });
            }
        }

        if let Some(key) = credentials.keys().find(|key| definition.credential_field(key).is_none())
        {
            return Err(ValidationError::UnknownCredential {
                integration: definition.id.to_string(),
                field: key.clone(),
            });
        }

        Ok(())
    }

    /// Check a (partial) settings map against the definition.
    pub fn validate_settings(
        definition: &IntegrationDefinition,
        settings: &SettingsMap,
    ) -> Result<(), ValidationError> {
        for (key, value) in settings {
            let spec = definition.setting(key).ok_or_else(|| ValidationError::UnknownSetting {
                integration: definition.id.to_string(),
                key: key.clone(),
            })?;

            if !spec.kind.accepts(value) {
                return Err(ValidationError::InvalidSetting {
                    integration: definition.id.to_string(),
                    key: key.clone(),
                    expected: spec.kind.expected().to_string(),
                });
            }
        }
        Ok(())
    }
}
