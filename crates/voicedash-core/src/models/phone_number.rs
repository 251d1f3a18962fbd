use serde::{Deserialize, Serialize};

use crate::utils::format::{format_date, format_phone};

/// Telephony provider backing a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Provider {
    #[default]
    #[serde(rename = "byo-phone-number")]
    ByoPhoneNumber,
    #[serde(rename = "twilio")]
    Twilio,
    #[serde(rename = "vonage")]
    Vonage,
    /// Anything else the backend passes through
    #[serde(rename = "other")]
    #[serde(other)]
    Other,
}

impl Provider {
    /// Providers a new number can be created with
    pub const ALL: [Provider; 3] = [Provider::ByoPhoneNumber, Provider::Twilio, Provider::Vonage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::ByoPhoneNumber => "byo-phone-number",
            Provider::Twilio => "twilio",
            Provider::Vonage => "vonage",
            Provider::Other => "other",
        }
    }

    /// Next provider (wrapping around), for cycling in forms
    pub fn next(&self) -> Self {
        match self {
            Provider::ByoPhoneNumber => Provider::Twilio,
            Provider::Twilio => Provider::Vonage,
            Provider::Vonage | Provider::Other => Provider::ByoPhoneNumber,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::ByoPhoneNumber => write!(f, "Bring your own"),
            Provider::Twilio => write!(f, "Twilio"),
            Provider::Vonage => write!(f, "Vonage"),
            Provider::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(rename = "credentialId", default)]
    pub credential_id: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl PhoneNumber {
    pub fn display_number(&self) -> String {
        format_phone(&self.number)
    }

    pub fn created_display(&self) -> String {
        match &self.created_at {
            Some(date) => format_date(date),
            None => "N/A".to_string(),
        }
    }

    pub fn to_draft(&self) -> PhoneNumberDraft {
        PhoneNumberDraft {
            provider: self.provider,
            number: self.number.clone(),
            credential_id: self.credential_id.clone(),
        }
    }
}

/// Body of `POST /phone-numbers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumberDraft {
    pub provider: Provider,
    pub number: String,
    #[serde(rename = "credentialId", skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

/// Body of `PATCH /phone-numbers/{id}`. The provider cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "credentialId", skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

impl From<PhoneNumberDraft> for PhoneNumberPatch {
    fn from(draft: PhoneNumberDraft) -> Self {
        Self {
            number: Some(draft.number),
            credential_id: draft.credential_id,
        }
    }
}

/// Replace the entry with the same id, or append a new one.
pub fn upsert_phone_number(list: &mut Vec<PhoneNumber>, phone: PhoneNumber) {
    match list.iter_mut().find(|p| p.id == phone.id) {
        Some(existing) => *existing = phone,
        None => list.push(phone),
    }
}
