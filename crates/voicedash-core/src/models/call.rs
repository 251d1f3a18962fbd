use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::conversation::Message;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    #[serde(rename = "assistantId", default)]
    pub assistant_id: Option<String>,
    #[serde(rename = "phoneNumberId", default)]
    pub phone_number_id: Option<String>,
    #[serde(rename = "type", default)]
    pub call_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "endedReason", default)]
    pub ended_reason: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "startedAt", default)]
    pub started_at: Option<String>,
    #[serde(rename = "endedAt", default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub transcript: Option<String>,
}

impl Call {
    /// Call length in whole seconds, if both ends are known
    pub fn duration_secs(&self) -> Option<i64> {
        let started = DateTime::parse_from_rfc3339(self.started_at.as_deref()?).ok()?;
        let ended = DateTime::parse_from_rfc3339(self.ended_at.as_deref()?).ok()?;
        Some((ended - started).num_seconds().max(0))
    }

    pub fn duration_display(&self) -> String {
        match self.duration_secs() {
            Some(secs) => format!("{}m {:02}s", secs / 60, secs % 60),
            None => "-".to_string(),
        }
    }

    pub fn status_display(&self) -> &str {
        self.status.as_deref().unwrap_or("unknown")
    }

    pub fn type_display(&self) -> &str {
        match self.call_type.as_deref() {
            Some("inboundPhoneCall") => "Inbound",
            Some("outboundPhoneCall") => "Outbound",
            Some("webCall") => "Web",
            Some(other) => other,
            None => "Call",
        }
    }
}
