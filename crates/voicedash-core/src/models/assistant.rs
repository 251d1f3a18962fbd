use serde::{Deserialize, Serialize};

use crate::utils::format::format_date;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantVoice {
    #[serde(rename = "voiceId", default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantModel {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ModelMessage>,
}

/// A voice assistant as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub voice: Option<AssistantVoice>,
    #[serde(rename = "firstMessage", default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub model: Option<AssistantModel>,
    // Some responses flatten the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl Assistant {
    pub fn voice_id(&self) -> Option<&str> {
        self.voice.as_ref().and_then(|v| v.voice_id.as_deref())
    }

    /// System prompt, from the model messages or the flat field
    pub fn system_prompt(&self) -> Option<&str> {
        self.model
            .as_ref()
            .and_then(|m| m.messages.first())
            .map(|m| m.content.as_str())
            .or(self.prompt.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn created_display(&self) -> String {
        match &self.created_at {
            Some(date) => format_date(date),
            None => "N/A".to_string(),
        }
    }

    /// Draft pre-filled from this assistant, for the edit form
    pub fn to_draft(&self) -> AssistantDraft {
        AssistantDraft {
            name: self.name.clone(),
            prompt: self.system_prompt().unwrap_or_default().to_string(),
            voice_id: self.voice_id().map(str::to_string),
            first_message: self.first_message.clone(),
        }
    }
}

/// Body of `POST /assistants`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantDraft {
    pub name: String,
    pub prompt: String,
    #[serde(rename = "voiceId", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(rename = "firstMessage", skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
}

/// Body of `PATCH /assistants/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(rename = "voiceId", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(rename = "firstMessage", skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
}

impl From<AssistantDraft> for AssistantPatch {
    fn from(draft: AssistantDraft) -> Self {
        Self {
            name: Some(draft.name),
            prompt: Some(draft.prompt),
            voice_id: draft.voice_id,
            first_message: draft.first_message,
        }
    }
}

/// Replace the entry with the same id, or append a new one.
pub fn upsert_assistant(list: &mut Vec<Assistant>, assistant: Assistant) {
    match list.iter_mut().find(|a| a.id == assistant.id) {
        Some(existing) => *existing = assistant,
        None => list.push(assistant),
    }
}
