//! Text form state shared by the entry screen and the edit dialogs.

use voicedash_core::models::{AssistantDraft, PhoneNumberDraft, Provider, RegisterRequest};

/// Maximum length for single-line input.
const MAX_FIELD_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a system prompt.
const MAX_PROMPT_LENGTH: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Rendered masked
    Secret,
    /// Rendered wrapped over several lines
    LongText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    fn new(label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            kind,
            required,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn max_len(&self) -> usize {
        match self.kind {
            FieldKind::Text => MAX_FIELD_LENGTH,
            FieldKind::Secret => MAX_PASSWORD_LENGTH,
            FieldKind::LongText => MAX_PROMPT_LENGTH,
        }
    }
}

/// A list of fields followed by a submit button.
/// `focus == fields.len()` means the button is focused.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

// Field positions
pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;

pub const REGISTER_EMAIL: usize = 0;
pub const REGISTER_USERNAME: usize = 1;
pub const REGISTER_PASSWORD: usize = 2;
pub const REGISTER_CONFIRM: usize = 3;

pub const ASSISTANT_NAME: usize = 0;
pub const ASSISTANT_PROMPT: usize = 1;
pub const ASSISTANT_VOICE: usize = 2;
pub const ASSISTANT_FIRST_MESSAGE: usize = 3;

pub const PHONE_NUMBER: usize = 0;
pub const PHONE_CREDENTIAL: usize = 1;

impl Form {
    fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            focus: 0,
            error: None,
        }
    }

    pub fn login(last_email: Option<&str>) -> Self {
        let mut form = Self::new(vec![
            FormField::new("Email", FieldKind::Text, true).with_value(last_email.unwrap_or_default()),
            FormField::new("Password", FieldKind::Secret, true),
        ]);
        if last_email.is_some_and(|e| !e.is_empty()) {
            form.focus = LOGIN_PASSWORD;
        }
        form
    }

    pub fn register() -> Self {
        Self::new(vec![
            FormField::new("Email", FieldKind::Text, true),
            FormField::new("Username", FieldKind::Text, true),
            FormField::new("Password", FieldKind::Secret, true),
            FormField::new("Confirm", FieldKind::Secret, true),
        ])
    }

    pub fn assistant(draft: &AssistantDraft) -> Self {
        Self::new(vec![
            FormField::new("Name", FieldKind::Text, true).with_value(&draft.name),
            FormField::new("Prompt", FieldKind::LongText, true).with_value(&draft.prompt),
            FormField::new("Voice ID", FieldKind::Text, false)
                .with_value(draft.voice_id.clone().unwrap_or_default()),
            FormField::new("First message", FieldKind::Text, false)
                .with_value(draft.first_message.clone().unwrap_or_default()),
        ])
    }

    pub fn phone_number(draft: &PhoneNumberDraft) -> Self {
        Self::new(vec![
            FormField::new("Number", FieldKind::Text, true).with_value(&draft.number),
            FormField::new("Credential ID", FieldKind::Text, false)
                .with_value(draft.credential_id.clone().unwrap_or_default()),
        ])
    }

    pub fn on_button(&self) -> bool {
        self.focus >= self.fields.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let slots = self.fields.len() + 1;
        self.focus = (self.focus + slots - 1) % slots;
    }

    /// Append a character to the focused field. Control characters and
    /// input past the field's limit are ignored.
    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if !c.is_control() && field.value.chars().count() < field.max_len() {
                field.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or_default()
    }

    fn optional(&self, index: usize) -> Option<String> {
        let value = self.value(index).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Label of the first required field left blank
    pub fn missing_required(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.required && f.value.trim().is_empty())
            .map(|f| f.label)
    }

    /// Blank every secret field
    pub fn clear_secrets(&mut self) {
        for field in &mut self.fields {
            if field.kind == FieldKind::Secret {
                field.value.clear();
            }
        }
    }

    pub fn register_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.value(REGISTER_EMAIL).trim().to_string(),
            username: self.value(REGISTER_USERNAME).trim().to_string(),
            password: self.value(REGISTER_PASSWORD).to_string(),
            confirm_password: self.value(REGISTER_CONFIRM).to_string(),
        }
    }

    pub fn assistant_draft(&self) -> AssistantDraft {
        AssistantDraft {
            name: self.value(ASSISTANT_NAME).trim().to_string(),
            prompt: self.value(ASSISTANT_PROMPT).trim().to_string(),
            voice_id: self.optional(ASSISTANT_VOICE),
            first_message: self.optional(ASSISTANT_FIRST_MESSAGE),
        }
    }

    pub fn phone_number_draft(&self, provider: Provider) -> PhoneNumberDraft {
        PhoneNumberDraft {
            provider,
            number: self.value(PHONE_NUMBER).trim().to_string(),
            credential_id: self.optional(PHONE_CREDENTIAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_focuses_password_when_email_known() {
        assert_eq!(Form::login(None).focus, LOGIN_EMAIL);
        let form = Form::login(Some("ada@example.com"));
        assert_eq!(form.focus, LOGIN_PASSWORD);
        assert_eq!(form.value(LOGIN_EMAIL), "ada@example.com");
    }

    #[test]
    fn test_focus_cycles_through_button() {
        let mut form = Form::login(None);
        form.focus_next();
        form.focus_next();
        assert!(form.on_button());
        form.focus_next();
        assert_eq!(form.focus, LOGIN_EMAIL);
        form.focus_prev();
        assert!(form.on_button());
    }

    #[test]
    fn test_push_char_rejects_control_and_overflow() {
        let mut form = Form::register();
        form.push_char('a');
        form.push_char('\n');
        form.push_char('\t');
        assert_eq!(form.value(REGISTER_EMAIL), "a");

        for _ in 0..MAX_FIELD_LENGTH + 5 {
            form.push_char('x');
        }
        assert_eq!(form.value(REGISTER_EMAIL).len(), MAX_FIELD_LENGTH);

        form.focus = form.fields.len();
        form.push_char('z');
        form.pop_char();
        assert_eq!(form.value(REGISTER_EMAIL).len(), MAX_FIELD_LENGTH);
    }

    #[test]
    fn test_missing_required() {
        let mut form = Form::login(None);
        assert_eq!(form.missing_required(), Some("Email"));
        form.fields[LOGIN_EMAIL].value = "ada@example.com".to_string();
        assert_eq!(form.missing_required(), Some("Password"));
        form.fields[LOGIN_PASSWORD].value = "pw".to_string();
        assert_eq!(form.missing_required(), None);
        form.clear_secrets();
        assert_eq!(form.value(LOGIN_PASSWORD), "");
        assert_eq!(form.value(LOGIN_EMAIL), "ada@example.com");
    }

    #[test]
    fn test_assistant_draft_round_trip() {
        let draft = AssistantDraft {
            name: "Sales".to_string(),
            prompt: "Sell.".to_string(),
            voice_id: Some("v1".to_string()),
            first_message: None,
        };
        let mut form = Form::assistant(&draft);
        assert_eq!(form.assistant_draft(), draft);

        form.fields[ASSISTANT_VOICE].value = "   ".to_string();
        assert_eq!(form.assistant_draft().voice_id, None);
    }

    #[test]
    fn test_phone_number_draft() {
        let mut form = Form::phone_number(&PhoneNumberDraft::default());
        assert_eq!(form.missing_required(), Some("Number"));
        form.fields[PHONE_NUMBER].value = " +14155551234 ".to_string();
        let draft = form.phone_number_draft(Provider::Twilio);
        assert_eq!(draft.number, "+14155551234");
        assert_eq!(draft.provider, Provider::Twilio);
        assert_eq!(draft.credential_id, None);
    }

    #[test]
    fn test_register_request() {
        let mut form = Form::register();
        for (i, value) in ["ada@example.com ", "ada", "pw1", "pw2"].iter().enumerate() {
            form.fields[i].value = value.to_string();
        }
        let request = form.register_request();
        assert_eq!(request.email, "ada@example.com");
        assert_eq!(request.confirm_password, "pw2");
    }
}
