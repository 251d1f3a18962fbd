//! Data models for backend resources.
//!
//! - `Assistant`, `AssistantDraft`, `AssistantPatch`: voice assistants
//! - `PhoneNumber`, `Provider`: numbers attached to assistants
//! - `Call`: individual calls
//! - `DashboardSummary`: counts and recent items for the landing screen
//! - `Message`, `Conversation`, `ConversationLog`: transcripts grouped by
//!   assistant name
//! - Login/registration request and response bodies
//!
//! The client never treats these as authoritative; they are the last
//! copy fetched from the backend.

pub mod account;
pub mod assistant;
pub mod call;
pub mod conversation;
pub mod dashboard;
pub mod phone_number;

pub use account::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse};
pub use assistant::{upsert_assistant, Assistant, AssistantDraft, AssistantPatch, AssistantVoice};
pub use call::Call;
pub use conversation::{Conversation, ConversationLog, Message, Role};
pub use dashboard::DashboardSummary;
pub use phone_number::{upsert_phone_number, PhoneNumber, PhoneNumberDraft, PhoneNumberPatch, Provider};
