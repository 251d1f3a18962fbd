//! Conversation log shaping for the call-log screen.
//!
//! The backend groups transcripts by assistant name, one list of messages
//! per call. These helpers produce a single time-ordered timeline per
//! assistant and a few counts for the header. Everything here is pure.

use std::collections::BTreeMap;

use crate::models::{Conversation, ConversationLog, Message, Role};

/// Merge an assistant's conversations into one timeline ordered by message
/// time. Messages without a time sort first; ties keep their original order.
pub fn flatten_conversations(conversations: &[Conversation]) -> Vec<Message> {
    let mut messages: Vec<Message> = conversations.iter().flatten().cloned().collect();
    // sort_by is stable
    messages.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    messages
}

/// Flatten every assistant's conversations. Assistants with no
/// conversations map to an empty timeline.
pub fn flatten_log(log: &ConversationLog) -> BTreeMap<String, Vec<Message>> {
    log.iter()
        .map(|(name, conversations)| (name.clone(), flatten_conversations(conversations)))
        .collect()
}

/// Earliest and latest known message time in a conversation.
pub fn conversation_span(conversation: &[Message]) -> Option<(f64, f64)> {
    conversation
        .iter()
        .filter_map(|m| m.time)
        .fold(None, |span, t| match span {
            None => Some((t, t)),
            Some((first, last)) => Some((first.min(t), last.max(t))),
        })
}

/// Index of the conversation that ended last. Conversations without any
/// timestamps only win when nothing else has one.
pub fn latest_conversation(conversations: &[Conversation]) -> Option<usize> {
    conversations
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            let end_a = conversation_span(a).map(|(_, end)| end).unwrap_or(f64::MIN);
            let end_b = conversation_span(b).map(|(_, end)| end).unwrap_or(f64::MIN);
            end_a.total_cmp(&end_b)
        })
        .map(|(index, _)| index)
}

/// Counts shown above the call-log panes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Assistants with at least one conversation
    pub active_assistants: usize,
    pub total_conversations: usize,
    pub total_messages: usize,
    pub user_messages: usize,
}

impl LogStats {
    pub fn from_log(log: &ConversationLog) -> Self {
        let mut stats = LogStats::default();
        for conversations in log.values() {
            if !conversations.is_empty() {
                stats.active_assistants += 1;
            }
            stats.total_conversations += conversations.len();
            for message in conversations.iter().flatten() {
                stats.total_messages += 1;
                if message.role == Role::User {
                    stats.user_messages += 1;
                }
            }
        }
        stats
    }
}
