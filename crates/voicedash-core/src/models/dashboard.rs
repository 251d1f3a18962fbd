use super::{Assistant, Call, PhoneNumber};

/// Number of recent assistants and calls shown on the dashboard
pub const RECENT_LIMIT: usize = 5;

/// Counts and recent items for the landing screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub assistant_count: usize,
    pub call_count: usize,
    pub phone_number_count: usize,
    pub recent_assistants: Vec<Assistant>,
    pub recent_calls: Vec<Call>,
}

impl DashboardSummary {
    pub fn from_parts(
        assistants: Vec<Assistant>,
        calls: Vec<Call>,
        phone_numbers: Vec<PhoneNumber>,
    ) -> Self {
        Self {
            assistant_count: assistants.len(),
            call_count: calls.len(),
            phone_number_count: phone_numbers.len(),
            recent_assistants: assistants.into_iter().take(RECENT_LIMIT).collect(),
            recent_calls: calls.into_iter().take(RECENT_LIMIT).collect(),
        }
    }
}
