pub mod assistants;
pub mod call_logs;
pub mod dashboard;
pub mod phone_numbers;
