//! Core library for voicedash.
//!
//! Holds everything that is not terminal rendering:
//!
//! - `auth`: bearer token decoding, token storage, the session context and
//!   the route guard
//! - `api`: HTTP client for the assistant backend and result settling
//! - `models`: assistants, phone numbers, calls and conversation logs
//! - `logs`: conversation log flattening and statistics
//! - `config`: on-disk configuration and directory resolution
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod logs;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiOutcome};
pub use auth::{Route, Session};
pub use config::Config;
