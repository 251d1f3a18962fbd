//! REST API client for the voice assistant backend.
//!
//! `ApiClient` maps one method to one endpoint and attaches the stored
//! bearer token to every request. Results are handed to `outcome::settle`,
//! which turns a 401 into a cleared session and anything else into a
//! status-bar notice.

pub mod client;
pub mod error;
pub mod outcome;

pub use client::ApiClient;
pub use error::ApiError;
pub use outcome::{settle, ApiOutcome};
