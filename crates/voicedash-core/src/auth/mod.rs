//! Authentication module for the dashboard session.
//!
//! This module provides:
//! - `Credential`: a bearer token plus its decoded claims
//! - `TokenStore`: client-local persistence for the token (file, keychain
//!   or memory)
//! - `Session`: the session context (login, logout, startup restore,
//!   expiry checks)
//! - `guard`: the route guard deciding which screens may render
//!
//! The token is stored under a single fixed key and expiry is checked
//! lazily whenever the session is asked.

pub mod error;
pub mod guard;
pub mod session;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use guard::{guard, GuardDecision, Route};
pub use session::Session;
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use token::{Claims, Credential};
