//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Frame layout, entry screen and dialogs
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `tabs`: Per-screen content (dashboard, assistants, phone numbers, call logs)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
