//! Application-level utilities for the safe CLI.
//!
//! This module provides:
//! - Path resolution for the config, store and rotation journal
//! - Password acquisition and verification with retry logic

mod context;
mod password;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use password::{read_new_password, unlock};
