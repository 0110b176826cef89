//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use safe_core::{ErrorKind, SafeError};

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (tracked file, etc.)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong password, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }
}

/// Exit code for a core error kind.
pub fn safe_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidPassword => exit_codes::INVALID_PASSWORD,
        ErrorKind::Authentication => exit_codes::AUTH_FAILED,
        ErrorKind::FileNotFound => exit_codes::NOT_FOUND,
        ErrorKind::NotASafeFile => exit_codes::NOT_A_SAFE_FILE,
        ErrorKind::InvalidTargetName => exit_codes::INVALID_TARGET_NAME,
        ErrorKind::WouldOverwrite => exit_codes::WOULD_OVERWRITE,
        ErrorKind::ConversionFailed => exit_codes::CONVERSION_FAILED,
        ErrorKind::UnsupportedCommand => exit_codes::UNSUPPORTED_COMMAND,
        ErrorKind::PartialCommit => exit_codes::PARTIAL_COMMIT,
        ErrorKind::PasswordNotSet => exit_codes::PASSWORD_NOT_SET,
        ErrorKind::Store => exit_codes::STORE_FAILED,
        ErrorKind::Journal => exit_codes::JOURNAL_FAILED,
        ErrorKind::Io => exit_codes::IO_FAILED,
    }
}

/// Exit code for any error returned by a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(safe_err) = err.downcast_ref::<SafeError>() {
        return safe_exit_code(safe_err.kind());
    }
    exit_codes::GENERAL
}

/// Follow-up advice for errors the user can act on.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let safe_err = err.downcast_ref::<SafeError>()?;
    match safe_err.root_cause().kind() {
        ErrorKind::PasswordNotSet => Some("Hint: Run `safe init` to set a password."),
        ErrorKind::PartialCommit => {
            Some("Hint: Run `safe config --resume` to finish the password change.")
        }
        ErrorKind::WouldOverwrite => Some("Hint: Pass --overwrite to replace it."),
        ErrorKind::InvalidPassword => {
            Some("Hint: Passwords may contain letters, digits, '-' and '_'.")
        }
        ErrorKind::UnsupportedCommand => {
            Some("Hint: Supported commands are cat, grep, less, nano, vi and vim.")
        }
        _ => None,
    }
}
