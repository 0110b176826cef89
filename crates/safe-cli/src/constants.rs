//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, used by clap)
/// - 3+: Application-specific errors, one per failure kind
pub mod exit_codes {
    /// General failure without a more specific code.
    pub const GENERAL: i32 = 1;

    /// Source file (or tracked file) not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password, too many attempts).
    pub const AUTH_FAILED: i32 = 5;

    /// Password cannot be used as a key.
    pub const INVALID_PASSWORD: i32 = 6;

    /// Decryption requested on a file without the `.safe` suffix.
    pub const NOT_A_SAFE_FILE: i32 = 7;

    /// Explicit output name violates the naming rules.
    pub const INVALID_TARGET_NAME: i32 = 8;

    /// Output exists and `--overwrite` was not given.
    pub const WOULD_OVERWRITE: i32 = 9;

    /// A file conversion was aborted.
    pub const CONVERSION_FAILED: i32 = 10;

    /// Shell command outside the supported set.
    pub const UNSUPPORTED_COMMAND: i32 = 11;

    /// Password change staged but not fully committed.
    pub const PARTIAL_COMMIT: i32 = 12;

    /// `safe init` has not been run.
    pub const PASSWORD_NOT_SET: i32 = 13;

    /// Store could not be read or written.
    pub const STORE_FAILED: i32 = 14;

    /// Rotation journal could not be read or written.
    pub const JOURNAL_FAILED: i32 = 15;

    /// Filesystem failure.
    pub const IO_FAILED: i32 = 16;
}

/// Environment variable holding the current password.
pub const PASSWORD_ENV: &str = "SAFE_PASSWORD";

/// Environment variable holding the new password for `config --set-password`.
pub const NEW_PASSWORD_ENV: &str = "SAFE_NEW_PASSWORD";

/// Environment variable with the log filter.
pub const LOG_ENV: &str = "SAFE_LOG";

/// Password prompts allowed before giving up in interactive mode.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;
