//! Password acquisition and verification with retry logic.

use dialoguer::Password as PasswordPrompt;

use safe_core::crypto::{derive_key, verify_password};
use safe_core::{Password, PasswordStore, SafeError};

use crate::constants::{MAX_PASSWORD_ATTEMPTS, PASSWORD_ENV};
use crate::errors::CliError;

fn env_password(name: &str) -> Option<Password> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Password::new)
}

fn prompt(label: &str, interactive: bool, env_name: &str) -> anyhow::Result<Password> {
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            env_name
        ))
        .into());
    }
    PasswordPrompt::new()
        .with_prompt(label)
        .interact()
        .map(Password::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

fn prompt_confirmed(label: &str, interactive: bool, env_name: &str) -> anyhow::Result<Password> {
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            env_name
        ))
        .into());
    }
    PasswordPrompt::new()
        .with_prompt(label)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map(Password::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Read a password that will become the store's password.
///
/// Taken from `env_name` when set, otherwise prompted twice. The password
/// is rejected up front if it cannot derive a key.
pub fn read_new_password(
    env_name: &str,
    label: &str,
    interactive: bool,
) -> anyhow::Result<Password> {
    let password = match env_password(env_name) {
        Some(password) => password,
        None => prompt_confirmed(label, interactive, env_name)?,
    };
    derive_key(&password)?;
    Ok(password)
}

/// Obtain the current password and verify it against the store.
///
/// `SAFE_PASSWORD` is tried once; interactive prompts get
/// [`MAX_PASSWORD_ATTEMPTS`] tries.
pub fn unlock(store: &dyn PasswordStore, interactive: bool) -> anyhow::Result<Password> {
    if !store.is_initialized()? {
        return Err(SafeError::PasswordNotSet.into());
    }

    if let Some(password) = env_password(PASSWORD_ENV) {
        verify_password(store, &password)?;
        return Ok(password);
    }

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let password = prompt("Password", interactive, PASSWORD_ENV)?;
        match verify_password(store, &password) {
            Ok(()) => return Ok(password),
            Err(SafeError::Authentication) => {
                let remaining = MAX_PASSWORD_ATTEMPTS.saturating_sub(attempts);
                if remaining == 0 {
                    return Err(CliError::auth_failed_with_hint(
                        "Too many failed password attempts.",
                        "Hint: Files encrypted under a forgotten password cannot be recovered.",
                    )
                    .into());
                }
                eprintln!(
                    "Incorrect password. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
}
