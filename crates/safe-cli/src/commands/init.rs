use safe_core::PasswordStore;

use crate::app::{read_new_password, AppContext};
use crate::constants::PASSWORD_ENV;
use crate::errors::CliError;

/// Set the first password.
pub fn handle_init(ctx: &AppContext) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    if store.is_initialized()? {
        return Err(CliError::invalid_input(
            "A password is already set.\nHint: Run `safe config --set-password` to change it.",
        )
        .into());
    }

    let password = read_new_password(PASSWORD_ENV, "New password", ctx.interactive())?;
    store.set_hash(&password.verification_hash())?;
    tracing::info!(store = %store.path().display(), "password initialized");

    if !ctx.quiet() {
        println!("Password set. Store: {}", store.path().display());
    }
    Ok(())
}
