use safe_core::ShellCommand;

use crate::app::{unlock, AppContext};
use crate::cli::ShellArgs;
use crate::constants::exit_codes;

pub fn handle_shell(ctx: &AppContext, args: &ShellArgs) -> anyhow::Result<()> {
    // Refuse unsupported programs before asking for a password.
    args.command.parse::<ShellCommand>()?;

    let store = ctx.open_store()?;
    let password = unlock(&store, ctx.interactive())?;
    let bridge = ctx.shell_bridge()?;

    let outcome = bridge.run(&password, &args.file, &args.command, &args.args)?;
    drop(password);

    if outcome.reencrypted && !ctx.quiet() {
        eprintln!("Saved changes to {}", args.file.display());
    }
    // Cleanup is done; honor the termination that was deferred.
    if let Some(signal) = outcome.signal {
        std::process::exit(128 + signal);
    }
    if !outcome.status.success() {
        std::process::exit(outcome.status.code().unwrap_or(exit_codes::GENERAL));
    }
    Ok(())
}
