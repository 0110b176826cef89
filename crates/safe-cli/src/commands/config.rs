use std::path::{Path, PathBuf};

use safe_core::rotation::{RotationPlan, RotationReport, RotationTransaction};
use safe_core::{FileRegistry, SqliteStore};

use crate::app::{read_new_password, unlock, AppContext};
use crate::cli::ConfigArgs;
use crate::constants::NEW_PASSWORD_ENV;

pub fn handle_config(ctx: &AppContext, args: &ConfigArgs) -> anyhow::Result<()> {
    if args.resume {
        return handle_resume(ctx);
    }
    handle_set_password(ctx, args.staging_dir.as_deref())
}

/// Change the password and re-encrypt every tracked file, all or nothing.
fn handle_set_password(ctx: &AppContext, staging_dir: Option<&Path>) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let journal = ctx.journal_path()?;

    let old_password = unlock(&store, ctx.interactive())?;
    let new_password = read_new_password(NEW_PASSWORD_ENV, "New password", ctx.interactive())?;
    let files = existing_tracked_files(&mut store)?;

    let mut plan = RotationPlan::new(old_password, new_password, files);
    if let Some(dir) = staging_dir {
        plan = plan.with_staging_dir(dir);
    }

    let report = RotationTransaction::new(&mut store, &journal).rotate(&plan)?;
    print_report(ctx, &report, "Password changed");
    Ok(())
}

/// Finish a password change whose commit was interrupted.
fn handle_resume(ctx: &AppContext) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let journal = ctx.journal_path()?;

    match RotationTransaction::new(&mut store, &journal).resume()? {
        Some(report) => print_report(ctx, &report, "Password change completed"),
        None => {
            if !ctx.quiet() {
                println!("No interrupted password change to resume.");
            }
        }
    }
    Ok(())
}

/// Tracked files that still exist; missing ones are untracked with a warning.
fn existing_tracked_files(store: &mut SqliteStore) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for tracked in store.tracked()? {
        if tracked.path.is_file() {
            files.push(tracked.path);
        } else {
            eprintln!(
                "Warning: {} no longer exists; it will no longer be tracked.",
                tracked.path.display()
            );
            store.untrack(&tracked.path)?;
        }
    }
    Ok(files)
}

fn print_report(ctx: &AppContext, report: &RotationReport, headline: &str) {
    for path in &report.degraded {
        eprintln!(
            "Warning: {} was replaced by copy across filesystems (not atomic).",
            path.display()
        );
    }
    if !ctx.quiet() {
        println!(
            "{}; re-encrypted {} file{}.",
            headline,
            report.rotated.len(),
            if report.rotated.len() == 1 { "" } else { "s" }
        );
    }
}
