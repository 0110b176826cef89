use std::path::{Path, PathBuf};

use safe_core::FileRegistry;

use crate::app::AppContext;
use crate::cli::{ListArgs, UntrackArgs};
use crate::errors::CliError;

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let files = store.tracked()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if !ctx.quiet() {
        println!("ADDED_AT | PATH");
    }
    for file in files {
        let missing = if file.path.exists() { "" } else { " (missing)" };
        println!(
            "{} | {}{}",
            file.added_at.format("%Y-%m-%d %H:%M:%S"),
            file.path.display(),
            missing
        );
    }
    Ok(())
}

pub fn handle_untrack(ctx: &AppContext, args: &UntrackArgs) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let path = absolute(&args.file)?;

    if !store.untrack(&path)? {
        return Err(CliError::not_found(
            format!("Not tracked: {}", path.display()),
            "Hint: Run `safe list` to see tracked files.",
        )
        .into());
    }

    if !ctx.quiet() {
        println!("Stopped tracking {}", path.display());
    }
    Ok(())
}

/// Canonical form for existing files; joined onto the working directory otherwise.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
