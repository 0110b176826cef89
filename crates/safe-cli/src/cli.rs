use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use clap_complete::Shell;

use safe_core::VERSION;

/// safe - password-based file encryption with line-level tokens
#[derive(Parser)]
#[command(name = "safe")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the password/tracking store
    #[arg(short, long, global = true, env = "SAFE_STORE")]
    pub store: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, env = "SAFE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Arguments for the `convert` command
#[derive(Args)]
#[command(group(ArgGroup::new("direction").args(["encrypt", "decrypt"])))]
pub struct ConvertArgs {
    /// File to encrypt or decrypt (direction inferred from the .safe suffix)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Force encryption
    #[arg(short, long)]
    pub encrypt: bool,

    /// Force decryption
    #[arg(short, long)]
    pub decrypt: bool,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Output file name (placed next to FILE unless it contains a directory)
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<PathBuf>,
}

/// Arguments for the `config` command
#[derive(Args)]
#[command(group(ArgGroup::new("action").args(["set_password", "resume"]).required(true)))]
pub struct ConfigArgs {
    /// Change the password and re-encrypt every tracked file
    #[arg(long)]
    pub set_password: bool,

    /// Finish an interrupted password change
    #[arg(long)]
    pub resume: bool,

    /// Directory for staged files during a password change
    #[arg(long, value_name = "DIR", requires = "set_password")]
    pub staging_dir: Option<PathBuf>,
}

/// Arguments for the `shell` command
#[derive(Args)]
pub struct ShellArgs {
    /// SafeFile to open
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Program to run (cat, grep, less, nano, vi, vim)
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub command: String,

    /// Arguments passed to the program before the file path
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `untrack` command
#[derive(Args)]
pub struct UntrackArgs {
    /// SafeFile to stop tracking
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set the first password
    Init,

    /// Encrypt a file to FILE.safe, or decrypt FILE.safe back to FILE
    Convert(ConvertArgs),

    /// Change the password
    Config(ConfigArgs),

    /// Run a program on the decrypted content of a SafeFile
    Shell(ShellArgs),

    /// List tracked SafeFiles
    List(ListArgs),

    /// Stop tracking a SafeFile
    Untrack(UntrackArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
