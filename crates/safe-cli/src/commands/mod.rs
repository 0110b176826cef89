//! Command handlers, one module per subcommand family.

pub mod config;
pub mod convert;
pub mod files;
pub mod init;
pub mod misc;
pub mod shell;
