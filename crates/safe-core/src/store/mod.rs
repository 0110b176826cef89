//! Password verification store and tracked-file registry.
//!
//! The engine only talks to [`PasswordStore`] and [`FileRegistry`]; the CLI
//! decides which implementation backs them.

pub mod memory;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{FileRegistry, PasswordStore};
pub use types::TrackedFile;
