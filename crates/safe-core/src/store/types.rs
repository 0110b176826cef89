//! Store data types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A SafeFile registered for password rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Absolute path of the SafeFile
    pub path: PathBuf,

    /// When the file was first tracked
    pub added_at: DateTime<Utc>,
}
