//! Per-import policy

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Turns every Major-gated change into a version error, even when the
    /// read version was bumped.
    #[serde(default)]
    pub disallow_major_schema_upgrade: bool,
}

impl ImportOptions {
    pub fn disallowing_major_upgrade() -> Self {
        Self {
            disallow_major_schema_upgrade: true,
        }
    }
}
