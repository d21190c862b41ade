//! Mapping errors

use thiserror::Error;

/// The allocator could not derive a consistent mapping for a class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Mapping conflict on class {class}: {reason}")]
pub struct MappingConflict {
    pub class: String,
    pub reason: String,
}

impl MappingConflict {
    pub fn new(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            reason: reason.into(),
        }
    }
}
