//! ImportScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` on `complete()`
//! - Logs `{name}_FAILED` on `fail()`
//! - Logs `{name}_ERROR` on drop when neither was called

use std::time::Instant;
use tracing::{error, info, warn};

/// A scope that logs the lifecycle of one named operation.
///
/// ```ignore
/// let scope = ImportScope::new("IMPORT", "Plant");
/// // ... do work ...
/// scope.complete(); // logs IMPORT_COMPLETE
/// ```
pub struct ImportScope {
    name: &'static str,
    subject: String,
    started: Instant,
    finished: bool,
}

impl ImportScope {
    /// Logs `{name}_BEGIN` immediately.
    pub fn new(name: &'static str, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        info!(event = %format!("{}_BEGIN", name), subject = %subject);
        Self {
            name,
            subject,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn complete(mut self) {
        self.finished = true;
        info!(
            event = %format!("{}_COMPLETE", self.name),
            subject = %self.subject,
            elapsed_ms = self.elapsed_ms()
        );
    }

    pub fn complete_with(mut self, detail: &str) {
        self.finished = true;
        info!(
            event = %format!("{}_COMPLETE", self.name),
            subject = %self.subject,
            elapsed_ms = self.elapsed_ms(),
            detail
        );
    }

    pub fn fail(mut self, code: &str, reason: &str) {
        self.finished = true;
        warn!(
            event = %format!("{}_FAILED", self.name),
            subject = %self.subject,
            code,
            reason
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl Drop for ImportScope {
    fn drop(&mut self) {
        if !self.finished {
            error!(
                event = %format!("{}_ERROR", self.name),
                subject = %self.subject,
                reason = "scope dropped without completion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ImportScope::new("TEST", "Plant");
        assert!(!scope.is_finished());
        scope.complete();
    }

    #[test]
    fn test_scope_complete_with_detail() {
        let scope = ImportScope::new("TEST", "Plant");
        scope.complete_with("added=1 deleted=0 modified=2");
    }

    #[test]
    fn test_scope_fail() {
        let scope = ImportScope::new("TEST", "Plant");
        scope.fail("SCHEMAMAP_VERSION", "version not incremented");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ImportScope::new("TEST", "Plant");
        drop(scope);
    }
}
