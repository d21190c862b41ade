//! Change validation
//!
//! The rule table deciding whether a diff is a legal evolution of the
//! persisted schema. Rule names are stable strings (see `rules`) so that
//! callers and tests can match on them.
//!
//! The validator is pure: it reads the old and new graphs, the persisted
//! layout and an `InstanceProbe`, and never touches the store.

mod change_validator;
mod context;
pub mod rules;

pub use change_validator::ChangeValidator;
pub use context::{InstanceProbe, NoInstances, ValidatedChange, ValidationContext};
pub use rules::{RejectedChanges, RuleGate, RuleViolation};
