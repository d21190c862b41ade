//! Document parse errors

use thiserror::Error;

/// Result type for document parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while turning a schema document into a graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Malformed schema document: {0}")]
    Malformed(String),

    #[error("Duplicate {kind} '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Unknown class '{name}' referenced from {referenced_from}")]
    UnknownClass { name: String, referenced_from: String },

    #[error("Property {property}: unknown type '{type_name}'")]
    UnknownType { property: String, type_name: String },

    #[error("Property {property}: {reason}")]
    InvalidProperty { property: String, reason: String },

    #[error("Class {class}: {reason}")]
    InvalidClass { class: String, reason: String },

    #[error("Invalid multiplicity '{0}'")]
    InvalidMultiplicity(String),

    #[error("Enumeration {enumeration}: {reason}")]
    InvalidEnumeration { enumeration: String, reason: String },

    #[error("Inheritance cycle through class '{0}'")]
    InheritanceCycle(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::Malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_element() {
        let err = ParseError::UnknownClass {
            name: "Missing".into(),
            referenced_from: "Foo base classes".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Missing"));
        assert!(text.contains("Foo"));
    }
}
