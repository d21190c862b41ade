//! Schema document parsing
//!
//! The document parser is the input collaborator of the import pipeline:
//! `parse(text) -> SchemaGraph`. The JSON format defined in `format` is
//! the only dialect shipped.

mod errors;
mod format;
mod parser;

pub use errors::{ParseError, ParseResult};
pub use format::{
    ClassDocument, ClassKindDocument, ConstraintDocument, EnumerationDocument, EnumeratorDocument,
    PropertyDocument, PropertyKindDocument, RelationshipDocument, SchemaDocument,
};
pub use parser::{parse_multiplicity, DocumentParser, JsonDocumentParser};
