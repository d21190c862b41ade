//! Schema version triple and document dialect version
//!
//! A schema carries two independent versions:
//! - the semantic triple `Read.Write.Minor` chosen by the schema author
//! - the dialect version of the document format it was written in
//!
//! Both are serialized as dotted strings (`"01.00.02"`, `"3.2"`).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic schema version `Read.Write.Minor`.
///
/// `read` is the major digit: bumping it signals a change that older
/// readers cannot understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    pub read: u32,
    pub write: u32,
    pub minor: u32,
}

impl SchemaVersion {
    pub const fn new(read: u32, write: u32, minor: u32) -> Self {
        Self { read, write, minor }
    }

    fn as_tuple(&self) -> (u32, u32, u32) {
        (self.read, self.write, self.minor)
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_tuple().cmp(&other.as_tuple())
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}.{:02}", self.read, self.write, self.minor)
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    /// Accepts `R.W.m` and the short form `R.m` (write digit zero).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = parse_digits(s)?;
        match digits.as_slice() {
            [read, minor] => Ok(Self::new(*read, 0, *minor)),
            [read, write, minor] => Ok(Self::new(*read, *write, *minor)),
            _ => Err(format!("invalid schema version '{}': expected R.W.m", s)),
        }
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}

/// Version of the document format a schema was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DialectVersion {
    pub major: u32,
    pub minor: u32,
}

impl DialectVersion {
    /// First dialect in which enumerators carry their own names.
    pub const NAMED_ENUMERATORS: DialectVersion = DialectVersion::new(3, 2);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for DialectVersion {
    fn default() -> Self {
        Self::NAMED_ENUMERATORS
    }
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for DialectVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_digits(s)?.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor)),
            [major] => Ok(Self::new(*major, 0)),
            _ => Err(format!("invalid dialect version '{}': expected M.m", s)),
        }
    }
}

impl TryFrom<String> for DialectVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DialectVersion> for String {
    fn from(version: DialectVersion) -> Self {
        version.to_string()
    }
}

fn parse_digits(s: &str) -> Result<Vec<u32>, String> {
    s.trim()
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid version component '{}' in '{}'", part, s))
        })
        .collect()
}
