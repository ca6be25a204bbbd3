use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Location of a markup node inside a source file.
///
/// Lines are 1-indexed, columns 0-indexed (column of the `<`). A location
/// identifies a node only against a specific snapshot of the file's text;
/// it goes stale as soon as the file is edited elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// Canonical string encoding of a SourceLocation: `"<file>:<line>:<column>"`.
///
/// This string is the only artifact that crosses the boundary between the
/// host and the preview runtime. The preview treats it as opaque and only
/// echoes it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementIdentity(String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("Malformed element identity: {0:?}")]
    Malformed(String),
}

impl ElementIdentity {
    /// Encode a location. `format` and `parse` are strict inverses.
    pub fn format(loc: &SourceLocation) -> Self {
        Self(format!("{}:{}:{}", loc.file, loc.line, loc.column))
    }

    /// Decode back to a SourceLocation.
    ///
    /// The file path itself may contain `:` (e.g. Windows drive letters),
    /// so the line/column are taken from the last two segments.
    pub fn parse(&self) -> Result<SourceLocation, IdentityError> {
        let malformed = || IdentityError::Malformed(self.0.clone());

        let (rest, column) = self.0.rsplit_once(':').ok_or_else(malformed)?;
        let (file, line) = rest.rsplit_once(':').ok_or_else(malformed)?;

        if file.is_empty() {
            return Err(malformed());
        }

        let line: u32 = line.parse().map_err(|_| malformed())?;
        let column: u32 = column.parse().map_err(|_| malformed())?;

        Ok(SourceLocation {
            file: file.to_string(),
            line,
            column,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ElementIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ElementIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
