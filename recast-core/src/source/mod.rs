//! Content sources: strategies that stream the transformable units of a file
//! and write the rewritten file back.
//!
//! Every source follows the same handshake. [`ContentSource::initiate`] starts
//! a worker that emits one unit at a time on a rendezvous channel, waits for
//! the replacement of that unit, acknowledges it, and only then moves on.
//! Once the last unit has been acknowledged the unit stream closes and the
//! file is committed exactly once through a temp-file-and-rename swap.

mod go;
mod handshake;
mod line;

pub use go::{CommentSource, ImportPathSource};
pub use handshake::{CycleReport, Handshake, HandshakeOptions, UnitProducer};
pub use line::LineSource;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// A strategy that can enumerate the units of a file and persist replacements.
pub trait ContentSource: fmt::Debug + Send + Sync {
    /// Short identifier used in logs and reports.
    fn kind(&self) -> &'static str;

    /// Begin a streaming cycle for `path`.
    ///
    /// Errors returned here happen before any unit is streamed. Errors that
    /// occur later surface through the returned [`Handshake`].
    fn initiate(&self, path: &Path, options: &HandshakeOptions) -> Result<Handshake>;
}

/// The built-in content sources, as named in manifests and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Go comments, one comment per unit
    Comment,
    /// Go import path literals, quotes included
    #[serde(alias = "import_path", alias = "package")]
    Import,
    /// Plain text lines, terminators excluded
    Line,
}

impl SourceKind {
    pub fn into_source(self) -> Arc<dyn ContentSource> {
        match self {
            Self::Comment => Arc::new(CommentSource::new()),
            Self::Import => Arc::new(ImportPathSource::new()),
            Self::Line => Arc::new(LineSource::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Import => "import",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comment" | "comments" => Ok(Self::Comment),
            "import" | "imports" | "import_path" | "package" => Ok(Self::Import),
            "line" | "lines" | "text" => Ok(Self::Line),
            _ => Err(format!("Invalid content source: {}", s)),
        }
    }
}
