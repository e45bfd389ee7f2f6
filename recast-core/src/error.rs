use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while refactoring or generating a file.
///
/// Variants fall into four groups: configuration errors (the rule itself is
/// unusable), input errors (the file cannot be read, parsed or copied),
/// write-back errors (the commit failed) and protocol errors (the handshake
/// between a content source and its consumer was interrupted).
#[derive(Debug, thiserror::Error)]
pub enum RefactorError {
    #[error("the refactor source is not set, not refactoring {rule}")]
    UnboundSource { rule: String },

    #[error("invalid regex for rule {rule}: {source}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} looks like a binary file", path.display())]
    BinaryContent { path: PathBuf },

    #[error("template file {} does not exist", path.display())]
    TemplateMissing { path: PathBuf },

    #[error("{} is not a regular file", path.display())]
    NotRegularFile { path: PathBuf },

    #[error("failed to create destination directory {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template {} would be copied onto itself", path.display())]
    SameFile { path: PathBuf },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    WriteBack {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("content source rejected a unit: {message}")]
    Unit { message: String },

    #[error("refactoring was cancelled")]
    Cancelled,

    #[error("no replacement arrived within {after:?}")]
    TimedOut { after: Duration },

    #[error("the content source stopped before the cycle completed")]
    Disconnected,
}

impl RefactorError {
    /// Configuration errors are never worth retrying: the rule is unusable as written.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnboundSource { .. } | Self::InvalidRegex { .. })
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_back(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteBack {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RefactorError>;
