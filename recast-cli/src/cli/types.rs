use clap::ValueEnum;
use recast_core::SourceKind;

/// Content source a rule runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Go comments, delimiters included
    Comment,
    /// Go import paths, quotes included
    #[value(alias = "package")]
    Import,
    /// Plain text lines
    Line,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Comment => Self::Comment,
            SourceArg::Import => Self::Import,
            SourceArg::Line => Self::Line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for recast_core::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}
