#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cancel;
pub mod commit;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod operations;
pub mod orchestrator;
pub mod output;
pub mod preview;
pub mod rule;
pub mod source;

pub use cancel::CancelToken;
pub use commit::write_atomic;
pub use config::Manifest;
pub use error::{RefactorError, Result};
pub use evaluator::Evaluator;
pub use generator::{FileOutcome, GeneratedFile, GeneratorConfig, TemplateFile};
pub use operations::{apply_operation, generate_operation, units_operation};
pub use orchestrator::{apply, apply_with, read_units, ApplyOptions, ApplyReport};
pub use output::{
    ApplyResult, FileResult, GenerateResult, OutputFormat, OutputFormatter, UnitsResult,
};
pub use preview::{render_diff, should_use_color};
pub use rule::Rule;
pub use source::{
    CommentSource, ContentSource, CycleReport, Handshake, HandshakeOptions, ImportPathSource,
    LineSource, SourceKind, UnitProducer,
};
