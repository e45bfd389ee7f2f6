use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::{OutputFormat, SourceArg};

/// Stream comments, imports and lines of template files through find/replace rules
#[derive(Parser, Debug)]
#[command(name = "recast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Run as if started in <path> instead of the current working directory
    #[arg(short = 'C', global = true, value_name = "PATH")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply one find/replace rule to a file in place
    Apply {
        /// File to rewrite
        file: PathBuf,

        /// Which units of the file the rule sees
        #[arg(long, value_enum)]
        source: SourceArg,

        /// Text (or pattern with --regex) to find in each unit
        #[arg(long)]
        find: String,

        /// Replacement, inserted literally
        #[arg(long, default_value = "")]
        replace: String,

        /// Treat --find as a regular expression
        #[arg(long)]
        regex: bool,

        /// Replace at most N occurrences across the whole file (0 = all)
        #[arg(long, value_name = "N", default_value_t = 0)]
        max: i64,

        /// Show what would change without writing the file
        #[arg(long)]
        dry_run: bool,

        /// Print a unified diff of the change
        #[arg(long)]
        diff: bool,

        /// Abort if a single unit takes longer than this
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },

    /// List the units a content source streams for a file, without writing it
    Units {
        /// File to read
        file: PathBuf,

        /// Which units to list
        #[arg(long, value_enum)]
        source: SourceArg,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,
    },

    /// Copy every template listed in a manifest and apply its rules
    Generate {
        /// Project manifest
        #[arg(long, default_value = recast_core::config::FILE_NAME)]
        manifest: PathBuf,

        /// Override the manifest's destination directory
        #[arg(long, value_name = "DIR")]
        destination: Option<PathBuf>,

        /// Abort a rule if a single unit takes longer than this
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Output format for machine consumption
        #[arg(long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress all output
        #[arg(long)]
        quiet: bool,
    },
}
