use anyhow::Result;
use recast_core::{apply_operation, ApplyOptions, OutputFormatter, Rule, SourceKind};
use std::path::Path;

use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
#[allow(clippy::fn_params_excessive_bools)]
pub fn handle_apply(
    file: &Path,
    source: SourceKind,
    find: &str,
    replace: &str,
    regex: bool,
    max: i64,
    show_diff: bool,
    options: &ApplyOptions,
    use_color: bool,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let rule = Rule::new(format!("{source} rule"), find, replace)
        .regex(regex)
        .max_occurrences(max)
        .with_source(source.into_source());

    let result = apply_operation(file, &rule, options, show_diff, Some(use_color))?;

    match output {
        OutputFormat::Json => {
            print!("{}", result.format_json());
        },
        OutputFormat::Summary => {
            if !quiet {
                print!("{}", result.format_summary());
            }
        },
    }

    Ok(())
}
