use crate::orchestrator::{apply_with, ApplyOptions};
use crate::output::ApplyResult;
use crate::preview::{render_diff, should_use_color};
use crate::rule::Rule;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Apply operation - equivalent to `recast apply`
///
/// With `show_diff` the file is read before the rule runs and the result
/// carries a unified diff of the change.
pub fn apply_operation(
    path: &Path,
    rule: &Rule,
    options: &ApplyOptions,
    show_diff: bool,
    use_color: Option<bool>,
) -> Result<ApplyResult> {
    let before = if show_diff {
        Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read {} for diff", path.display()))?,
        )
    } else {
        None
    };

    let report = apply_with(rule, path, options)
        .with_context(|| format!("Failed to apply {} to {}", rule, path.display()))?;

    let diff = before.map(|before| {
        render_diff(path, &before, &report.rewritten, should_use_color(use_color))
    });

    Ok(ApplyResult {
        rule: report.rule,
        path: report.path.display().to_string(),
        source: report.source,
        units: report.units,
        changed_units: report.changed_units,
        replacements: report.replacements,
        written: report.written,
        dry_run: options.dry_run,
        diff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use tempfile::TempDir;

    #[test]
    fn test_apply_operation_with_diff() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("README.md");
        fs::write(&path, "# {{.Name}}\n\nBuilt with web-starter\n").unwrap();
        let rule = Rule::new("name", "{{.Name}}", "acme").with_source(SourceKind::Line.into_source());

        let result =
            apply_operation(&path, &rule, &ApplyOptions::default(), true, Some(false)).unwrap();

        assert_eq!(result.replacements, 1);
        assert!(result.written);
        let diff = result.diff.unwrap();
        assert!(diff.contains("-# {{.Name}}\n+# acme\n"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# acme\n\nBuilt with web-starter\n"
        );
    }

    #[test]
    fn test_apply_operation_error_has_context() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("main.go");
        fs::write(&path, "package main\n").unwrap();
        let rule = Rule::new("unbound", "main", "app");

        let err = apply_operation(&path, &rule, &ApplyOptions::default(), false, None).unwrap_err();

        assert!(err.to_string().starts_with("Failed to apply unbound to"));
        let root = err.root_cause().to_string();
        assert_eq!(root, "the refactor source is not set, not refactoring unbound");
    }
}
