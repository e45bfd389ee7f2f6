use crate::error::{RefactorError, Result};
use crate::orchestrator::{apply_with, ApplyOptions, ApplyReport};
use crate::rule::Rule;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info_span};

/// A template file plus the rules that turn its copy into project code.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Directory holding the template
    pub dir: PathBuf,
    pub file_name: String,
    /// Sub-directory of the destination the copy lands in
    pub relative_destination: Option<PathBuf>,
    pub rules: Vec<Rule>,
}

/// A template copied into its destination and refactored.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub template: PathBuf,
    pub destination: PathBuf,
    pub applied: Vec<ApplyReport>,
}

impl TemplateFile {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            relative_destination: None,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_relative_destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.relative_destination = Some(dir.into());
        self
    }

    /// Full path of the template.
    pub fn name(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Directory the copy is written to when generating under `dst`.
    pub fn destination_dir(&self, dst: &Path) -> PathBuf {
        match &self.relative_destination {
            Some(relative) => dst.join(relative),
            None => dst.to_path_buf(),
        }
    }

    /// Copy the template under `dst` and apply every rule to the copy.
    ///
    /// Returns the path of the generated file.
    pub fn generate(&self, dst: &Path) -> Result<PathBuf> {
        self.generate_with(dst, &ApplyOptions::default())
            .map(|generated| generated.destination)
    }

    /// Like [`TemplateFile::generate`], reporting what each rule changed.
    ///
    /// Rules run in order against the copy. The first failing rule stops the
    /// rest; rules that already ran stay applied.
    pub fn generate_with(&self, dst: &Path, options: &ApplyOptions) -> Result<GeneratedFile> {
        let span = info_span!("generate", template = %self.name().display());
        let _guard = span.enter();

        if options.cancel.is_cancelled() {
            return Err(RefactorError::Cancelled);
        }

        let destination = self.copy(dst).inspect_err(|err| {
            error!(error = %err, "failed to copy template");
        })?;

        let mut applied = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let report = apply_with(rule, &destination, options).inspect_err(|err| {
                error!(rule = %rule, destination = %destination.display(), error = %err, "rule failed");
            })?;
            applied.push(report);
        }

        Ok(GeneratedFile {
            template: self.name(),
            destination,
            applied,
        })
    }

    /// Copy the template byte for byte into the destination directory,
    /// creating it as needed. Returns the path of the copy.
    pub fn copy(&self, dst: &Path) -> Result<PathBuf> {
        let source = self.name();

        // fs::metadata follows symlinks, so a link to a regular file is accepted
        let metadata = fs::metadata(&source).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                RefactorError::TemplateMissing {
                    path: source.clone(),
                }
            } else {
                RefactorError::read(&source, e)
            }
        })?;
        if !metadata.is_file() {
            return Err(RefactorError::NotRegularFile { path: source });
        }

        let dir = self.destination_dir(dst);
        fs::create_dir_all(&dir).map_err(|e| RefactorError::CreateDestination {
            path: dir.clone(),
            source: e,
        })?;

        let target = dir.join(&self.file_name);
        if is_same_file(&source, &target) {
            return Err(RefactorError::SameFile { path: source });
        }
        fs::copy(&source, &target).map_err(|e| RefactorError::Copy {
            from: source.clone(),
            to: target.clone(),
            source: e,
        })?;

        debug!(from = %source.display(), to = %target.display(), "copied template");
        Ok(target)
    }
}

/// fs::copy onto its own source truncates it to nothing
fn is_same_file(source: &Path, target: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

/// Every template of a project and where the generated files go.
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    pub destination_root: PathBuf,
    pub files: Vec<TemplateFile>,
}

/// Result of generating one template file.
#[derive(Debug)]
pub struct FileOutcome {
    pub template: PathBuf,
    pub result: Result<GeneratedFile>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl GeneratorConfig {
    pub fn new(destination_root: impl Into<PathBuf>) -> Self {
        Self {
            destination_root: destination_root.into(),
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: TemplateFile) -> Self {
        self.files.push(file);
        self
    }

    /// Generate every template file concurrently.
    ///
    /// Files are independent: one failing file does not stop the others.
    /// Once `options.cancel` fires, files not yet started fail with
    /// [`RefactorError::Cancelled`] without being copied. Outcomes come back
    /// in template order.
    pub fn generate_all(&self, options: &ApplyOptions) -> Vec<FileOutcome> {
        self.files
            .par_iter()
            .map(|file| FileOutcome {
                template: file.name(),
                result: file.generate_with(&self.destination_root, options),
            })
            .collect()
    }
}
