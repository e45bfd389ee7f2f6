use crate::cancel::CancelToken;
use crate::error::{RefactorError, Result};
use crate::evaluator::Evaluator;
use crate::rule::Rule;
use crate::source::{ContentSource, Handshake, HandshakeOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, debug_span, warn};

/// Options for applying a rule to a file
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Observed by the content source at every suspension point
    pub cancel: CancelToken,
    /// Abort when a single unit round trip takes longer than this
    pub unit_timeout: Option<Duration>,
    /// Compute the rewritten file without writing it
    pub dry_run: bool,
}

impl ApplyOptions {
    fn handshake(&self) -> HandshakeOptions {
        HandshakeOptions {
            cancel: self.cancel.clone(),
            unit_timeout: self.unit_timeout,
            persist: !self.dry_run,
        }
    }
}

/// Outcome of one rule applied to one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub rule: String,
    pub path: PathBuf,
    pub source: String,
    pub units: usize,
    pub changed_units: usize,
    pub replacements: usize,
    pub written: bool,
    /// The file as it would look after the rule, whether or not it was written
    #[serde(skip)]
    pub rewritten: String,
}

/// Apply `rule` to the file at `path`, rewriting it in place.
pub fn apply(rule: &Rule, path: &Path) -> Result<()> {
    apply_with(rule, path, &ApplyOptions::default()).map(|_| ())
}

/// Apply `rule` to the file at `path` and report what changed.
///
/// Configuration problems (no bound source, invalid regex) are detected before
/// the file is opened. The first failing acknowledgment aborts the cycle; the
/// content source then exits without writing anything.
pub fn apply_with(rule: &Rule, path: &Path, options: &ApplyOptions) -> Result<ApplyReport> {
    let source = rule
        .source
        .as_ref()
        .ok_or_else(|| RefactorError::UnboundSource {
            rule: rule.name.clone(),
        })?;
    let mut evaluator = Evaluator::compile(rule)?;

    let span = debug_span!("apply", rule = %rule.name, path = %path.display(), source = source.kind());
    let _guard = span.enter();

    let handshake = source.initiate(path, &options.handshake())?;
    if let Err(err) = drive(&handshake, |unit| evaluator.transform(unit)) {
        warn!(error = %err, "aborting refactor");
        return Err(conclude_failed(handshake, err));
    }
    let cycle = handshake.finish()?;

    debug!(
        units = cycle.units,
        replacements = evaluator.replacements(),
        "rule applied"
    );

    Ok(ApplyReport {
        rule: rule.name.clone(),
        path: path.to_path_buf(),
        source: source.kind().to_string(),
        units: cycle.units,
        changed_units: cycle.changed_units,
        replacements: evaluator.replacements(),
        written: cycle.written,
        rewritten: cycle.rendered,
    })
}

/// Stream every unit `source` finds in `path` without modifying the file.
pub fn read_units(source: &dyn ContentSource, path: &Path, options: &ApplyOptions) -> Result<Vec<String>> {
    let handshake_options = HandshakeOptions {
        persist: false,
        ..options.handshake()
    };
    let handshake = source.initiate(path, &handshake_options)?;

    let mut units = Vec::new();
    let streamed = drive(&handshake, |unit| {
        units.push(unit.to_string());
        unit.to_string()
    });
    if let Err(err) = streamed {
        return Err(conclude_failed(handshake, err));
    }
    handshake.finish()?;

    Ok(units)
}

/// Answer every unit of `handshake` with `transform`, one at a time.
fn drive<F>(handshake: &Handshake, mut transform: F) -> Result<()>
where
    F: FnMut(&str) -> String,
{
    while let Some(unit) = handshake.next_unit() {
        let replacement = transform(&unit);
        handshake.reply(replacement)?;
    }
    Ok(())
}

/// Settle a cycle that failed mid-stream.
///
/// A disconnect means the worker stopped on its own, so its reason (cancel,
/// timeout, read error) is the better error to report.
fn conclude_failed(handshake: Handshake, err: RefactorError) -> RefactorError {
    if matches!(err, RefactorError::Disconnected) {
        return match handshake.finish() {
            Ok(_) => err,
            Err(reason) => reason,
        };
    }
    handshake.abandon();
    err
}
