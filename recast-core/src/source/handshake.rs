use crate::cancel::CancelToken;
use crate::commit::write_atomic;
use crate::error::{RefactorError, Result};
use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The in-memory side of a content source for one cycle.
///
/// A producer hands out units in document order, takes back one replacement
/// per unit, and finally renders the whole rewritten file.
pub trait UnitProducer: Send + 'static {
    /// Next unit, or `None` once the file is exhausted.
    fn next_unit(&mut self) -> Result<Option<String>>;

    /// Replacement for the unit most recently returned by `next_unit`.
    fn accept(&mut self, replacement: String) -> Result<()>;

    /// Render the rewritten file after every unit has been replaced.
    fn finish(self) -> Result<String>;
}

/// Knobs for one streaming cycle.
#[derive(Debug, Clone)]
pub struct HandshakeOptions {
    pub cancel: CancelToken,
    /// Longest the worker stays parked on the consumer, at any step of a
    /// unit, before giving up.
    pub unit_timeout: Option<Duration>,
    /// When false the rewritten file is rendered but never written to disk.
    pub persist: bool,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            cancel: CancelToken::new(),
            unit_timeout: None,
            persist: true,
        }
    }
}

/// What a completed cycle produced.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub units: usize,
    pub changed_units: usize,
    pub written: bool,
    pub rendered: String,
}

/// Consumer end of a running cycle.
///
/// Units arrive on [`Handshake::units`]; each must be answered with exactly
/// one replacement on [`Handshake::replacements`] followed by one read of
/// [`Handshake::acks`]. All three channels are rendezvous channels, so at most
/// one unit is ever in flight. Dropping the handshake disconnects the worker,
/// which then exits without writing.
#[derive(Debug)]
pub struct Handshake {
    units: Receiver<String>,
    replacements: Sender<String>,
    acks: Receiver<Result<()>>,
    worker: JoinHandle<Result<CycleReport>>,
}

impl Handshake {
    /// Start a worker thread that streams `producer`'s units for `path`.
    pub fn spawn<P: UnitProducer>(path: &Path, producer: P, options: &HandshakeOptions) -> Self {
        let (units_tx, units_rx) = bounded(0);
        let (replacements_tx, replacements_rx) = bounded(0);
        let (acks_tx, acks_rx) = bounded(0);

        let worker = Worker {
            path: path.to_path_buf(),
            units: units_tx,
            replacements: replacements_rx,
            acks: acks_tx,
            options: options.clone(),
        };
        let handle = thread::spawn(move || worker.run(producer));

        Self {
            units: units_rx,
            replacements: replacements_tx,
            acks: acks_rx,
            worker: handle,
        }
    }

    pub fn units(&self) -> &Receiver<String> {
        &self.units
    }

    pub fn replacements(&self) -> &Sender<String> {
        &self.replacements
    }

    pub fn acks(&self) -> &Receiver<Result<()>> {
        &self.acks
    }

    /// Block for the next unit. `None` means the stream is closed.
    pub fn next_unit(&self) -> Option<String> {
        self.units.recv().ok()
    }

    /// Send the replacement for the current unit and wait for its acknowledgment.
    pub fn reply(&self, replacement: String) -> Result<()> {
        self.replacements
            .send(replacement)
            .map_err(|_| RefactorError::Disconnected)?;
        self.acks.recv().map_err(|_| RefactorError::Disconnected)?
    }

    /// Wait for the worker to commit and return its outcome.
    pub fn finish(self) -> Result<CycleReport> {
        let Self {
            units,
            replacements,
            acks,
            worker,
        } = self;
        drop((units, replacements, acks));
        worker.join().map_err(|_| RefactorError::Disconnected)?
    }

    /// Stop consuming and wait for the worker to exit without writing.
    pub fn abandon(self) {
        if let Err(err) = self.finish() {
            debug!(error = %err, "abandoned cycle");
        }
    }
}

struct Worker {
    path: PathBuf,
    units: Sender<String>,
    replacements: Receiver<String>,
    acks: Sender<Result<()>>,
    options: HandshakeOptions,
}

impl Worker {
    fn run<P: UnitProducer>(self, mut producer: P) -> Result<CycleReport> {
        let cancel = self.options.cancel.signal();
        let mut report = CycleReport::default();

        while let Some(unit) = producer.next_unit()? {
            let original = unit.clone();

            select! {
                send(self.units, unit) -> sent => sent.map_err(|_| self.disconnected())?,
                recv(cancel) -> _ => return Err(self.cancelled()),
                recv(self.deadline()) -> _ => return Err(self.timed_out("unit to be taken")),
            }

            let replacement = select! {
                recv(self.replacements) -> msg => msg.map_err(|_| self.disconnected())?,
                recv(cancel) -> _ => return Err(self.cancelled()),
                recv(self.deadline()) -> _ => return Err(self.timed_out("replacement")),
            };

            if replacement != original {
                report.changed_units += 1;
            }
            report.units += 1;

            match producer.accept(replacement) {
                Ok(()) => select! {
                    send(self.acks, Ok(())) -> sent => sent.map_err(|_| self.disconnected())?,
                    recv(cancel) -> _ => return Err(self.cancelled()),
                    recv(self.deadline()) -> _ => return Err(self.timed_out("ack to be read")),
                },
                Err(err) => {
                    let message = err.to_string();
                    warn!(path = %self.path.display(), unit = report.units, %message, "unit rejected");
                    // The consumer may already be gone; the cycle aborts either way
                    let _ = self.acks.send(Err(err));
                    return Err(RefactorError::Unit { message });
                },
            }
        }

        let Self {
            path,
            units,
            options,
            ..
        } = self;
        drop(units);

        if options.cancel.is_cancelled() {
            return Err(RefactorError::Cancelled);
        }

        report.rendered = producer.finish()?;
        if options.persist {
            write_atomic(&path, report.rendered.as_bytes())?;
            report.written = true;
        }

        info!(
            path = %path.display(),
            units = report.units,
            changed = report.changed_units,
            written = report.written,
            "cycle complete"
        );
        Ok(report)
    }

    /// Fires once the unit timeout elapses; never fires without one.
    fn deadline(&self) -> Receiver<Instant> {
        self.options.unit_timeout.map_or_else(never, after)
    }

    fn timed_out(&self, waiting_for: &str) -> RefactorError {
        let after = self.options.unit_timeout.unwrap_or_default();
        warn!(path = %self.path.display(), ?after, waiting_for, "timed out");
        RefactorError::TimedOut { after }
    }

    fn disconnected(&self) -> RefactorError {
        if self.options.cancel.is_cancelled() {
            return self.cancelled();
        }
        debug!(path = %self.path.display(), "consumer went away");
        RefactorError::Disconnected
    }

    fn cancelled(&self) -> RefactorError {
        debug!(path = %self.path.display(), "cycle cancelled");
        RefactorError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Producer over a fixed list of words joined by spaces
    struct Words {
        words: Vec<String>,
        next: usize,
        out: Vec<String>,
    }

    impl Words {
        fn new(words: &[&str]) -> Self {
            Self {
                words: words.iter().map(|w| (*w).to_string()).collect(),
                next: 0,
                out: Vec::new(),
            }
        }
    }

    impl UnitProducer for Words {
        fn next_unit(&mut self) -> Result<Option<String>> {
            let unit = self.words.get(self.next).cloned();
            self.next += 1;
            Ok(unit)
        }

        fn accept(&mut self, replacement: String) -> Result<()> {
            self.out.push(replacement);
            Ok(())
        }

        fn finish(self) -> Result<String> {
            Ok(self.out.join(" "))
        }
    }

    fn scratch_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("words.txt");
        fs::write(&path, "alpha beta gamma").unwrap();
        path
    }

    #[test]
    fn test_units_arrive_in_order_and_commit_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);

        let handshake = Handshake::spawn(
            &path,
            Words::new(&["alpha", "beta", "gamma"]),
            &HandshakeOptions::default(),
        );

        let mut seen = Vec::new();
        while let Some(unit) = handshake.next_unit() {
            seen.push(unit.clone());
            handshake.reply(unit.to_uppercase()).unwrap();
        }
        let report = handshake.finish().unwrap();

        assert_eq!(seen, vec!["alpha", "beta", "gamma"]);
        assert_eq!(report.units, 3);
        assert_eq!(report.changed_units, 3);
        assert!(report.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ALPHA BETA GAMMA");
    }

    #[test]
    fn test_persist_false_renders_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);

        let options = HandshakeOptions {
            persist: false,
            ..Default::default()
        };
        let handshake = Handshake::spawn(&path, Words::new(&["alpha"]), &options);
        while let Some(unit) = handshake.next_unit() {
            handshake.reply(format!("{unit}!")).unwrap();
        }
        let report = handshake.finish().unwrap();

        assert!(!report.written);
        assert_eq!(report.rendered, "alpha!");
        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha beta gamma");
    }

    #[test]
    fn test_abandon_releases_worker_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);

        let handshake = Handshake::spawn(
            &path,
            Words::new(&["alpha", "beta"]),
            &HandshakeOptions::default(),
        );
        let first = handshake.next_unit().unwrap();
        handshake.reply(first.to_uppercase()).unwrap();
        handshake.abandon();

        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha beta gamma");
    }

    #[test]
    fn test_cancel_while_waiting_for_replacement() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);
        let options = HandshakeOptions::default();

        let handshake = Handshake::spawn(&path, Words::new(&["alpha", "beta"]), &options);
        assert_eq!(handshake.next_unit().as_deref(), Some("alpha"));

        options.cancel.cancel();
        let err = handshake.finish().unwrap_err();

        assert!(matches!(err, RefactorError::Cancelled));
        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha beta gamma");
    }

    #[test]
    fn test_unit_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);
        let options = HandshakeOptions {
            unit_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };

        let handshake = Handshake::spawn(&path, Words::new(&["alpha"]), &options);
        assert!(handshake.next_unit().is_some());
        thread::sleep(Duration::from_millis(100));

        assert!(handshake.reply("late".to_string()).is_err());
        let err = handshake.finish().unwrap_err();
        assert!(matches!(err, RefactorError::TimedOut { .. }));
    }

    #[test]
    fn test_unit_timeout_when_units_are_never_taken() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);
        let options = HandshakeOptions {
            unit_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };

        let handshake = Handshake::spawn(&path, Words::new(&["one", "two"]), &options);
        thread::sleep(Duration::from_millis(200));

        // The worker gave up and closed the stream before "one" was taken
        assert_eq!(handshake.next_unit(), None);
        let err = handshake.finish().unwrap_err();
        assert!(matches!(err, RefactorError::TimedOut { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha beta gamma");
    }

    #[test]
    fn test_unit_timeout_when_ack_is_never_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = scratch_file(&temp_dir);
        let options = HandshakeOptions {
            unit_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };

        let handshake = Handshake::spawn(&path, Words::new(&["one", "two"]), &options);
        assert_eq!(handshake.next_unit().as_deref(), Some("one"));
        handshake.replacements().send("ONE".to_string()).unwrap();
        thread::sleep(Duration::from_millis(200));

        assert!(handshake.acks().try_recv().is_err());
        let err = handshake.finish().unwrap_err();
        assert!(matches!(err, RefactorError::TimedOut { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "alpha beta gamma");
    }
}
