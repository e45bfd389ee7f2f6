use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Shared cancellation signal for refactor cycles.
///
/// Cancelling drops the only sender of an internal channel, which wakes every
/// worker currently parked in a `select!` on [`CancelToken::signal`]. Clones
/// share the same signal.
#[derive(Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if let Ok(mut trigger) = self.trigger.lock() {
            trigger.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (disconnected) once cancellation is requested.
    pub fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::select;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());

        // Cancelling twice is harmless
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_wakes_blocked_select() {
        let token = CancelToken::new();
        let (_tx, never_sent) = bounded::<String>(0);

        let worker = {
            let token = token.clone();
            thread::spawn(move || {
                select! {
                    recv(never_sent) -> _ => false,
                    recv(token.signal()) -> _ => true,
                }
            })
        };

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(worker.join().unwrap());
    }
}
