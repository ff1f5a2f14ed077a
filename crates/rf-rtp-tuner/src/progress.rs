//! Progress events and cancellation for refinement runs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// Refinement phase reported in progress events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Init,
    Refine,
    Complete,
}

/// One progress message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub iteration: u64,
    pub max_iterations: u64,
    pub current_rtp: f64,
    pub target_rtp: f64,
    pub error: f64,
    pub converged: bool,
}

/// Best-effort progress sink.
///
/// Events go out with `try_send`; a full or disconnected channel drops the
/// event and the run carries on.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<Sender<ProgressEvent>>,
    dropped: u64,
}

impl ProgressReporter {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self {
            tx: Some(tx),
            dropped: 0,
        }
    }

    pub fn emit(&mut self, event: ProgressEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::trace!("Progress channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::trace!("Progress receiver gone, disabling progress");
                self.tx = None;
            }
        }
    }

    /// Events dropped because the consumer was not ready
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Level-triggered cancellation flag, polled once per iteration
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the in-flight iteration still completes
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(iteration: u64) -> ProgressEvent {
        ProgressEvent {
            phase: ProgressPhase::Refine,
            iteration,
            max_iterations: 100,
            current_rtp: 0.95,
            target_rtp: 0.96,
            error: 0.01,
            converged: false,
        }
    }

    #[test]
    fn test_full_channel_drops() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut reporter = ProgressReporter::new(tx);
        reporter.emit(event(10));
        reporter.emit(event(20));
        reporter.emit(event(30));

        assert_eq!(reporter.dropped(), 2);
        assert_eq!(rx.try_recv().unwrap().iteration, 10);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_receiver() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        drop(rx);
        let mut reporter = ProgressReporter::new(tx);
        reporter.emit(event(10));
        reporter.emit(event(20));
        assert_eq!(reporter.dropped(), 0);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!clone.is_cancelled());
    }

    #[test]
    fn test_phase_wire_names() {
        let json = serde_json::to_string(&event(10)).unwrap();
        assert!(json.contains(r#""phase":"refine""#));
    }
}
