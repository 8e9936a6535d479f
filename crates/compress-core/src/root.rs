//! The shared root condition and the timer that rewrites it mid-search.

use crate::Symbol;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Handle to the currently intended initial state.
///
/// Clones share one value. Readers always receive their own copy, so a
/// writer landing mid-replay cannot change what the reader is working on.
#[derive(Debug, Clone, Default)]
pub struct RootCondition {
    inner: Arc<RwLock<Option<Vec<Symbol>>>>,
}

impl RootCondition {
    pub fn new(initial: &[Symbol]) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(initial.to_vec()))),
        }
    }

    /// A root that has not been set yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overwrite the root
    pub fn set(&self, state: &[Symbol]) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(state.to_vec());
    }

    /// Set the root only if nothing has set it yet. Returns whether it was set.
    pub fn seed(&self, state: &[Symbol]) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return false;
        }
        *guard = Some(state.to_vec());
        true
    }

    /// Snapshot of the current root
    pub fn get(&self) -> Option<Vec<Symbol>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// One planned rewrite of the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledChange {
    /// Time after the scheduler starts
    pub delay: Duration,
    pub state: Vec<Symbol>,
}

impl ScheduledChange {
    pub fn new(delay: Duration, state: Vec<Symbol>) -> Self {
        Self { delay, state }
    }
}

/// Background thread applying [`ScheduledChange`]s to a root at their deadlines
pub struct RootScheduler {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<usize>>,
}

impl RootScheduler {
    /// Start the timer thread. Changes are applied in order of delay.
    pub fn spawn(root: RootCondition, mut changes: Vec<ScheduledChange>) -> Self {
        changes.sort_by_key(|change| change.delay);
        let (cancel, cancelled) = mpsc::channel::<()>();
        let started = Instant::now();

        let handle = thread::spawn(move || {
            let mut applied = 0;
            for change in changes {
                let remaining = change.delay.saturating_sub(started.elapsed());
                match cancelled.recv_timeout(remaining) {
                    Err(RecvTimeoutError::Timeout) => {
                        root.set(&change.state);
                        applied += 1;
                        info!(delay = ?change.delay, state = ?change.state, "root condition changed");
                    }
                    // Cancelled, or the scheduler handle was dropped
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!(applied, "root scheduler stopped early");
                        break;
                    }
                }
            }
            applied
        });

        Self {
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }

    /// Stop before any remaining changes fire
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Wait for every pending change and return how many were applied
    pub fn join(mut self) -> usize {
        let handle = self.handle.take();
        // Keep the channel open so waiting is not mistaken for cancellation
        let applied = handle.map(|h| h.join().unwrap_or(0)).unwrap_or(0);
        self.cancel.take();
        applied
    }
}

impl Drop for RootScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
