//! Simulated incremental display of an answer.
//!
//! The endpoint returns the whole answer at once; [`RevealScheduler`] replays
//! it as a sequence of growing prefixes on a fixed cadence.  Each reveal runs
//! as its own tokio task and is controlled through a [`RevealHandle`].
//!
//! Guarantees for a single reveal:
//!
//! - ticks carry strictly longer prefixes of the text, with no gaps or repeats,
//!   and the last tick carries the whole text;
//! - `on_done` fires exactly once, after the last tick;
//! - an empty text fires `on_done` immediately with no ticks;
//! - once [`RevealHandle::cancel`] returns, no further tick or `on_done` will
//!   run, even if the timer for the next tick already fired.
//!
//! At most one reveal per scheduler is active; starting another cancels the
//! previous one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::observability::{REVEAL_CANCELLED, REVEAL_STARTED, REVEAL_TICKS};

/// Time between ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(8);

/// Characters added per tick.
pub const DEFAULT_CHUNK_CHARS: usize = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug)]
struct RevealState {
    phase: Mutex<Phase>,
    token: CancellationToken,
}

/// Controls one reveal.
///
/// Cloning a handle yields another reference to the same reveal.
#[derive(Debug, Clone)]
pub struct RevealHandle {
    state: Arc<RevealState>,
}

impl RevealHandle {
    fn new(phase: Phase) -> Self {
        Self {
            state: Arc::new(RevealState {
                phase: Mutex::new(phase),
                token: CancellationToken::new(),
            }),
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.state
            .phase
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop the reveal.  Returns true if it was still running.
    ///
    /// Callbacks run while the handle's lock is held, so they must not call
    /// `cancel` themselves.
    pub fn cancel(&self) -> bool {
        let mut phase = self.phase();
        if *phase != Phase::Running {
            return false;
        }
        *phase = Phase::Cancelled;
        drop(phase);
        self.state.token.cancel();
        REVEAL_CANCELLED.click();
        debug!("reveal cancelled");
        true
    }

    /// Returns true while ticks may still be delivered.
    pub fn is_active(&self) -> bool {
        *self.phase() == Phase::Running
    }

    /// Returns true once `on_done` has fired.
    pub fn is_finished(&self) -> bool {
        *self.phase() == Phase::Finished
    }

    /// Returns true if the reveal was cancelled before finishing.
    pub fn is_cancelled(&self) -> bool {
        *self.phase() == Phase::Cancelled
    }

    fn tick(&self, deliver: impl FnOnce()) -> bool {
        let phase = self.phase();
        if *phase != Phase::Running {
            return false;
        }
        deliver();
        true
    }

    fn finish(&self, on_done: impl FnOnce()) {
        let mut phase = self.phase();
        if *phase == Phase::Running {
            *phase = Phase::Finished;
            on_done();
        }
    }
}

/// Starts reveals at a fixed cadence.
#[derive(Debug)]
pub struct RevealScheduler {
    tick_interval: Duration,
    chunk_chars: usize,
    active: Option<RevealHandle>,
}

impl RevealScheduler {
    /// Create a scheduler.  A `chunk_chars` of zero is treated as one.
    pub fn new(tick_interval: Duration, chunk_chars: usize) -> Self {
        Self {
            tick_interval,
            chunk_chars: chunk_chars.max(1),
            active: None,
        }
    }

    /// Time between ticks.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Characters added per tick.
    pub fn chunk_chars(&self) -> usize {
        self.chunk_chars
    }

    /// Returns true if a reveal started here is still running.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(RevealHandle::is_active)
    }

    /// Cancel the active reveal, if any.  Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    /// Reveal `full_text`, calling `on_tick` with each prefix and `on_done`
    /// after the last one.
    ///
    /// Any reveal previously started by this scheduler is cancelled first.
    /// For an empty text `on_done` runs before this returns.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime and `full_text` is non-empty.
    pub fn reveal<T, D>(
        &mut self,
        full_text: impl Into<String>,
        on_tick: T,
        on_done: D,
    ) -> RevealHandle
    where
        T: FnMut(String) + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        self.cancel();
        REVEAL_STARTED.click();
        let full_text = full_text.into();
        if full_text.is_empty() {
            trace!("empty reveal completes immediately");
            let handle = RevealHandle::new(Phase::Running);
            handle.finish(on_done);
            return handle;
        }

        let ends = chunk_ends(&full_text, self.chunk_chars);
        debug!(
            bytes = full_text.len(),
            ticks = ends.len(),
            interval_ms = self.tick_interval.as_millis() as u64,
            "starting reveal"
        );
        let handle = RevealHandle::new(Phase::Running);
        let task = handle.clone();
        let interval = self.tick_interval;
        tokio::spawn(async move {
            let mut on_tick = on_tick;
            let token = task.state.token.clone();
            for end in ends {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
                let partial = full_text[..end].to_string();
                if !task.tick(|| on_tick(partial)) {
                    return;
                }
                REVEAL_TICKS.click();
            }
            task.finish(on_done);
        });
        self.active = Some(handle.clone());
        handle
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, DEFAULT_CHUNK_CHARS)
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Byte offsets at which each tick's prefix ends.
///
/// Offsets always fall on char boundaries and the last one is `text.len()`.
fn chunk_ends(text: &str, chunk_chars: usize) -> Vec<usize> {
    let chunk = chunk_chars.max(1);
    let mut ends: Vec<usize> = text
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .skip(chunk - 1)
        .step_by(chunk)
        .collect();
    if !text.is_empty() && ends.last() != Some(&text.len()) {
        ends.push(text.len());
    }
    ends
}
