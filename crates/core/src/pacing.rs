//! Transmission pacing.
//!
//! The BCR2000 drops BCL lines when blocks arrive back to back for too long.
//! After a run of consecutive blocks the transmitter pauses before sending
//! more. The pause goes through the [`Delay`] capability so tests can record
//! it instead of sleeping, and so a caller can cancel it.

use crate::error::{Error, Result};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Consecutive blocks allowed before a pause.
pub const DEFAULT_PAUSE_EVERY: u32 = 16;
/// Length of the pause.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// When to pause and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub pause_every: u32,
    pub pause: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            pause_every: DEFAULT_PAUSE_EVERY,
            pause: DEFAULT_PAUSE,
        }
    }
}

/// Counter of blocks sent since the last pause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacingState {
    blocks_without_pause: u32,
}

impl PacingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks_without_pause(&self) -> u32 {
        self.blocks_without_pause
    }

    /// Account for a completed block. Returns `true` when a pause is due,
    /// in which case the counter has been reset.
    pub fn record_block(&mut self, policy: &PacingPolicy) -> bool {
        if self.blocks_without_pause >= policy.pause_every {
            self.blocks_without_pause = 0;
            true
        } else {
            self.blocks_without_pause += 1;
            false
        }
    }
}

/// Blocking wait used between block runs.
pub trait Delay {
    fn pause(&mut self, duration: Duration) -> Result<()>;

    /// Whether the caller has asked the run to stop.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn pause(&mut self, duration: Duration) -> Result<()> {
        (**self).pause(duration)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Plain `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn pause(&mut self, duration: Duration) -> Result<()> {
        std::thread::sleep(duration);
        Ok(())
    }
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any waiter.
    pub fn cancel(&self) {
        let (flag, wake) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait up to `duration`. Returns `true` if cancelled before it elapsed.
    ///
    /// A duration too long to put a deadline on waits for cancellation only.
    pub fn wait(&self, duration: Duration) -> bool {
        let (flag, wake) = &*self.inner;
        let deadline = Instant::now().checked_add(duration);
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            cancelled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    match wake.wait_timeout(cancelled, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    }
                }
                None => wake.wait(cancelled).unwrap_or_else(PoisonError::into_inner),
            };
        }
        true
    }
}

/// Sleep that a [`CancelToken`] can interrupt.
#[derive(Debug, Clone, Default)]
pub struct CancellableSleep {
    token: CancelToken,
}

impl CancellableSleep {
    pub fn new(token: CancelToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Delay for CancellableSleep {
    fn pause(&mut self, duration: Duration) -> Result<()> {
        debug!(pause_ms = duration.as_millis() as u64, "Pacing pause");
        if self.token.wait(duration) {
            warn!("Pacing pause cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
