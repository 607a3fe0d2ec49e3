//! Monotonic clocks.
//!
//! The scheduler never reads wall time directly; it asks a `Clock`. Hosts use
//! `SystemClock`, tests and offline drivers use `ManualClock` and advance it
//! explicitly.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use instant::Instant;

/// Milliseconds on a monotonic timeline.
pub type Millis = f64;

pub trait Clock {
    /// Current time in milliseconds. Must never decrease.
    fn now_ms(&self) -> Millis;
}

/// Real monotonic clock (`instant` keeps this working on wasm hosts).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Simulated clock. Clones share the same time source, so a test can keep a
/// handle while the sequence owns another.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: Millis) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    /// Move time forward by `ms` (negative or non-finite deltas are ignored).
    pub fn advance(&self, ms: Millis) {
        if ms.is_finite() && ms > 0.0 {
            self.now.set(self.now.get() + ms);
        }
    }

    /// Jump to an absolute time; earlier times are ignored.
    pub fn set(&self, ms: Millis) {
        if ms.is_finite() && ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now.get())
            .finish()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
