//! Monotonic millisecond tick
//!
//! One counter per system, advanced by the platform's periodic timer
//! interrupt and read by everything else. The counter wraps after ~49.7 days;
//! all elapsed-time arithmetic goes through [`Tick::elapsed_since`], which
//! uses wrapping subtraction and stays correct across the wrap.

use core::sync::atomic::{AtomicU32, Ordering};

/// Period of one tick in milliseconds.
pub const TICK_PERIOD_MS: u32 = 1;

/// A point on the tick timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(u32);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Tick(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, modulo 2^32.
    #[inline]
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    #[inline]
    pub const fn wrapping_add(self, ms: u32) -> Tick {
        Tick(self.0.wrapping_add(ms))
    }
}

/// Source of the current tick.
pub trait Clock {
    fn now(&self) -> Tick;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Tick counter storage for platforms that keep their own.
///
/// Exactly one context (the timer interrupt) calls [`Timebase::advance`];
/// every other context only reads. With a single writer a plain load/store
/// pair is enough, which keeps this usable on cores without atomic
/// read-modify-write instructions such as the C28x.
#[derive(Debug)]
pub struct Timebase {
    ticks: AtomicU32,
}

impl Timebase {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one tick. Only the tick interrupt may call this.
    #[inline]
    pub fn advance(&self) {
        let next = self.ticks.load(Ordering::Relaxed).wrapping_add(1);
        self.ticks.store(next, Ordering::Release);
    }

    #[inline]
    pub fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::Acquire))
    }

    /// Force the counter to `tick`, e.g. to exercise wraparound.
    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick.0, Ordering::Release);
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for Timebase {
    fn now(&self) -> Tick {
        Timebase::now(self)
    }
}
