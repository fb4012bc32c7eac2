//! Blocking I/O with timeout
//!
//! Every non-instantaneous driver operation is a busy-poll on a hardware
//! readiness condition, bounded by a caller-supplied budget in milliseconds.
//! The deadline is armed once per call and checked on every poll, so an
//! operation returns [`HalError::Timeout`] within one poll iteration of the
//! budget running out. A budget of zero means wait forever.
//!
//! | Operation                          | Budget                         |
//! |------------------------------------|--------------------------------|
//! | UART `transmit` / `receive`        | caller, shared by all bytes    |
//! | UART `putchar`                     | fixed 1000 ms                  |
//! | UART `getchar`                     | caller                         |
//! | UART `flush_tx`                    | none, waits until sent         |
//! | UART `flush_rx`                    | none, drains what is buffered  |
//! | SPI transfers                      | caller, shared by all frames   |
//! | I2C transfers, `mem_*`             | caller, shared by all phases   |
//! | I2C `is_device_ready`              | caller, per trial              |
//! | I2C `scan_devices`                 | fixed 10 ms per address        |
//! | ADC `read_single`                  | caller                         |
//! | ADC `read_multiple`                | caller, per channel            |
//! | line `send_line` terminator        | fixed 100 ms                   |
//! | line `receive_line`                | caller, whole line; 10 ms/byte |

use crate::error::{HalError, HalResult};
use crate::timebase::{Clock, Tick};

/// A timeout budget in milliseconds; zero means no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout(u32);

impl Timeout {
    /// Wait as long as it takes.
    pub const FOREVER: Timeout = Timeout(0);

    pub const fn from_millis(ms: u32) -> Self {
        Timeout(ms)
    }

    pub const fn millis(self) -> u32 {
        self.0
    }

    pub const fn is_forever(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Timeout {
    fn from(ms: u32) -> Self {
        Timeout(ms)
    }
}

/// A timeout armed at a specific tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    start: Tick,
    budget: Timeout,
}

impl Deadline {
    /// Arms `budget` at the clock's current tick.
    pub fn arm<C: Clock + ?Sized>(clock: &C, budget: Timeout) -> Self {
        Self {
            start: clock.now(),
            budget,
        }
    }

    /// Arms `budget` at an already sampled tick.
    pub const fn starting_at(start: Tick, budget: Timeout) -> Self {
        Self { start, budget }
    }

    pub const fn start(&self) -> Tick {
        self.start
    }

    pub const fn budget(&self) -> Timeout {
        self.budget
    }

    /// Expired once strictly more than the budget has elapsed at `now`.
    pub const fn expired_at(&self, now: Tick) -> bool {
        !self.budget.is_forever() && now.elapsed_since(self.start) > self.budget.millis()
    }

    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        self.expired_at(clock.now())
    }
}

/// Drives a non-blocking operation to completion or until `deadline` expires.
///
/// `op` is polled first; the deadline is only consulted after a
/// `WouldBlock`, so an operation that is ready immediately never times out.
pub fn block_until<C, T, F>(clock: &C, deadline: &Deadline, mut op: F) -> HalResult<T>
where
    C: Clock + ?Sized,
    F: FnMut() -> nb::Result<T, HalError>,
{
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(nb::Error::Other(err)) => return Err(err),
            Err(nb::Error::WouldBlock) => {
                if deadline.expired(clock) {
                    return Err(HalError::Timeout);
                }
            }
        }
    }
}

/// Polls `ready` until it holds or `deadline` expires.
pub fn poll_until<C, F>(clock: &C, deadline: &Deadline, mut ready: F) -> HalResult<()>
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    block_until(clock, deadline, || {
        if ready() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    })
}

/// Polls `ready` with no time limit.
pub fn spin_until<F: FnMut() -> bool>(mut ready: F) {
    while !ready() {
        core::hint::spin_loop();
    }
}
