//! System services: bring-up, tick, delays, reset

use crate::error::HalResult;
use crate::timebase::Tick;

pub trait System {
    /// Bring up clocks, the tick interrupt and anything else the drivers
    /// depend on. Call once, before any other driver.
    fn init(&mut self) -> HalResult<()>;

    fn deinit(&mut self) -> HalResult<()>;

    /// Milliseconds since `init`, wrapping.
    fn get_tick(&self) -> Tick;

    /// Core clock in Hz.
    fn system_clock(&self) -> u32;

    fn delay_ms(&self, ms: u32);

    fn delay_us(&self, us: u32);

    fn system_reset(&self) -> !;
}
