//! Driver tests against the simulated DriverLib.

mod adc;
mod i2c;
mod uart;

use crate::sim::{self, SimDriverLib};
use crate::Hal;

fn setup() -> Hal<SimDriverLib> {
    sim::hal()
}

/// Milliseconds elapsed on `hal`'s tick since `start`.
fn elapsed(hal: &Hal<SimDriverLib>, start: xmcu_hal::Tick) -> u32 {
    hal.timebase().now().elapsed_since(start)
}
