//! Driver tests against the simulated Cube library.

mod adc;
mod uart;

use xmcu_hal::system::System;

use crate::sim::{self, SimCube};
use crate::Hal;

fn setup() -> Hal<SimCube> {
    sim::hal()
}

/// Fresh hardware with the 170 MHz clock tree up.
fn booted() -> Hal<SimCube> {
    let hal = sim::hal();
    hal.system().init().unwrap();
    hal
}

/// Milliseconds on `HAL_GetTick` since `start`.
fn elapsed(hal: &Hal<SimCube>, start: xmcu_hal::Tick) -> u32 {
    hal.now().elapsed_since(start)
}
