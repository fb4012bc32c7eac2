//! TI C2000 (F28P55x / F28P65x) implementation of the HAL traits
//!
//! Drivers talk to the hardware through [`DriverLib`], one method per
//! DriverLib function. [`Hal`] bundles a binding with the tick counter and
//! hands out one driver per peripheral class.
//!
//! The tick is kept here rather than in DriverLib: CPU Timer0 is started
//! by [`System::init`](xmcu_hal::system::System::init) and its ISR must
//! call [`Hal::on_tick_interrupt`].

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod chip;
pub mod driverlib;
pub mod gpio;
pub mod i2c;
pub mod ids;
pub mod pins;
pub mod spi;
pub mod system;
pub mod uart;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(test)]
mod tests;

use xmcu_hal::timebase::{Tick, Timebase};

pub use driverlib::DriverLib;

use adc::AdcDriver;
use gpio::GpioDriver;
use i2c::I2cDriver;
use spi::SpiDriver;
use system::SystemDriver;
use uart::UartDriver;

/// Millisecond tick advanced from the CPU Timer0 interrupt.
pub static SYSTEM_TICK: Timebase = Timebase::new();

/// Platform name reported by this backend.
pub const PLATFORM_NAME: &str = "ti-c2000";

/// A DriverLib binding plus the tick it is timed against.
pub struct Hal<B> {
    lib: B,
    timebase: &'static Timebase,
}

impl<B: DriverLib> Hal<B> {
    /// Uses the global [`SYSTEM_TICK`].
    pub fn new(lib: B) -> Self {
        Self::with_timebase(lib, &SYSTEM_TICK)
    }

    pub const fn with_timebase(lib: B, timebase: &'static Timebase) -> Self {
        Self { lib, timebase }
    }

    pub fn bindings(&self) -> &B {
        &self.lib
    }

    pub fn timebase(&self) -> &'static Timebase {
        self.timebase
    }

    pub fn now(&self) -> Tick {
        self.timebase.now()
    }

    /// Body of the CPU Timer0 ISR: advance the tick and acknowledge PIE
    /// group 1.
    pub fn on_tick_interrupt(&self) {
        self.timebase.advance();
        self.lib.interrupt_ack_group1();
    }

    pub fn system(&self) -> SystemDriver<'_, B> {
        SystemDriver::new(&self.lib, self.timebase)
    }

    pub fn gpio(&self) -> GpioDriver<'_, B> {
        GpioDriver::new(&self.lib)
    }

    pub fn uart(&self) -> UartDriver<'_, B> {
        UartDriver::new(&self.lib, self.timebase)
    }

    pub fn spi(&self) -> SpiDriver<'_, B> {
        SpiDriver::new(&self.lib, self.timebase)
    }

    pub fn i2c(&self) -> I2cDriver<'_, B> {
        I2cDriver::new(&self.lib, self.timebase)
    }

    pub fn adc(&self) -> AdcDriver<'_, B> {
        AdcDriver::new(&self.lib, self.timebase)
    }
}
