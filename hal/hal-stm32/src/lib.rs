//! STM32G4 implementation of the HAL traits
//!
//! Drivers call the Cube HAL/LL library through [`CubeHal`]. Time comes
//! from `HAL_GetTick`, which the SysTick handler advances by calling
//! [`Hal::on_tick_interrupt`].

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod chip;
pub mod cube;
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

use xmcu_hal::timebase::{Clock, Tick};

pub use cube::CubeHal;

use adc::AdcDriver;
use cube::CubeTick;
use gpio::GpioDriver;
use i2c::I2cDriver;
use spi::SpiDriver;
use system::SystemDriver;
use uart::UartDriver;

/// Platform name reported by this backend.
pub const PLATFORM_NAME: &str = "stm32g4";

/// A Cube binding and the drivers built on it.
pub struct Hal<B> {
    lib: B,
}

impl<B: CubeHal> Hal<B> {
    pub const fn new(lib: B) -> Self {
        Self { lib }
    }

    pub fn bindings(&self) -> &B {
        &self.lib
    }

    /// Current `HAL_GetTick` value.
    pub fn now(&self) -> Tick {
        CubeTick(&self.lib).now()
    }

    /// Body of `SysTick_Handler`.
    pub fn on_tick_interrupt(&self) {
        self.lib.hal_inc_tick();
    }

    pub fn system(&self) -> SystemDriver<'_, B> {
        SystemDriver::new(&self.lib)
    }

    pub fn gpio(&self) -> GpioDriver<'_, B> {
        GpioDriver::new(&self.lib)
    }

    pub fn uart(&self) -> UartDriver<'_, B> {
        UartDriver::new(&self.lib)
    }

    pub fn spi(&self) -> SpiDriver<'_, B> {
        SpiDriver::new(&self.lib)
    }

    pub fn i2c(&self) -> I2cDriver<'_, B> {
        I2cDriver::new(&self.lib)
    }

    pub fn adc(&self) -> AdcDriver<'_, B> {
        AdcDriver::new(&self.lib)
    }
}
