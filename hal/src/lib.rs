//! Cross-MCU Hardware Abstraction Layer
//!
//! This crate provides the vendor-agnostic peripheral API shared by every
//! supported microcontroller family: the status taxonomy, configuration
//! records, one trait per peripheral, the monotonic tick and the
//! blocking-with-timeout polling engine every driver is built on.
//!
//! Platform crates (`xmcu-hal-ti`, `xmcu-hal-stm32`) implement the traits;
//! `xmcu-platform` selects exactly one of them at compile time.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod fmt;

pub mod adc;
pub mod blocking;
pub mod eh;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod line;
pub mod spi;
pub mod system;
pub mod timebase;
pub mod uart;

// Re-export commonly used types
pub use blocking::{Deadline, Timeout};
pub use error::{HalError, HalResult, Status};
pub use timebase::{Clock, Tick, Timebase};

/// The peripheral traits, for glob import by drivers and applications.
pub mod prelude {
    pub use crate::adc::Adc;
    pub use crate::gpio::{Gpio, PinId};
    pub use crate::i2c::I2c;
    pub use crate::spi::Spi;
    pub use crate::system::System;
    pub use crate::timebase::Clock;
    pub use crate::uart::Uart;
}
