//! Compile-time platform selection
//!
//! Application code names `xmcu_platform::Hal`, `pins`, `ids` and the HAL
//! traits without mentioning a vendor. Exactly one of the `ti-c2000` or
//! `stm32g4` features picks the backend:
//!
//! ```toml
//! xmcu-platform = { version = "0.1", default-features = false, features = ["ti-c2000"] }
//! ```
//!
//! [`board`] carries the pin and instance choices of the reference boards.

#![no_std]

cfg_if::cfg_if! {
    if #[cfg(all(feature = "ti-c2000", feature = "stm32g4"))] {
        compile_error!("features `ti-c2000` and `stm32g4` are mutually exclusive");
    } else if #[cfg(feature = "ti-c2000")] {
        pub use xmcu_hal_ti as backend;

        /// Vendor library binding the backend drives.
        pub use xmcu_hal_ti::DriverLib as Bindings;

        /// Simulated bindings.
        #[cfg(feature = "sim")]
        pub type SimBindings = xmcu_hal_ti::sim::SimDriverLib;

        pub mod board {
            //! LaunchPad wiring

            use crate::ids::UartId;
            use crate::pins::{gpio, Pin};

            pub const LED: Pin = gpio(31);
            pub const BUTTON: Pin = gpio(34);
            pub const CONSOLE: UartId = UartId::SCIA;
        }
    } else if #[cfg(feature = "stm32g4")] {
        pub use xmcu_hal_stm32 as backend;

        /// Vendor library binding the backend drives.
        pub use xmcu_hal_stm32::CubeHal as Bindings;

        /// Simulated bindings.
        #[cfg(feature = "sim")]
        pub type SimBindings = xmcu_hal_stm32::sim::SimCube;

        pub mod board {
            //! Nucleo-G474RE wiring

            use crate::ids::UartId;
            use crate::pins::{self, Pin};

            pub const LED: Pin = pins::PA5;
            pub const BUTTON: Pin = pins::PC13;
            /// Routed to the ST-LINK virtual COM port.
            pub const CONSOLE: UartId = UartId::USART2;
        }
    } else {
        compile_error!("select a platform: enable `ti-c2000` or `stm32g4`");
    }
}

pub use backend::{chip, ids, pins, Hal, PLATFORM_NAME};
pub use ids::{AdcId, I2cId, SpiId, UartId};
pub use pins::Pin;

#[cfg(feature = "sim")]
pub use backend::sim;

pub use xmcu_hal::{adc, blocking, eh, gpio, i2c, line, spi, system, timebase, uart};
pub use xmcu_hal::{prelude, Deadline, HalError, HalResult, Status, Tick, Timeout};

/// A [`Hal`] over fresh simulated hardware.
#[cfg(feature = "sim")]
pub fn simulated() -> Hal<SimBindings> {
    sim::hal()
}
