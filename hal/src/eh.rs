//! `embedded-hal` 1.0 adapters
//!
//! Lets ecosystem drivers use a pin or the system delay from this HAL.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType};

use crate::error::HalError;
use crate::gpio::{Gpio, Level};
use crate::system::System;

impl digital::Error for HalError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One pin of a [`Gpio`] driver, borrowed for `embedded-hal` use.
///
/// The pin must already be configured with [`Gpio::init`].
pub struct Pin<'a, G: Gpio> {
    gpio: &'a mut G,
    pin: G::Pin,
}

impl<'a, G: Gpio> Pin<'a, G> {
    pub fn new(gpio: &'a mut G, pin: G::Pin) -> Self {
        Self { gpio, pin }
    }

    pub fn id(&self) -> G::Pin {
        self.pin
    }
}

impl<G: Gpio> ErrorType for Pin<'_, G> {
    type Error = HalError;
}

impl<G: Gpio> digital::OutputPin for Pin<'_, G> {
    fn set_low(&mut self) -> Result<(), HalError> {
        self.gpio.write(self.pin, Level::Low)
    }

    fn set_high(&mut self) -> Result<(), HalError> {
        self.gpio.write(self.pin, Level::High)
    }
}

impl<G: Gpio> digital::StatefulOutputPin for Pin<'_, G> {
    fn is_set_high(&mut self) -> Result<bool, HalError> {
        Ok(self.gpio.read(self.pin).is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, HalError> {
        Ok(!self.gpio.read(self.pin).is_high())
    }

    fn toggle(&mut self) -> Result<(), HalError> {
        self.gpio.toggle(self.pin)
    }
}

impl<G: Gpio> digital::InputPin for Pin<'_, G> {
    fn is_high(&mut self) -> Result<bool, HalError> {
        Ok(self.gpio.read(self.pin).is_high())
    }

    fn is_low(&mut self) -> Result<bool, HalError> {
        Ok(!self.gpio.read(self.pin).is_high())
    }
}

/// [`System`] delays as an `embedded-hal` delay provider.
pub struct Delay<'a, S: System + ?Sized> {
    system: &'a S,
}

impl<'a, S: System + ?Sized> Delay<'a, S> {
    pub fn new(system: &'a S) -> Self {
        Self { system }
    }
}

impl<S: System + ?Sized> DelayNs for Delay<'_, S> {
    fn delay_ns(&mut self, ns: u32) {
        // Microsecond granularity, rounded up.
        self.system.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.system.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.system.delay_ms(ms);
    }
}
