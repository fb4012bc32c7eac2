//! GPIO numbering
//!
//! A pin packs its port in the high byte (A = 0 ... G = 6) and its index
//! within the port in the low byte, so `PC13` is `0x020D`.

use xmcu_hal::gpio::PinId;
use xmcu_hal::{HalError, HalResult};

use crate::chip::{GPIO_BASE, GPIO_PINS_PER_PORT, GPIO_PORT_COUNT, GPIO_PORT_STRIDE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Pin {
    pub const fn new(port: Port, index: u8) -> Self {
        Pin(((port as u16) << 8) | index as u16)
    }

    pub const fn from_raw(raw: u16) -> Self {
        Pin(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        ((self.0 >> 8) as u8) < GPIO_PORT_COUNT && ((self.0 & 0xFF) as u8) < GPIO_PINS_PER_PORT
    }

    /// `GPIOx` register block base
    pub const fn port_base(self) -> u32 {
        GPIO_BASE + GPIO_PORT_STRIDE * (self.0 >> 8) as u32
    }

    /// `GPIO_PIN_n` mask
    pub const fn mask(self) -> u16 {
        1 << (self.0 & 0x0F)
    }

    /// Port base and pin mask for a pin that exists on the device.
    pub(crate) fn checked(self) -> HalResult<(u32, u16)> {
        if self.is_valid() {
            Ok((self.port_base(), self.mask()))
        } else {
            Err(HalError::InvalidParam)
        }
    }
}

impl PinId for Pin {
    fn port(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    fn index(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

pub const PA2: Pin = Pin::new(Port::A, 2);
pub const PA3: Pin = Pin::new(Port::A, 3);
pub const PA5: Pin = Pin::new(Port::A, 5);
pub const PA9: Pin = Pin::new(Port::A, 9);
pub const PA10: Pin = Pin::new(Port::A, 10);
pub const PB10: Pin = Pin::new(Port::B, 10);
pub const PB11: Pin = Pin::new(Port::B, 11);
pub const PC10: Pin = Pin::new(Port::C, 10);
pub const PC11: Pin = Pin::new(Port::C, 11);
pub const PC12: Pin = Pin::new(Port::C, 12);
pub const PC13: Pin = Pin::new(Port::C, 13);
pub const PD2: Pin = Pin::new(Port::D, 2);
