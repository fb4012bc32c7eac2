//! GPIO numbering
//!
//! C2000 pins are numbered linearly, `GPIO0..=GPIO168`. Ports group 32 pins
//! each (A = 0..31, B = 32..63, ...), so the port is `n >> 5` and the
//! in-port index `n & 31`.

use xmcu_hal::gpio::PinId;
use xmcu_hal::{HalError, HalResult};

use crate::chip::MAX_GPIO;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u32);

impl Pin {
    pub const fn new(number: u32) -> Self {
        Pin(number)
    }

    /// `(port << 5) | index`
    pub const fn from_port(port: u8, index: u8) -> Self {
        Pin(((port as u32) << 5) | (index as u32 & 0x1F))
    }

    pub const fn number(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 <= MAX_GPIO
    }

    pub(crate) fn checked(self) -> HalResult<u32> {
        if self.is_valid() {
            Ok(self.0)
        } else {
            Err(HalError::InvalidParam)
        }
    }
}

impl PinId for Pin {
    fn port(&self) -> u8 {
        (self.0 >> 5) as u8
    }

    fn index(&self) -> u8 {
        (self.0 & 0x1F) as u8
    }
}

/// `GPIOn` by number.
pub const fn gpio(number: u32) -> Pin {
    Pin::new(number)
}

// SCI pin routing
pub const GPIO28_SCIA_RX: Pin = gpio(28);
pub const GPIO29_SCIA_TX: Pin = gpio(29);
pub const GPIO15_SCIB_RX: Pin = gpio(15);
pub const GPIO14_SCIB_TX: Pin = gpio(14);

/// Mux index selecting the SCI function on the routing pins above.
pub(crate) const SCIA_MUX: u8 = 1;
pub(crate) const SCIB_MUX: u8 = 2;
