//! Peripheral instance identifiers and their register block bases

use xmcu_hal::{HalError, HalResult};

use crate::cube::ClockGate;
use crate::pins::{self, Pin};

macro_rules! peripheral_id {
    ($(#[$meta:meta])* $name:ident, [$($inst:ident = $base:expr),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(u8);

        impl $name {
            const BASES: &'static [u32] = &[$($base),+];

            pub const COUNT: usize = Self::BASES.len();

            pub const fn new(index: u8) -> Self {
                Self(index)
            }

            pub const fn index(self) -> u8 {
                self.0
            }

            pub const fn base(self) -> Option<u32> {
                if (self.0 as usize) < Self::BASES.len() {
                    Some(Self::BASES[self.0 as usize])
                } else {
                    None
                }
            }

            pub(crate) fn checked_base(self) -> HalResult<u32> {
                self.base().ok_or(HalError::InvalidParam)
            }
        }

        peripheral_id!(@consts $name, 0u8, $($inst),+);
    };
    (@consts $name:ident, $n:expr,) => {};
    (@consts $name:ident, $n:expr, $inst:ident $(, $rest:ident)*) => {
        impl $name {
            pub const $inst: $name = $name($n);
        }
        peripheral_id!(@consts $name, $n + 1u8, $($rest),*);
    };
}

peripheral_id!(
    /// USART / UART instance
    UartId,
    [
        USART1 = 0x4001_3800,
        USART2 = 0x4000_4400,
        USART3 = 0x4000_4800,
        UART4 = 0x4000_4C00,
        UART5 = 0x4000_5000,
    ]
);

peripheral_id!(
    SpiId,
    [SPI1 = 0x4001_3000, SPI2 = 0x4000_3800, SPI3 = 0x4000_3C00, SPI4 = 0x4001_3C00]
);

peripheral_id!(
    I2cId,
    [I2C1 = 0x4000_5400, I2C2 = 0x4000_5800, I2C3 = 0x4000_7800, I2C4 = 0x4000_8400]
);

peripheral_id!(
    AdcId,
    [
        ADC1 = 0x5000_0000,
        ADC2 = 0x5000_0100,
        ADC3 = 0x5000_0400,
        ADC4 = 0x5000_0500,
        ADC5 = 0x5000_0600,
    ]
);

/// TX and RX pins with their alternate function number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPins {
    pub tx: Pin,
    pub rx: Pin,
    pub alternate: u8,
}

const UART_PINS: [UartPins; UartId::COUNT] = [
    UartPins { tx: pins::PA9, rx: pins::PA10, alternate: 7 },
    UartPins { tx: pins::PA2, rx: pins::PA3, alternate: 7 },
    UartPins { tx: pins::PB10, rx: pins::PB11, alternate: 7 },
    UartPins { tx: pins::PC10, rx: pins::PC11, alternate: 5 },
    UartPins { tx: pins::PC12, rx: pins::PD2, alternate: 5 },
];

impl UartId {
    /// Default pin routing.
    pub const fn pins(self) -> Option<UartPins> {
        if (self.0 as usize) < UART_PINS.len() {
            Some(UART_PINS[self.0 as usize])
        } else {
            None
        }
    }

    pub(crate) const fn on_apb2(self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn clock(self) -> ClockGate {
        ClockGate::Uart(self.0)
    }
}

impl SpiId {
    /// SPI1 and SPI4 hang off APB2.
    pub(crate) const fn on_apb2(self) -> bool {
        matches!(self.0, 0 | 3)
    }

    pub(crate) const fn clock(self) -> ClockGate {
        ClockGate::Spi(self.0)
    }
}

impl I2cId {
    pub(crate) const fn clock(self) -> ClockGate {
        ClockGate::I2c(self.0)
    }
}

impl AdcId {
    /// ADC1/2 and ADC3/4/5 share a clock enable each.
    pub(crate) const fn clock(self) -> ClockGate {
        if self.0 < 2 {
            ClockGate::Adc12
        } else {
            ClockGate::Adc345
        }
    }
}
