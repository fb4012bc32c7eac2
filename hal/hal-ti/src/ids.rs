//! Peripheral instance identifiers and their DriverLib base addresses

use xmcu_hal::{HalError, HalResult};

macro_rules! peripheral_id {
    ($(#[$meta:meta])* $name:ident, [$($inst:ident = $base:expr),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(u8);

        impl $name {
            const BASES: &'static [u32] = &[$($base),+];

            /// Number of instances on the device.
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
    /// SCI (UART) module
    UartId,
    [SCIA = 0x0000_7200, SCIB = 0x0000_7210, SCIC = 0x0000_7220]
);

peripheral_id!(
    /// SPI module
    SpiId,
    [SPIA = 0x0000_6100, SPIB = 0x0000_6110, SPIC = 0x0000_6120]
);

peripheral_id!(
    /// I2C module
    I2cId,
    [I2CA = 0x0000_7300, I2CB = 0x0000_7340]
);

peripheral_id!(
    /// ADC module
    AdcId,
    [ADCA = 0x0000_7400, ADCB = 0x0000_7480, ADCC = 0x0000_7500, ADCD = 0x0000_7580]
);

const ADC_RESULT_BASES: [u32; AdcId::COUNT] = [0x0000_0B00, 0x0000_0B20, 0x0000_0B40, 0x0000_0B60];

impl AdcId {
    /// Base of the result register block read by `ADC_readResult`.
    pub const fn result_base(self) -> Option<u32> {
        if (self.0 as usize) < ADC_RESULT_BASES.len() {
            Some(ADC_RESULT_BASES[self.0 as usize])
        } else {
            None
        }
    }
}
