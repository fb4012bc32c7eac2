//! SPI (Serial Peripheral Interface) abstraction

use crate::blocking::Timeout;
use crate::error::HalResult;
use crate::gpio::Level;

/// Byte clocked out by [`Spi::receive`].
pub const DUMMY_BYTE: u8 = 0xFF;

/// Which side drives the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRole {
    /// Drives the clock
    Master,
    /// Follows an external clock
    Slave,
}

/// Clock polarity (CPOL)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock low when idle (CPOL = 0)
    IdleLow,
    /// Clock high when idle (CPOL = 1)
    IdleHigh,
}

/// Clock phase (CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Sample on the first clock edge
    FirstEdge,
    /// Sample on the second clock edge
    SecondEdge,
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    pub role: SpiRole,
    pub polarity: Polarity,
    pub phase: Phase,
    /// Target bit clock in Hz. The driver picks the closest rate not above it.
    pub frequency: u32,
}

impl SpiConfig {
    /// Conventional mode number: `CPOL << 1 | CPHA`.
    pub const fn mode_number(&self) -> u8 {
        let cpol = matches!(self.polarity, Polarity::IdleHigh) as u8;
        let cpha = matches!(self.phase, Phase::SecondEdge) as u8;
        (cpol << 1) | cpha
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            role: SpiRole::Master,
            polarity: Polarity::IdleLow,
            phase: Phase::FirstEdge,
            frequency: 1_000_000, // 1 MHz
        }
    }
}

/// Blocking SPI driver, 8-bit frames
pub trait Spi {
    type Id: Copy + core::fmt::Debug;
    /// Pin type accepted by [`Spi::set_cs`]
    type Pin: Copy;

    fn init(&mut self, id: Self::Id, config: &SpiConfig) -> HalResult<()>;

    fn deinit(&mut self, id: Self::Id) -> HalResult<()>;

    /// Full duplex exchange; `tx` and `rx` must have the same non-zero length.
    fn transmit_receive(
        &mut self,
        id: Self::Id,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()>;

    /// Send `data`, discarding whatever is clocked in.
    fn transmit(&mut self, id: Self::Id, data: &[u8], timeout: Timeout) -> HalResult<()>;

    /// Fill `buf`, clocking out [`DUMMY_BYTE`].
    fn receive(&mut self, id: Self::Id, buf: &mut [u8], timeout: Timeout) -> HalResult<()>;

    fn is_busy(&self, id: Self::Id) -> bool;

    /// Drive a chip-select GPIO. `Low` selects the device.
    fn set_cs(&mut self, id: Self::Id, cs: Self::Pin, level: Level) -> HalResult<()>;
}
