//! UART (Universal Asynchronous Receiver/Transmitter) abstraction

use crate::blocking::Timeout;
use crate::error::HalResult;

/// Budget used by [`Uart::putchar`].
pub const PUTCHAR_TIMEOUT: Timeout = Timeout::from_millis(1000);

/// Supported baud rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Baudrate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl Baudrate {
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Baudrate::B9600 => 9_600,
            Baudrate::B19200 => 19_200,
            Baudrate::B38400 => 38_400,
            Baudrate::B57600 => 57_600,
            Baudrate::B115200 => 115_200,
        }
    }
}

/// UART data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

impl DataBits {
    pub const fn count(self) -> u8 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }
}

/// UART stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// UART parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    pub baudrate: Baudrate,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: Baudrate::B115200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

/// Blocking UART driver
///
/// Transfers move one byte at a time, polling the hardware readiness flag
/// and checking the deadline on every poll. A timeout part-way through a
/// transfer returns `Timeout` without reporting how many bytes moved.
pub trait Uart {
    /// Peripheral instance identifier
    type Id: Copy + core::fmt::Debug;

    /// Route pins, enable the clock, apply `config`, and reset the FIFOs so
    /// no stale bytes survive.
    fn init(&mut self, id: Self::Id, config: &UartConfig) -> HalResult<()>;

    /// Disable the module and its clock.
    fn deinit(&mut self, id: Self::Id) -> HalResult<()>;

    /// Send all of `data`. Empty input is `InvalidParam`.
    fn transmit(&mut self, id: Self::Id, data: &[u8], timeout: Timeout) -> HalResult<()>;

    /// Fill all of `buf`. Empty input is `InvalidParam`.
    fn receive(&mut self, id: Self::Id, buf: &mut [u8], timeout: Timeout) -> HalResult<()>;

    /// Whether the transmitter still holds unsent bits. False for invalid ids.
    fn is_busy(&self, id: Self::Id) -> bool;

    /// Whether at least one received byte is waiting. False for invalid ids.
    fn data_available(&self, id: Self::Id) -> bool;

    /// Discard every byte currently buffered on the receive side.
    fn flush_rx(&mut self, id: Self::Id) -> HalResult<()>;

    /// Block until the transmitter is idle. There is no time limit.
    fn flush_tx(&mut self, id: Self::Id) -> HalResult<()>;

    /// Send one byte with a fixed one second budget.
    fn putchar(&mut self, id: Self::Id, byte: u8) -> HalResult<()> {
        self.transmit(id, &[byte], PUTCHAR_TIMEOUT)
    }

    fn getchar(&mut self, id: Self::Id, timeout: Timeout) -> HalResult<u8> {
        let mut byte = [0u8; 1];
        self.receive(id, &mut byte, timeout)?;
        Ok(byte[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_115200_8n1() {
        let config = UartConfig::default();
        assert_eq!(config.baudrate.bits_per_second(), 115_200);
        assert_eq!(config.data_bits.count(), 8);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
    }
}
