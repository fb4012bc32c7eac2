//! STM32G4 SPI driver, 8-bit frames

use xmcu_hal::blocking::{poll_until, Deadline, Timeout};
use xmcu_hal::gpio::{Gpio, Level};
use xmcu_hal::spi::{Phase, Polarity, Spi, SpiConfig, SpiRole, DUMMY_BYTE};
use xmcu_hal::{HalError, HalResult};

use crate::cube::{CubeHal, CubeTick, SpiSetup};
use crate::gpio::GpioDriver;
use crate::ids::SpiId;
use crate::pins::Pin;

/// BR is three bits: dividers /2 through /256.
const MAX_PRESCALER: u8 = 7;

pub struct SpiDriver<'a, B> {
    lib: &'a B,
}

/// Smallest divider that keeps SCK at or below `frequency`.
fn prescaler(kernel_hz: u32, frequency: u32) -> HalResult<u8> {
    if frequency == 0 {
        return Err(HalError::InvalidParam);
    }
    (0..=MAX_PRESCALER)
        .find(|&br| kernel_hz >> (br + 1) <= frequency)
        .ok_or(HalError::InvalidParam)
}

impl<'a, B: CubeHal> SpiDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn kernel_clock(&self, id: SpiId) -> u32 {
        if id.on_apb2() {
            self.lib.pclk2_freq()
        } else {
            self.lib.pclk1_freq()
        }
    }

    fn exchange(&self, base: u32, out: u8, deadline: &Deadline) -> HalResult<u8> {
        let clock = CubeTick(self.lib);
        poll_until(&clock, deadline, || self.lib.spi_is_tx_empty(base))?;
        self.lib.spi_transmit_data8(base, out);
        poll_until(&clock, deadline, || self.lib.spi_is_rx_not_empty(base))?;
        Ok(self.lib.spi_receive_data8(base))
    }
}

impl<B: CubeHal> Spi for SpiDriver<'_, B> {
    type Id = SpiId;
    type Pin = Pin;

    fn init(&mut self, id: SpiId, config: &SpiConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        let setup = SpiSetup {
            master: config.role == SpiRole::Master,
            clock_idle_high: config.polarity == Polarity::IdleHigh,
            capture_second_edge: config.phase == Phase::SecondEdge,
            prescaler: prescaler(self.kernel_clock(id), config.frequency)?,
        };
        self.lib.rcc_enable(id.clock());
        self.lib.spi_disable(base);
        self.lib.spi_configure(base, &setup);
        self.lib.spi_enable(base);
        debug!(
            "spi{} mode {} prescaler {}",
            id.index() + 1,
            config.mode_number(),
            setup.prescaler
        );
        Ok(())
    }

    fn deinit(&mut self, id: SpiId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.spi_disable(base);
        self.lib.rcc_disable(id.clock());
        Ok(())
    }

    fn transmit_receive(
        &mut self,
        id: SpiId,
        tx: &[u8],
        rx: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = id.checked_base()?;
        if tx.is_empty() || tx.len() != rx.len() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(&CubeTick(self.lib), timeout);
        for (out, slot) in tx.iter().zip(rx.iter_mut()) {
            *slot = self.exchange(base, *out, &deadline)?;
        }
        Ok(())
    }

    fn transmit(&mut self, id: SpiId, data: &[u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(&CubeTick(self.lib), timeout);
        for &out in data {
            self.exchange(base, out, &deadline)?;
        }
        Ok(())
    }

    fn receive(&mut self, id: SpiId, buf: &mut [u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if buf.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(&CubeTick(self.lib), timeout);
        for slot in buf.iter_mut() {
            *slot = self.exchange(base, DUMMY_BYTE, &deadline)?;
        }
        Ok(())
    }

    fn is_busy(&self, id: SpiId) -> bool {
        id.base().is_some_and(|base| self.lib.spi_is_busy(base))
    }

    fn set_cs(&mut self, id: SpiId, cs: Pin, level: Level) -> HalResult<()> {
        id.checked_base()?;
        GpioDriver::new(self.lib).write(cs, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescaler_rounds_down_the_clock() {
        assert_eq!(prescaler(170_000_000, 100_000_000), Ok(0));
        // 170 MHz / 256 is the slowest SCK.
        assert_eq!(prescaler(170_000_000, 1_000_000), Ok(7));
        assert_eq!(prescaler(170_000_000, 10_000_000), Ok(4));
        assert_eq!(prescaler(170_000_000, 600_000), Err(HalError::InvalidParam));
        assert_eq!(prescaler(170_000_000, 0), Err(HalError::InvalidParam));
    }
}
