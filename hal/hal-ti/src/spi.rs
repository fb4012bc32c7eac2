//! C2000 SPI driver, 8-bit characters

use xmcu_hal::blocking::{poll_until, Deadline, Timeout};
use xmcu_hal::gpio::{Gpio, Level};
use xmcu_hal::spi::{Phase, Polarity, Spi, SpiConfig, SpiRole as Role, DUMMY_BYTE};
use xmcu_hal::timebase::Timebase;
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::driverlib::{protected, DriverLib, PeripheralClock, SpiProtocol, SpiRole};
use crate::gpio::GpioDriver;
use crate::ids::SpiId;
use crate::pins::Pin;

const CHAR_BITS: u8 = 8;

pub struct SpiDriver<'a, B> {
    lib: &'a B,
    timebase: &'a Timebase,
}

impl<'a, B: DriverLib> SpiDriver<'a, B> {
    pub(crate) fn new(lib: &'a B, timebase: &'a Timebase) -> Self {
        Self { lib, timebase }
    }

    /// Clock one character out and the answering character in.
    fn exchange(&self, base: u32, out: u8, deadline: &Deadline) -> HalResult<u8> {
        poll_until(self.timebase, deadline, || self.lib.spi_tx_fifo_has_space(base))?;
        self.lib.spi_write_data(base, (out as u16) << 8);
        poll_until(self.timebase, deadline, || self.lib.spi_rx_fifo_has_data(base))?;
        Ok((self.lib.spi_read_data(base) & 0xFF) as u8)
    }
}

fn protocol(config: &SpiConfig) -> SpiProtocol {
    match (config.polarity, config.phase) {
        (Polarity::IdleLow, Phase::FirstEdge) => SpiProtocol::Pol0Pha0,
        (Polarity::IdleLow, Phase::SecondEdge) => SpiProtocol::Pol0Pha1,
        (Polarity::IdleHigh, Phase::FirstEdge) => SpiProtocol::Pol1Pha0,
        (Polarity::IdleHigh, Phase::SecondEdge) => SpiProtocol::Pol1Pha1,
    }
}

/// The baud rate generator reaches LSPCLK/4 at most and LSPCLK/128 at least.
fn check_bit_rate(frequency: u32) -> HalResult<()> {
    if frequency == 0 || frequency > chip::LSPCLK_HZ / 4 || chip::LSPCLK_HZ / frequency > 128 {
        return Err(HalError::InvalidParam);
    }
    Ok(())
}

impl<B: DriverLib> Spi for SpiDriver<'_, B> {
    type Id = SpiId;
    type Pin = Pin;

    fn init(&mut self, id: SpiId, config: &SpiConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        check_bit_rate(config.frequency)?;
        let role = match config.role {
            Role::Master => SpiRole::Controller,
            Role::Slave => SpiRole::Peripheral,
        };

        protected(self.lib, || {
            self.lib.sysctl_enable_peripheral(PeripheralClock::Spi(id.index()))
        });
        self.lib.spi_disable_module(base);
        self.lib.spi_set_config(
            base,
            chip::LSPCLK_HZ,
            protocol(config),
            role,
            config.frequency,
            CHAR_BITS,
        );
        self.lib.spi_enable_fifo(base);
        self.lib.spi_enable_module(base);
        debug!("spi{} mode {} at {} Hz", id.index(), config.mode_number(), config.frequency);
        Ok(())
    }

    fn deinit(&mut self, id: SpiId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.spi_disable_module(base);
        protected(self.lib, || {
            self.lib.sysctl_disable_peripheral(PeripheralClock::Spi(id.index()))
        });
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
        let deadline = Deadline::arm(self.timebase, timeout);
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
        let deadline = Deadline::arm(self.timebase, timeout);
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
        let deadline = Deadline::arm(self.timebase, timeout);
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
