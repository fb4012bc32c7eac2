//! C2000 SCI driver

use xmcu_hal::blocking::{poll_until, spin_until, Deadline, Timeout};
use xmcu_hal::timebase::Timebase;
use xmcu_hal::uart::{DataBits, Parity, StopBits, Uart, UartConfig};
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::driverlib::{protected, DriverLib, PeripheralClock, SciFrame, SciParity, SciStopBits};
use crate::ids::UartId;
use crate::pins::{self, Pin};

pub struct UartDriver<'a, B> {
    lib: &'a B,
    timebase: &'a Timebase,
}

impl<'a, B: DriverLib> UartDriver<'a, B> {
    pub(crate) fn new(lib: &'a B, timebase: &'a Timebase) -> Self {
        Self { lib, timebase }
    }

    /// Hand the module's RX/TX pins to the SCI. SCIC has no fixed routing
    /// and is left to the board.
    fn route_pins(&self, id: UartId) {
        let route = |rx: Pin, tx: Pin, mux: u8| {
            protected(self.lib, || {
                self.lib.gpio_set_pin_config(rx.number(), mux);
                self.lib.gpio_set_pin_config(tx.number(), mux);
            });
        };
        match id {
            UartId::SCIA => route(pins::GPIO28_SCIA_RX, pins::GPIO29_SCIA_TX, pins::SCIA_MUX),
            UartId::SCIB => route(pins::GPIO15_SCIB_RX, pins::GPIO14_SCIB_TX, pins::SCIB_MUX),
            _ => {}
        }
    }
}

fn sci_frame(config: &UartConfig) -> HalResult<SciFrame> {
    let word_length = match config.data_bits {
        DataBits::Seven => 7,
        DataBits::Eight => 8,
        // SCI characters are at most 8 bits.
        DataBits::Nine => return Err(HalError::InvalidParam),
    };
    let stop_bits = match config.stop_bits {
        StopBits::One => SciStopBits::One,
        StopBits::Two => SciStopBits::Two,
    };
    let parity = match config.parity {
        Parity::None => SciParity::None,
        Parity::Even => SciParity::Even,
        Parity::Odd => SciParity::Odd,
    };
    Ok(SciFrame {
        word_length,
        stop_bits,
        parity,
    })
}

impl<B: DriverLib> Uart for UartDriver<'_, B> {
    type Id = UartId;

    fn init(&mut self, id: UartId, config: &UartConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        let frame = sci_frame(config)?;

        self.route_pins(id);
        protected(self.lib, || {
            self.lib.sysctl_enable_peripheral(PeripheralClock::Sci(id.index()))
        });

        self.lib.sci_disable_module(base);
        self.lib.sci_set_config(
            base,
            chip::LSPCLK_HZ,
            config.baudrate.bits_per_second(),
            frame,
        );
        self.lib.sci_enable_fifo(base);
        self.lib.sci_enable_module(base);
        self.lib.sci_perform_software_reset(base);

        debug!(
            "sci{} up at {} baud",
            id.index(),
            config.baudrate.bits_per_second()
        );
        Ok(())
    }

    fn deinit(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.sci_disable_module(base);
        protected(self.lib, || {
            self.lib.sysctl_disable_peripheral(PeripheralClock::Sci(id.index()))
        });
        Ok(())
    }

    fn transmit(&mut self, id: UartId, data: &[u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(self.timebase, timeout);
        for &byte in data {
            poll_until(self.timebase, &deadline, || self.lib.sci_is_space_available(base))
                .inspect_err(|_| warn!("sci{} transmit timed out", id.index()))?;
            self.lib.sci_write_char(base, byte);
        }
        Ok(())
    }

    fn receive(&mut self, id: UartId, buf: &mut [u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if buf.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(self.timebase, timeout);
        for slot in buf.iter_mut() {
            poll_until(self.timebase, &deadline, || self.lib.sci_is_data_available(base))
                .inspect_err(|_| debug!("sci{} receive timed out", id.index()))?;
            *slot = self.lib.sci_read_char(base);
        }
        Ok(())
    }

    fn is_busy(&self, id: UartId) -> bool {
        match id.base() {
            Some(base) => self.lib.sci_is_transmitter_busy(base),
            None => false,
        }
    }

    fn data_available(&self, id: UartId) -> bool {
        match id.base() {
            Some(base) => self.lib.sci_is_data_available(base),
            None => false,
        }
    }

    fn flush_rx(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        while self.lib.sci_is_data_available(base) {
            let _ = self.lib.sci_read_char(base);
        }
        Ok(())
    }

    fn flush_tx(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        spin_until(|| !self.lib.sci_is_transmitter_busy(base));
        Ok(())
    }
}
