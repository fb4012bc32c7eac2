//! STM32G4 USART driver

use xmcu_hal::blocking::{poll_until, spin_until, Deadline, Timeout};
use xmcu_hal::gpio::PinId;
use xmcu_hal::uart::{DataBits, Parity, StopBits, Uart, UartConfig};
use xmcu_hal::{HalError, HalResult};

use crate::cube::{
    ClockGate, CubeHal, CubeTick, GpioInit, GpioModeKind, GpioPullKind, GpioSpeed, UsartFrame,
    UsartParity, UsartStopBits, WordLength,
};
use crate::ids::UartId;
use crate::pins::Pin;

pub struct UartDriver<'a, B> {
    lib: &'a B,
}

/// The USART word includes the parity bit, so data plus parity must land
/// on 7, 8 or 9 bits.
fn usart_frame(config: &UartConfig) -> HalResult<UsartFrame> {
    let parity_bits = u8::from(config.parity != Parity::None);
    let word_length = match config.data_bits.count() + parity_bits {
        7 => WordLength::Bits7,
        8 => WordLength::Bits8,
        9 => WordLength::Bits9,
        _ => return Err(HalError::InvalidParam),
    };
    let parity = match config.parity {
        Parity::None => UsartParity::None,
        Parity::Even => UsartParity::Even,
        Parity::Odd => UsartParity::Odd,
    };
    let stop_bits = match config.stop_bits {
        StopBits::One => UsartStopBits::One,
        StopBits::Two => UsartStopBits::Two,
    };
    Ok(UsartFrame {
        word_length,
        parity,
        stop_bits,
    })
}

impl<'a, B: CubeHal> UartDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn clock(&self) -> CubeTick<'a, B> {
        CubeTick(self.lib)
    }

    fn route_pin(&self, pin: Pin, alternate: u8) -> HalResult<()> {
        let (port_base, mask) = pin.checked()?;
        self.lib.rcc_enable(ClockGate::GpioPort(pin.port()));
        self.lib.gpio_init(
            port_base,
            &GpioInit {
                pin_mask: mask,
                mode: GpioModeKind::AlternatePushPull,
                pull: GpioPullKind::NoPull,
                speed: GpioSpeed::VeryHigh,
                alternate,
            },
        );
        Ok(())
    }

    fn kernel_clock(&self, id: UartId) -> u32 {
        if id.on_apb2() {
            self.lib.pclk2_freq()
        } else {
            self.lib.pclk1_freq()
        }
    }
}

impl<B: CubeHal> Uart for UartDriver<'_, B> {
    type Id = UartId;

    fn init(&mut self, id: UartId, config: &UartConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        let frame = usart_frame(config)?;
        let route = id.pins().ok_or(HalError::InvalidParam)?;

        self.route_pin(route.tx, route.alternate)?;
        self.route_pin(route.rx, route.alternate)?;
        self.lib.rcc_enable(id.clock());

        self.lib.usart_disable(base);
        self.lib.usart_config_character(base, &frame);
        self.lib.usart_set_baud_rate(
            base,
            self.kernel_clock(id),
            config.baudrate.bits_per_second(),
        );
        self.lib.usart_enable_fifo(base);
        self.lib.usart_enable_direction_tx_rx(base);
        self.lib.usart_enable(base);
        self.lib.usart_request_flush(base);

        debug!(
            "usart{} up at {} baud",
            id.index() + 1,
            config.baudrate.bits_per_second()
        );
        Ok(())
    }

    fn deinit(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.usart_disable(base);
        self.lib.rcc_disable(id.clock());
        Ok(())
    }

    fn transmit(&mut self, id: UartId, data: &[u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let clock = self.clock();
        let deadline = Deadline::arm(&clock, timeout);
        for &byte in data {
            poll_until(&clock, &deadline, || self.lib.usart_is_tx_not_full(base))
                .inspect_err(|_| warn!("usart{} transmit timed out", id.index() + 1))?;
            self.lib.usart_transmit_data8(base, byte);
        }
        Ok(())
    }

    fn receive(&mut self, id: UartId, buf: &mut [u8], timeout: Timeout) -> HalResult<()> {
        let base = id.checked_base()?;
        if buf.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let clock = self.clock();
        let deadline = Deadline::arm(&clock, timeout);
        for slot in buf.iter_mut() {
            poll_until(&clock, &deadline, || self.lib.usart_is_rx_not_empty(base))
                .inspect_err(|_| debug!("usart{} receive timed out", id.index() + 1))?;
            *slot = self.lib.usart_receive_data8(base);
        }
        Ok(())
    }

    fn is_busy(&self, id: UartId) -> bool {
        id.base()
            .is_some_and(|base| !self.lib.usart_is_transfer_complete(base))
    }

    fn data_available(&self, id: UartId) -> bool {
        id.base()
            .is_some_and(|base| self.lib.usart_is_rx_not_empty(base))
    }

    fn flush_rx(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        while self.lib.usart_is_rx_not_empty(base) {
            let _ = self.lib.usart_receive_data8(base);
        }
        Ok(())
    }

    fn flush_tx(&mut self, id: UartId) -> HalResult<()> {
        let base = id.checked_base()?;
        spin_until(|| self.lib.usart_is_transfer_complete(base));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_length_counts_parity() {
        let mut config = UartConfig::default();
        assert_eq!(usart_frame(&config).unwrap().word_length, WordLength::Bits8);

        config.parity = Parity::Even;
        assert_eq!(usart_frame(&config).unwrap().word_length, WordLength::Bits9);

        config.data_bits = DataBits::Seven;
        assert_eq!(usart_frame(&config).unwrap().word_length, WordLength::Bits8);

        config.data_bits = DataBits::Nine;
        assert_eq!(usart_frame(&config), Err(HalError::InvalidParam));
    }
}
