//! STM32Cube HAL/LL binding seam
//!
//! [`CubeHal`] names the STM32G4 Cube HAL and LL calls the drivers make,
//! one method per function, addressing peripherals by their register block
//! base like the LL API does. A target build implements it over the vendor
//! library; host builds use [`crate::sim::SimCube`].

use xmcu_hal::timebase::{Clock, Tick};
use xmcu_hal::{HalError, HalResult};

/// `HAL_StatusTypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CubeStatus {
    Ok,
    Error,
    Busy,
    Timeout,
}

impl From<CubeStatus> for HalResult<()> {
    fn from(status: CubeStatus) -> Self {
        match status {
            CubeStatus::Ok => Ok(()),
            CubeStatus::Error => Err(HalError::Error),
            CubeStatus::Busy => Err(HalError::Busy),
            CubeStatus::Timeout => Err(HalError::Timeout),
        }
    }
}

/// Main PLL fed from HSI (`RCC_OscInitTypeDef`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OscInit {
    pub pll_m: u32,
    pub pll_n: u32,
    pub pll_p: u32,
    pub pll_q: u32,
    pub pll_r: u32,
}

/// Bus clock dividers (`RCC_ClkInitTypeDef`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClkInit {
    pub sysclk_from_pll: bool,
    pub ahb_divider: u32,
    pub apb1_divider: u32,
    pub apb2_divider: u32,
}

/// RCC enable bits touched by the drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockGate {
    GpioPort(u8),
    Uart(u8),
    Spi(u8),
    I2c(u8),
    Adc12,
    Adc345,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioModeKind {
    Input,
    OutputPushPull,
    AlternatePushPull,
    Analog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioPullKind {
    NoPull,
    PullUp,
    PullDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioSpeed {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// `GPIO_InitTypeDef`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioInit {
    pub pin_mask: u16,
    pub mode: GpioModeKind,
    pub pull: GpioPullKind,
    pub speed: GpioSpeed,
    pub alternate: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    Bits7,
    Bits8,
    Bits9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartParity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartStopBits {
    One,
    Two,
}

/// Character frame passed to `LL_USART_ConfigCharacter`. The word length
/// counts the parity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartFrame {
    pub word_length: WordLength,
    pub parity: UsartParity,
    pub stop_bits: UsartStopBits,
}

/// `LL_SPI_Init` subset for 8-bit full-duplex transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiSetup {
    pub master: bool,
    pub clock_idle_high: bool,
    pub capture_second_edge: bool,
    /// BR field: the kernel clock is divided by `2 << prescaler`.
    pub prescaler: u8,
}

/// `LL_I2C_MODE_*` end handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cEndMode {
    /// STOP follows the last byte.
    AutoEnd,
    /// TC is raised after the last byte; the bus is kept.
    SoftEnd,
}

/// `LL_I2C_HandleTransfer` arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cTransfer {
    /// 7-bit address already shifted into bits 7..1
    pub address: u16,
    pub bytes: u8,
    pub read: bool,
    pub end: I2cEndMode,
}

/// Bits of `I2C_ISR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cIsr(pub u32);

impl I2cIsr {
    pub const TXIS: I2cIsr = I2cIsr(1 << 1);
    pub const RXNE: I2cIsr = I2cIsr(1 << 2);
    pub const NACKF: I2cIsr = I2cIsr(1 << 4);
    pub const STOPF: I2cIsr = I2cIsr(1 << 5);
    pub const TC: I2cIsr = I2cIsr(1 << 6);
    pub const BUSY: I2cIsr = I2cIsr(1 << 15);

    pub const fn contains(self, other: I2cIsr) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: I2cIsr) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: I2cIsr) -> I2cIsr {
        I2cIsr(self.0 | other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcResolutionKind {
    Bits12,
    Bits10,
    Bits8,
    Bits6,
}

/// STM32G4 Cube HAL and LL entry points.
pub trait CubeHal {
    // HAL core
    fn hal_init(&self) -> CubeStatus;
    fn hal_deinit(&self) -> CubeStatus;
    fn hal_init_tick(&self, priority: u32) -> CubeStatus;
    fn hal_inc_tick(&self);
    fn hal_get_tick(&self) -> u32;
    fn hal_delay(&self, ms: u32);

    // RCC / PWR
    fn pwr_enable_range1_boost(&self);
    fn rcc_osc_config(&self, osc: &OscInit) -> CubeStatus;
    fn rcc_clock_config(&self, clk: &ClkInit, flash_latency: u32) -> CubeStatus;
    fn rcc_enable(&self, gate: ClockGate);
    fn rcc_disable(&self, gate: ClockGate);
    /// `SystemCoreClock`
    fn system_core_clock(&self) -> u32;
    fn pclk1_freq(&self) -> u32;
    fn pclk2_freq(&self) -> u32;

    // Cortex-M core
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn dwt_enable_cycle_counter(&self) {
        // SAFETY: only DEMCR.TRCENA and the DWT cycle counter are touched.
        let mut core = unsafe { cortex_m::Peripherals::steal() };
        core.DCB.enable_trace();
        core.DWT.set_cycle_count(0);
        core.DWT.enable_cycle_counter();
    }
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    fn dwt_enable_cycle_counter(&self);

    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn dwt_cycle_count(&self) -> u32 {
        cortex_m::peripheral::DWT::cycle_count()
    }
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    fn dwt_cycle_count(&self) -> u32;

    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn nvic_system_reset(&self) -> ! {
        cortex_m::peripheral::SCB::sys_reset()
    }
    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    fn nvic_system_reset(&self) -> !;

    // GPIO
    fn gpio_init(&self, port_base: u32, init: &GpioInit);
    fn gpio_deinit(&self, port_base: u32, pin_mask: u16);
    fn gpio_write_pin(&self, port_base: u32, pin_mask: u16, high: bool);
    fn gpio_read_pin(&self, port_base: u32, pin_mask: u16) -> bool;
    fn gpio_toggle_pin(&self, port_base: u32, pin_mask: u16);

    // USART
    fn usart_disable(&self, base: u32);
    fn usart_config_character(&self, base: u32, frame: &UsartFrame);
    fn usart_set_baud_rate(&self, base: u32, pclk_hz: u32, baud: u32);
    fn usart_enable_fifo(&self, base: u32);
    fn usart_enable_direction_tx_rx(&self, base: u32);
    fn usart_enable(&self, base: u32);
    /// Flush RX data and TX requests through `USART_RQR`.
    fn usart_request_flush(&self, base: u32);
    fn usart_is_tx_not_full(&self, base: u32) -> bool;
    fn usart_is_transfer_complete(&self, base: u32) -> bool;
    fn usart_is_rx_not_empty(&self, base: u32) -> bool;
    fn usart_transmit_data8(&self, base: u32, byte: u8);
    fn usart_receive_data8(&self, base: u32) -> u8;

    // SPI
    fn spi_disable(&self, base: u32);
    fn spi_configure(&self, base: u32, setup: &SpiSetup);
    fn spi_enable(&self, base: u32);
    fn spi_is_tx_empty(&self, base: u32) -> bool;
    fn spi_is_rx_not_empty(&self, base: u32) -> bool;
    fn spi_is_busy(&self, base: u32) -> bool;
    fn spi_transmit_data8(&self, base: u32, byte: u8);
    fn spi_receive_data8(&self, base: u32) -> u8;

    // I2C
    fn i2c_disable(&self, base: u32);
    fn i2c_set_timing(&self, base: u32, timing: u32);
    fn i2c_enable(&self, base: u32);
    /// Program CR2 and generate START (or a repeated START).
    fn i2c_handle_transfer(&self, base: u32, transfer: &I2cTransfer);
    fn i2c_generate_stop(&self, base: u32);
    fn i2c_isr(&self, base: u32) -> I2cIsr;
    fn i2c_clear_flags(&self, base: u32, flags: I2cIsr);
    fn i2c_transmit_data8(&self, base: u32, byte: u8);
    fn i2c_receive_data8(&self, base: u32) -> u8;

    // ADC
    /// Leave deep power-down and start the internal regulator.
    fn adc_enable_regulator(&self, base: u32);
    fn adc_set_resolution(&self, base: u32, resolution: AdcResolutionKind);
    fn adc_set_sampling_time(&self, base: u32, channel: u32, code: u8);
    /// Single-rank regular sequence on `channel`.
    fn adc_set_sequence(&self, base: u32, channel: u32);
    fn adc_enable(&self, base: u32);
    fn adc_disable(&self, base: u32);
    fn adc_is_ready(&self, base: u32) -> bool;
    fn adc_start_conversion(&self, base: u32);
    fn adc_stop_conversion(&self, base: u32);
    fn adc_is_converting(&self, base: u32) -> bool;
    fn adc_is_end_of_conversion(&self, base: u32) -> bool;
    fn adc_clear_end_of_conversion(&self, base: u32);
    fn adc_read_data(&self, base: u32) -> u16;
    fn adc_start_calibration(&self, base: u32);
    fn adc_is_calibrating(&self, base: u32) -> bool;
}

/// `HAL_GetTick` as a [`Clock`].
pub struct CubeTick<'a, B>(pub &'a B);

impl<B: CubeHal> Clock for CubeTick<'_, B> {
    fn now(&self) -> Tick {
        Tick::from_raw(self.0.hal_get_tick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        assert_eq!(HalResult::from(CubeStatus::Ok), Ok(()));
        assert_eq!(HalResult::from(CubeStatus::Busy), Err(HalError::Busy));
        assert_eq!(HalResult::from(CubeStatus::Timeout), Err(HalError::Timeout));
        assert_eq!(HalResult::from(CubeStatus::Error), Err(HalError::Error));
    }

    #[test]
    fn test_isr_flags() {
        let isr = I2cIsr::NACKF.union(I2cIsr::STOPF);
        assert!(isr.contains(I2cIsr::STOPF));
        assert!(isr.intersects(I2cIsr::TXIS.union(I2cIsr::NACKF)));
        assert!(!isr.contains(I2cIsr::TC));
    }
}
