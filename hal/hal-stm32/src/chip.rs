//! STM32G4 clock tree and device constants

use crate::cube::{ClkInit, OscInit};

pub const DEVICE: &str = "STM32G4";

/// Internal 16 MHz oscillator, the PLL input
pub const HSI_HZ: u32 = 16_000_000;

/// HSI / M * N / R = 16 MHz / 4 * 85 / 2
pub const SYSCLK_HZ: u32 = 170_000_000;

pub const OSC_INIT: OscInit = OscInit {
    pll_m: 4,
    pll_n: 85,
    pll_p: 2,
    pll_q: 2,
    pll_r: 2,
};

/// SYSCLK from PLL, AHB and both APB buses undivided.
pub const CLK_INIT: ClkInit = ClkInit {
    sysclk_from_pll: true,
    ahb_divider: 1,
    apb1_divider: 1,
    apb2_divider: 1,
};

/// Flash wait states for 170 MHz in range 1 boost mode.
pub const FLASH_LATENCY: u32 = 4;

/// SysTick priority handed to `HAL_InitTick`.
pub const TICK_PRIORITY: u32 = 0x0F;

/// Ports A..G
pub const GPIO_PORT_COUNT: u8 = 7;
pub const GPIO_PINS_PER_PORT: u8 = 16;
pub const GPIO_BASE: u32 = 0x4800_0000;
pub const GPIO_PORT_STRIDE: u32 = 0x400;

/// I2C TIMINGR values for a 170 MHz kernel clock.
pub const I2C_TIMING_STANDARD: u32 = 0x30A0_A7FB;
pub const I2C_TIMING_FAST: u32 = 0x1080_2D9B;
pub const I2C_TIMING_FAST_PLUS: u32 = 0x0080_2172;

/// One transfer moves at most this many bytes (NBYTES without reload).
pub const I2C_MAX_TRANSFER: usize = 255;

/// Regular channels 0..=18
pub const ADC_CHANNEL_COUNT: u32 = 19;

/// Sampling times selectable through SMPx, rounded up to whole cycles
/// (2.5, 6.5, 12.5, 24.5, 47.5, 92.5, 247.5, 640.5).
pub const ADC_SAMPLE_CYCLES: [u32; 8] = [3, 7, 13, 25, 48, 93, 248, 641];

/// Internal regulator start-up time before the ADC may be enabled.
pub const ADC_REGULATOR_SETTLE_US: u32 = 20;

/// Bounds for ADRDY and calibration waits, in milliseconds.
pub const ADC_READY_TIMEOUT_MS: u32 = 10;
pub const ADC_CALIBRATION_TIMEOUT_MS: u32 = 10;

/// TIMINGR for the fastest standard mode not above `frequency`.
pub const fn i2c_timing(frequency: u32) -> u32 {
    if frequency <= 100_000 {
        I2C_TIMING_STANDARD
    } else if frequency <= 400_000 {
        I2C_TIMING_FAST
    } else {
        I2C_TIMING_FAST_PLUS
    }
}

/// SMPx code for the shortest sampling time of at least `cycles`.
pub fn adc_sampling_code(cycles: u32) -> Option<u8> {
    ADC_SAMPLE_CYCLES
        .iter()
        .position(|&c| c >= cycles)
        .map(|code| code as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pll_yields_sysclk() {
        let vco = HSI_HZ / OSC_INIT.pll_m * OSC_INIT.pll_n;
        assert_eq!(vco / OSC_INIT.pll_r, SYSCLK_HZ);
    }

    #[test]
    fn test_i2c_timing_selection() {
        assert_eq!(i2c_timing(100_000), I2C_TIMING_STANDARD);
        assert_eq!(i2c_timing(100_001), I2C_TIMING_FAST);
        assert_eq!(i2c_timing(1_000_000), I2C_TIMING_FAST_PLUS);
    }

    #[test]
    fn test_sampling_code_rounds_up() {
        assert_eq!(adc_sampling_code(0), Some(0));
        assert_eq!(adc_sampling_code(15), Some(3));
        assert_eq!(adc_sampling_code(641), Some(7));
        assert_eq!(adc_sampling_code(642), None);
    }
}
