//! Device constants selected by the chip feature

cfg_if::cfg_if! {
    if #[cfg(feature = "f28p65x")] {
        pub const DEVICE: &str = "F28P65x";
        /// CPU clock in Hz
        pub const CPU_CLOCK_HZ: u32 = 200_000_000;
        /// Low-speed peripheral clock feeding SCI and SPI
        pub const LSPCLK_HZ: u32 = 100_000_000;
    } else if #[cfg(feature = "f28p55x")] {
        pub const DEVICE: &str = "F28P55x";
        /// CPU clock in Hz
        pub const CPU_CLOCK_HZ: u32 = 120_000_000;
        /// Low-speed peripheral clock feeding SCI and SPI
        pub const LSPCLK_HZ: u32 = 60_000_000;
    } else {
        compile_error!("select a C2000 device: enable feature `f28p55x` or `f28p65x`");
    }
}

/// Highest GPIO number on the device.
pub const MAX_GPIO: u32 = 168;

/// CPU Timer0 period giving a 1 ms tick.
pub const TICK_TIMER_PERIOD: u32 = CPU_CLOCK_HZ / 1_000;

/// Fastest bus clock the I2C module supports (Fast mode).
pub const I2C_MAX_BIT_RATE: u32 = 400_000;

/// ADC power-up settling time after enabling the converter.
pub const ADC_POWER_UP_US: u32 = 1_000;

/// Number of start-of-conversion slots; slot `n` converts channel `n`.
pub const ADC_SOC_COUNT: u32 = 16;

/// Acquisition window limits in SYSCLK cycles.
pub const ADC_MIN_SAMPLE_WINDOW: u32 = 1;
pub const ADC_MAX_SAMPLE_WINDOW: u32 = 512;
