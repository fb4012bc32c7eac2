//! DriverLib binding seam
//!
//! [`DriverLib`] lists the C2000Ware DriverLib entry points the drivers
//! call, one method per function, taking module base addresses exactly as
//! DriverLib does. A target build implements it over the vendor library;
//! host builds use [`crate::sim::SimDriverLib`].

/// Pin direction (`GPIO_setDirectionMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    In,
    Out,
}

/// Pad configuration (`GPIO_setPadConfig`). The pads have no pull-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PadConfig {
    Std,
    Pullup,
}

/// Input qualification (`GPIO_setQualificationMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Qualification {
    Sync,
    Async,
}

/// Peripheral clock gates (`SysCtl_enablePeripheral`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralClock {
    Timer(u8),
    Sci(u8),
    Spi(u8),
    I2c(u8),
    Adc(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SciStopBits {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SciParity {
    None,
    Even,
    Odd,
}

/// Frame format passed to `SCI_setConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SciFrame {
    /// Character length, 1..=8
    pub word_length: u8,
    pub stop_bits: SciStopBits,
    pub parity: SciParity,
}

/// `SPI_PROT_POLxPHAy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiProtocol {
    Pol0Pha0,
    Pol0Pha1,
    Pol1Pha0,
    Pol1Pha1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRole {
    Controller,
    Peripheral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cDirection {
    ControllerSend,
    ControllerReceive,
}

/// Bits of `I2C_getStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cStatus(pub u16);

impl I2cStatus {
    pub const NO_ACK: I2cStatus = I2cStatus(0x0002);
    pub const REG_ACCESS_READY: I2cStatus = I2cStatus(0x0004);
    pub const RX_DATA_READY: I2cStatus = I2cStatus(0x0008);
    pub const TX_DATA_READY: I2cStatus = I2cStatus(0x0010);
    pub const STOP_CONDITION: I2cStatus = I2cStatus(0x0020);
    pub const BUS_BUSY: I2cStatus = I2cStatus(0x1000);

    pub const fn contains(self, other: I2cStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: I2cStatus) -> I2cStatus {
        I2cStatus(self.0 | other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcMode {
    Resolution12Bit,
    Resolution16Bit,
}

pub trait DriverLib {
    // Protected register access
    fn eallow(&self);
    fn edis(&self);

    // SysCtl
    fn sysctl_device_cal(&self);
    fn sysctl_set_clock(&self, cpu_hz: u32) -> bool;
    fn sysctl_disable_watchdog(&self);
    fn sysctl_enable_peripheral(&self, clock: PeripheralClock);
    fn sysctl_disable_peripheral(&self, clock: PeripheralClock);
    fn sysctl_delay_us(&self, us: u32);
    fn sysctl_reset_device(&self);

    // Interrupt / PIE
    fn interrupt_disable_global(&self);
    fn interrupt_enable_global(&self);
    fn interrupt_init_module(&self);
    fn interrupt_init_vector_table(&self);
    fn interrupt_clear_all_flags(&self);
    fn interrupt_ack_group1(&self);

    // CPU Timer0 as the millisecond tick source
    fn cpu_timer0_start_periodic(&self, period_cycles: u32);
    fn cpu_timer0_stop(&self);

    // GPIO
    fn gpio_set_pin_config(&self, pin: u32, mux: u8);
    fn gpio_set_direction_mode(&self, pin: u32, direction: Direction);
    fn gpio_set_pad_config(&self, pin: u32, pad: PadConfig);
    fn gpio_set_qualification_mode(&self, pin: u32, qualification: Qualification);
    fn gpio_set_analog_mode(&self, pin: u32, enabled: bool);
    fn gpio_write_pin(&self, pin: u32, high: bool);
    fn gpio_read_pin(&self, pin: u32) -> bool;
    fn gpio_toggle_pin(&self, pin: u32);

    // SCI
    fn sci_set_config(&self, base: u32, lspclk_hz: u32, baud: u32, frame: SciFrame);
    fn sci_enable_fifo(&self, base: u32);
    fn sci_enable_module(&self, base: u32);
    fn sci_disable_module(&self, base: u32);
    fn sci_perform_software_reset(&self, base: u32);
    fn sci_is_space_available(&self, base: u32) -> bool;
    fn sci_is_transmitter_busy(&self, base: u32) -> bool;
    fn sci_is_data_available(&self, base: u32) -> bool;
    fn sci_write_char(&self, base: u32, byte: u8);
    fn sci_read_char(&self, base: u32) -> u8;

    // SPI
    fn spi_set_config(
        &self,
        base: u32,
        lspclk_hz: u32,
        protocol: SpiProtocol,
        role: SpiRole,
        bit_rate: u32,
        data_width: u8,
    );
    fn spi_enable_fifo(&self, base: u32);
    fn spi_enable_module(&self, base: u32);
    fn spi_disable_module(&self, base: u32);
    fn spi_tx_fifo_has_space(&self, base: u32) -> bool;
    fn spi_rx_fifo_has_data(&self, base: u32) -> bool;
    fn spi_is_busy(&self, base: u32) -> bool;
    /// Data must be left-justified for widths below 16 bits.
    fn spi_write_data(&self, base: u32, data: u16);
    /// Data comes back right-justified.
    fn spi_read_data(&self, base: u32) -> u16;

    // I2C
    fn i2c_init_controller(&self, base: u32, sysclk_hz: u32, bit_rate: u32);
    fn i2c_enable_module(&self, base: u32);
    fn i2c_disable_module(&self, base: u32);
    fn i2c_set_target_address(&self, base: u32, address: u16);
    fn i2c_set_data_count(&self, base: u32, count: u16);
    fn i2c_set_direction(&self, base: u32, direction: I2cDirection);
    fn i2c_send_start(&self, base: u32);
    fn i2c_send_stop(&self, base: u32);
    fn i2c_put_data(&self, base: u32, byte: u8);
    fn i2c_get_data(&self, base: u32) -> u8;
    fn i2c_get_status(&self, base: u32) -> I2cStatus;
    fn i2c_clear_status(&self, base: u32, status: I2cStatus);

    // ADC
    fn adc_set_mode(&self, base: u32, mode: AdcMode);
    fn adc_enable_converter(&self, base: u32);
    fn adc_disable_converter(&self, base: u32);
    fn adc_setup_soc(&self, base: u32, soc: u8, channel: u32, sample_window: u32);
    fn adc_set_interrupt_source(&self, base: u32, soc: u8);
    fn adc_get_interrupt_source(&self, base: u32) -> u8;
    fn adc_force_soc(&self, base: u32, soc: u8);
    fn adc_is_busy(&self, base: u32) -> bool;
    fn adc_get_interrupt_status(&self, base: u32) -> bool;
    fn adc_clear_interrupt_status(&self, base: u32);
    fn adc_set_offset_trim(&self, base: u32);
    fn adc_read_result(&self, result_base: u32, soc: u8) -> u16;
}

/// Runs `f` with protected registers unlocked (`EALLOW` ... `EDIS`).
pub(crate) fn protected<B: DriverLib + ?Sized, R>(lib: &B, f: impl FnOnce() -> R) -> R {
    lib.eallow();
    let out = f();
    lib.edis();
    out
}
