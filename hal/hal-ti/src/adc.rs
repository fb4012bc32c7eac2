//! C2000 ADC driver
//!
//! Start-of-conversion slot `n` is wired to channel `n`, so a channel's
//! acquisition window lives in hardware and the driver stays stateless.
//! ADCINT1 follows the slot of the channel being converted.

use xmcu_hal::adc::{Adc, AdcConfig, AdcResolution, AdcState};
use xmcu_hal::blocking::{poll_until, Deadline, Timeout};
use xmcu_hal::timebase::Timebase;
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::driverlib::{protected, AdcMode, DriverLib, PeripheralClock};
use crate::ids::AdcId;

pub struct AdcDriver<'a, B> {
    lib: &'a B,
    timebase: &'a Timebase,
}

fn check_channel(channel: u32) -> HalResult<u8> {
    if channel < chip::ADC_SOC_COUNT {
        Ok(channel as u8)
    } else {
        Err(HalError::InvalidParam)
    }
}

fn check_window(sampling_time: u32) -> HalResult<u32> {
    if (chip::ADC_MIN_SAMPLE_WINDOW..=chip::ADC_MAX_SAMPLE_WINDOW).contains(&sampling_time) {
        Ok(sampling_time)
    } else {
        Err(HalError::InvalidParam)
    }
}

impl<'a, B: DriverLib> AdcDriver<'a, B> {
    pub(crate) fn new(lib: &'a B, timebase: &'a Timebase) -> Self {
        Self { lib, timebase }
    }

    fn bases(&self, id: AdcId) -> HalResult<(u32, u32)> {
        match (id.base(), id.result_base()) {
            (Some(base), Some(result)) => Ok((base, result)),
            _ => Err(HalError::InvalidParam),
        }
    }
}

impl<B: DriverLib> Adc for AdcDriver<'_, B> {
    type Id = AdcId;

    fn init(&mut self, id: AdcId, config: &AdcConfig) -> HalResult<()> {
        let (base, _) = self.bases(id)?;
        let mode = match config.resolution {
            AdcResolution::Bits12 => AdcMode::Resolution12Bit,
            AdcResolution::Bits16 => AdcMode::Resolution16Bit,
            _ => return Err(HalError::InvalidParam),
        };
        let window = check_window(config.sampling_time)?;

        protected(self.lib, || {
            self.lib.sysctl_enable_peripheral(PeripheralClock::Adc(id.index()));
            self.lib.adc_set_mode(base, mode);
            self.lib.adc_enable_converter(base);
        });
        self.lib.sysctl_delay_us(chip::ADC_POWER_UP_US);

        protected(self.lib, || {
            for soc in 0..chip::ADC_SOC_COUNT {
                self.lib.adc_setup_soc(base, soc as u8, soc, window);
            }
            self.lib.adc_set_interrupt_source(base, 0);
        });
        self.lib.adc_clear_interrupt_status(base);
        debug!("adc{} up, {} bit", id.index(), config.resolution.bits());
        Ok(())
    }

    fn deinit(&mut self, id: AdcId) -> HalResult<()> {
        let (base, _) = self.bases(id)?;
        protected(self.lib, || {
            self.lib.adc_disable_converter(base);
            self.lib.sysctl_disable_peripheral(PeripheralClock::Adc(id.index()));
        });
        Ok(())
    }

    fn config_channel(&mut self, id: AdcId, channel: u32, sampling_time: u32) -> HalResult<()> {
        let (base, _) = self.bases(id)?;
        let soc = check_channel(channel)?;
        let window = check_window(sampling_time)?;
        protected(self.lib, || self.lib.adc_setup_soc(base, soc, channel, window));
        Ok(())
    }

    fn start_conversion(&mut self, id: AdcId) -> HalResult<()> {
        let (base, _) = self.bases(id)?;
        if self.lib.adc_is_busy(base) {
            return Err(HalError::Busy);
        }
        let soc = self.lib.adc_get_interrupt_source(base);
        self.lib.adc_clear_interrupt_status(base);
        self.lib.adc_force_soc(base, soc);
        Ok(())
    }

    fn stop_conversion(&mut self, id: AdcId) -> HalResult<()> {
        // A forced conversion cannot be aborted; drop its completion flag.
        let (base, _) = self.bases(id)?;
        self.lib.adc_clear_interrupt_status(base);
        Ok(())
    }

    fn read_single(&mut self, id: AdcId, channel: u32, timeout: Timeout) -> HalResult<u32> {
        let (base, result_base) = self.bases(id)?;
        let soc = check_channel(channel)?;
        if self.lib.adc_is_busy(base) {
            return Err(HalError::Busy);
        }
        protected(self.lib, || self.lib.adc_set_interrupt_source(base, soc));
        self.lib.adc_clear_interrupt_status(base);
        self.lib.adc_force_soc(base, soc);

        let deadline = Deadline::arm(self.timebase, timeout);
        poll_until(self.timebase, &deadline, || self.lib.adc_get_interrupt_status(base))
            .inspect_err(|_| warn!("adc{} ch{} conversion timed out", id.index(), channel))?;
        self.lib.adc_clear_interrupt_status(base);
        Ok(self.lib.adc_read_result(result_base, soc) as u32)
    }

    fn state(&self, id: AdcId) -> AdcState {
        let Some(base) = id.base() else {
            return AdcState::Idle;
        };
        if self.lib.adc_get_interrupt_status(base) {
            AdcState::Complete
        } else if self.lib.adc_is_busy(base) {
            AdcState::Converting
        } else {
            AdcState::Idle
        }
    }

    fn get_value(&self, id: AdcId) -> u32 {
        match (id.base(), id.result_base()) {
            (Some(base), Some(result_base)) => {
                let soc = self.lib.adc_get_interrupt_source(base);
                self.lib.adc_read_result(result_base, soc) as u32
            }
            _ => 0,
        }
    }

    fn calibrate(&mut self, id: AdcId) -> HalResult<()> {
        let (base, _) = self.bases(id)?;
        protected(self.lib, || self.lib.adc_set_offset_trim(base));
        Ok(())
    }
}
