//! STM32G4 ADC driver
//!
//! Conversions run one regular rank at a time: `read_single` points rank 1
//! at the channel and waits for EOC. Per-channel sampling times live in the
//! SMPRx registers.

use xmcu_hal::adc::{Adc, AdcConfig, AdcResolution, AdcState};
use xmcu_hal::blocking::{poll_until, Deadline, Timeout};
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::cube::{AdcResolutionKind, CubeHal, CubeTick};
use crate::ids::AdcId;

pub struct AdcDriver<'a, B> {
    lib: &'a B,
}

fn check_channel(channel: u32) -> HalResult<u32> {
    if channel < chip::ADC_CHANNEL_COUNT {
        Ok(channel)
    } else {
        Err(HalError::InvalidParam)
    }
}

fn sampling_code(cycles: u32) -> HalResult<u8> {
    chip::adc_sampling_code(cycles).ok_or(HalError::InvalidParam)
}

impl<'a, B: CubeHal> AdcDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn clock(&self) -> CubeTick<'a, B> {
        CubeTick(self.lib)
    }

    fn enable(&self, base: u32) -> HalResult<()> {
        self.lib.adc_enable(base);
        let clock = self.clock();
        let deadline = Deadline::arm(&clock, Timeout::from_millis(chip::ADC_READY_TIMEOUT_MS));
        poll_until(&clock, &deadline, || self.lib.adc_is_ready(base))
    }
}

impl<B: CubeHal> Adc for AdcDriver<'_, B> {
    type Id = AdcId;

    fn init(&mut self, id: AdcId, config: &AdcConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        let resolution = match config.resolution {
            AdcResolution::Bits12 => AdcResolutionKind::Bits12,
            AdcResolution::Bits10 => AdcResolutionKind::Bits10,
            AdcResolution::Bits8 => AdcResolutionKind::Bits8,
            AdcResolution::Bits6 => AdcResolutionKind::Bits6,
            AdcResolution::Bits16 => return Err(HalError::InvalidParam),
        };
        let code = sampling_code(config.sampling_time)?;

        self.lib.rcc_enable(id.clock());
        self.lib.adc_enable_regulator(base);
        // Regulator start-up, rounded up to the tick.
        self.lib.hal_delay(chip::ADC_REGULATOR_SETTLE_US.div_ceil(1_000));
        self.lib.adc_set_resolution(base, resolution);
        for channel in 0..chip::ADC_CHANNEL_COUNT {
            self.lib.adc_set_sampling_time(base, channel, code);
        }
        self.enable(base)
            .inspect_err(|_| warn!("adc{} never became ready", id.index() + 1))?;
        debug!("adc{} up, {} bit", id.index() + 1, config.resolution.bits());
        Ok(())
    }

    fn deinit(&mut self, id: AdcId) -> HalResult<()> {
        // The kernel clock is shared with the sibling ADCs and stays on.
        let base = id.checked_base()?;
        self.lib.adc_stop_conversion(base);
        self.lib.adc_disable(base);
        Ok(())
    }

    fn config_channel(&mut self, id: AdcId, channel: u32, sampling_time: u32) -> HalResult<()> {
        let base = id.checked_base()?;
        let channel = check_channel(channel)?;
        let code = sampling_code(sampling_time)?;
        self.lib.adc_set_sampling_time(base, channel, code);
        Ok(())
    }

    fn start_conversion(&mut self, id: AdcId) -> HalResult<()> {
        let base = id.checked_base()?;
        if self.lib.adc_is_converting(base) {
            return Err(HalError::Busy);
        }
        self.lib.adc_clear_end_of_conversion(base);
        self.lib.adc_start_conversion(base);
        Ok(())
    }

    fn stop_conversion(&mut self, id: AdcId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.adc_stop_conversion(base);
        self.lib.adc_clear_end_of_conversion(base);
        Ok(())
    }

    fn read_single(&mut self, id: AdcId, channel: u32, timeout: Timeout) -> HalResult<u32> {
        let base = id.checked_base()?;
        let channel = check_channel(channel)?;
        if self.lib.adc_is_converting(base) {
            return Err(HalError::Busy);
        }
        self.lib.adc_set_sequence(base, channel);
        self.lib.adc_clear_end_of_conversion(base);
        self.lib.adc_start_conversion(base);

        let clock = self.clock();
        let deadline = Deadline::arm(&clock, timeout);
        poll_until(&clock, &deadline, || self.lib.adc_is_end_of_conversion(base))
            .inspect_err(|_| warn!("adc{} ch{} conversion timed out", id.index() + 1, channel))?;
        let value = self.lib.adc_read_data(base);
        self.lib.adc_clear_end_of_conversion(base);
        Ok(value as u32)
    }

    fn state(&self, id: AdcId) -> AdcState {
        let Some(base) = id.base() else {
            return AdcState::Idle;
        };
        if self.lib.adc_is_end_of_conversion(base) {
            AdcState::Complete
        } else if self.lib.adc_is_converting(base) {
            AdcState::Converting
        } else {
            AdcState::Idle
        }
    }

    fn get_value(&self, id: AdcId) -> u32 {
        id.base()
            .map_or(0, |base| self.lib.adc_read_data(base) as u32)
    }

    fn calibrate(&mut self, id: AdcId) -> HalResult<()> {
        // ADCAL only runs with the converter disabled.
        let base = id.checked_base()?;
        self.lib.adc_disable(base);
        self.lib.adc_start_calibration(base);
        let clock = self.clock();
        let deadline = Deadline::arm(
            &clock,
            Timeout::from_millis(chip::ADC_CALIBRATION_TIMEOUT_MS),
        );
        poll_until(&clock, &deadline, || !self.lib.adc_is_calibrating(base))
            .inspect_err(|_| warn!("adc{} calibration timed out", id.index() + 1))?;
        self.enable(base)
    }
}
