//! ADC (Analog-to-Digital Converter) abstraction

use crate::blocking::Timeout;
use crate::error::{HalError, HalResult};

/// ADC resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcResolution {
    Bits6,
    Bits8,
    Bits10,
    Bits12,
    Bits16,
}

impl AdcResolution {
    pub const fn bits(self) -> u32 {
        match self {
            AdcResolution::Bits6 => 6,
            AdcResolution::Bits8 => 8,
            AdcResolution::Bits10 => 10,
            AdcResolution::Bits12 => 12,
            AdcResolution::Bits16 => 16,
        }
    }

    /// Largest code a conversion can produce.
    pub const fn max_value(self) -> u32 {
        (1 << self.bits()) - 1
    }
}

/// ADC configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    pub resolution: AdcResolution,
    /// Default acquisition window in ADC clock cycles
    pub sampling_time: u32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            resolution: AdcResolution::Bits12,
            sampling_time: 15,
        }
    }
}

/// Conversion state of one converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcState {
    /// No conversion pending
    Idle,
    /// Conversion started, result not yet latched
    Converting,
    /// Result ready to read
    Complete,
}

/// Scales a raw conversion result to millivolts.
///
/// `value * vref_mv / (2^resolution - 1)` in integer arithmetic, truncating.
/// A resolution of zero yields zero.
pub fn to_voltage(value: u32, resolution: u32, vref_mv: u32) -> u32 {
    if resolution == 0 || resolution > 32 {
        return 0;
    }
    let full_scale = (1u64 << resolution) - 1;
    ((value as u64 * vref_mv as u64) / full_scale) as u32
}

/// Single-conversion ADC driver
pub trait Adc {
    type Id: Copy + core::fmt::Debug;

    fn init(&mut self, id: Self::Id, config: &AdcConfig) -> HalResult<()>;

    fn deinit(&mut self, id: Self::Id) -> HalResult<()>;

    /// Set the acquisition window for `channel`.
    fn config_channel(&mut self, id: Self::Id, channel: u32, sampling_time: u32)
        -> HalResult<()>;

    /// Trigger a conversion of the most recently selected channel.
    fn start_conversion(&mut self, id: Self::Id) -> HalResult<()>;

    fn stop_conversion(&mut self, id: Self::Id) -> HalResult<()>;

    /// Select `channel`, convert it and return the raw result.
    fn read_single(&mut self, id: Self::Id, channel: u32, timeout: Timeout) -> HalResult<u32>;

    fn state(&self, id: Self::Id) -> AdcState;

    /// Latest conversion result; zero for invalid ids.
    fn get_value(&self, id: Self::Id) -> u32;

    /// Run the converter's self-calibration.
    fn calibrate(&mut self, id: Self::Id) -> HalResult<()>;

    fn is_conversion_complete(&self, id: Self::Id) -> bool {
        self.state(id) == AdcState::Complete
    }

    /// Convert each of `channels` in turn into the matching slot of
    /// `values`. Each channel gets the full `timeout`.
    fn read_multiple(
        &mut self,
        id: Self::Id,
        channels: &[u32],
        values: &mut [u32],
        timeout: Timeout,
    ) -> HalResult<()> {
        if channels.is_empty() || channels.len() != values.len() {
            return Err(HalError::InvalidParam);
        }
        for (channel, value) in channels.iter().zip(values.iter_mut()) {
            *value = self.read_single(id, *channel, timeout)?;
        }
        Ok(())
    }
}
