//! GPIO (General Purpose Input/Output) abstraction

use crate::error::HalResult;

/// GPIO pin modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Digital input
    Input,
    /// Push-pull output
    Output,
    /// Alternate function (vendor-specific mux/AF number)
    Alternate(u8),
    /// Analog (input buffer disconnected)
    Analog,
}

/// Internal pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Floating (no pull resistor)
    #[default]
    None,
    /// Pull-up to VCC
    Up,
    /// Pull-down to ground
    Down,
}

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Low level (0V)
    #[default]
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    pub const fn toggled(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> bool {
        level.is_high()
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        self.toggled()
    }
}

/// Platform pin identifier.
///
/// Each platform packs a port and an in-port index into an integer in its
/// own way; callers only ever see these accessors.
pub trait PinId: Copy + core::fmt::Debug {
    fn port(&self) -> u8;
    fn index(&self) -> u8;
}

/// Pin configuration applied by [`Gpio::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConfig<P> {
    pub pin: P,
    pub mode: PinMode,
    pub pull: Pull,
    /// Level driven immediately when `mode` is `Output`
    pub initial_state: Level,
}

impl<P> GpioConfig<P> {
    pub const fn output(pin: P, initial_state: Level) -> Self {
        Self {
            pin,
            mode: PinMode::Output,
            pull: Pull::None,
            initial_state,
        }
    }

    pub const fn input(pin: P, pull: Pull) -> Self {
        Self {
            pin,
            mode: PinMode::Input,
            pull,
            initial_state: Level::Low,
        }
    }
}

/// GPIO driver
///
/// Pins are addressed by identifier rather than owned, mirroring how the
/// vendor libraries address them. Pin state lives in the hardware; the
/// driver keeps none.
pub trait Gpio {
    type Pin: PinId;

    /// Enable the port clock if needed, then apply mode, pull and (for
    /// outputs) the initial level.
    fn init(&mut self, config: &GpioConfig<Self::Pin>) -> HalResult<()>;

    /// Return the pin to its reset state: input, no pull.
    fn deinit(&mut self, pin: Self::Pin) -> HalResult<()>;

    fn write(&mut self, pin: Self::Pin, level: Level) -> HalResult<()>;

    /// Sampled pin level. Unrecognised pins read as `Low`.
    fn read(&self, pin: Self::Pin) -> Level;

    fn toggle(&mut self, pin: Self::Pin) -> HalResult<()>;

    /// Reapply the mode. Whether the pull survives is platform defined.
    fn set_mode(&mut self, pin: Self::Pin, mode: PinMode) -> HalResult<()>;

    /// Reapply the pull. Whether the mode survives is platform defined.
    fn set_pull(&mut self, pin: Self::Pin, pull: Pull) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert!(bool::from(Level::High));
        assert_eq!(!Level::Low, Level::High);
        assert_eq!(Level::High.toggled().toggled(), Level::High);
    }

    #[test]
    fn test_config_helpers() {
        let led = GpioConfig::output(5u16, Level::Low);
        assert_eq!(led.mode, PinMode::Output);
        assert_eq!(led.pull, Pull::None);

        let button = GpioConfig::input(13u16, Pull::Up);
        assert_eq!(button.mode, PinMode::Input);
        assert_eq!(button.pull, Pull::Up);
    }
}
