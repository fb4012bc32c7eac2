//! C2000 GPIO driver

use xmcu_hal::gpio::{Gpio, GpioConfig, Level, PinMode, Pull};
use xmcu_hal::HalResult;

use crate::driverlib::{protected, Direction, DriverLib, PadConfig, Qualification};
use crate::pins::Pin;

/// Mux index of the plain GPIO function.
const GPIO_MUX: u8 = 0;

pub struct GpioDriver<'a, B> {
    lib: &'a B,
}

impl<'a, B: DriverLib> GpioDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn apply_mode(&self, pin: u32, mode: PinMode, initial: Level) {
        match mode {
            PinMode::Output => {
                self.lib.gpio_set_pin_config(pin, GPIO_MUX);
                self.lib.gpio_set_analog_mode(pin, false);
                // Latch the level first so the pin never glitches.
                self.lib.gpio_write_pin(pin, initial.is_high());
                self.lib.gpio_set_direction_mode(pin, Direction::Out);
            }
            PinMode::Input => {
                self.lib.gpio_set_pin_config(pin, GPIO_MUX);
                self.lib.gpio_set_analog_mode(pin, false);
                self.lib.gpio_set_direction_mode(pin, Direction::In);
                self.lib.gpio_set_qualification_mode(pin, Qualification::Async);
            }
            PinMode::Alternate(mux) => {
                self.lib.gpio_set_analog_mode(pin, false);
                self.lib.gpio_set_pin_config(pin, mux);
            }
            PinMode::Analog => {
                self.lib.gpio_set_direction_mode(pin, Direction::In);
                self.lib.gpio_set_analog_mode(pin, true);
            }
        }
    }
}

fn pad_for(pull: Pull) -> PadConfig {
    match pull {
        Pull::Up => PadConfig::Pullup,
        // No pull-down on these pads.
        Pull::None | Pull::Down => PadConfig::Std,
    }
}

impl<B: DriverLib> Gpio for GpioDriver<'_, B> {
    type Pin = Pin;

    fn init(&mut self, config: &GpioConfig<Pin>) -> HalResult<()> {
        let pin = config.pin.checked()?;
        protected(self.lib, || {
            self.lib.gpio_set_pad_config(pin, pad_for(config.pull));
            self.apply_mode(pin, config.mode, config.initial_state);
        });
        trace!("gpio{} init {:?}", pin, config.mode);
        Ok(())
    }

    fn deinit(&mut self, pin: Pin) -> HalResult<()> {
        let pin = pin.checked()?;
        protected(self.lib, || {
            self.lib.gpio_set_direction_mode(pin, Direction::In);
            self.lib.gpio_set_pad_config(pin, PadConfig::Std);
        });
        Ok(())
    }

    fn write(&mut self, pin: Pin, level: Level) -> HalResult<()> {
        let pin = pin.checked()?;
        self.lib.gpio_write_pin(pin, level.is_high());
        Ok(())
    }

    fn read(&self, pin: Pin) -> Level {
        match pin.checked() {
            Ok(pin) => self.lib.gpio_read_pin(pin).into(),
            Err(_) => Level::Low,
        }
    }

    fn toggle(&mut self, pin: Pin) -> HalResult<()> {
        let pin = pin.checked()?;
        self.lib.gpio_toggle_pin(pin);
        Ok(())
    }

    fn set_mode(&mut self, pin: Pin, mode: PinMode) -> HalResult<()> {
        let pin = pin.checked()?;
        // Outputs keep whatever level is already latched.
        let latched = self.lib.gpio_read_pin(pin).into();
        protected(self.lib, || self.apply_mode(pin, mode, latched));
        Ok(())
    }

    fn set_pull(&mut self, pin: Pin, pull: Pull) -> HalResult<()> {
        let pin = pin.checked()?;
        protected(self.lib, || self.lib.gpio_set_pad_config(pin, pad_for(pull)));
        Ok(())
    }
}
