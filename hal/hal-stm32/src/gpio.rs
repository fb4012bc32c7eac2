//! STM32G4 GPIO driver
//!
//! `set_mode` and `set_pull` re-run `HAL_GPIO_Init` on the one pin: a mode
//! change drops the pull to none and a pull change makes the pin an input.

use xmcu_hal::gpio::{Gpio, GpioConfig, Level, PinId, PinMode, Pull};
use xmcu_hal::HalResult;

use crate::cube::{ClockGate, CubeHal, GpioInit, GpioModeKind, GpioPullKind, GpioSpeed};
use crate::pins::Pin;

pub struct GpioDriver<'a, B> {
    lib: &'a B,
}

fn mode_kind(mode: PinMode) -> (GpioModeKind, u8) {
    match mode {
        PinMode::Input => (GpioModeKind::Input, 0),
        PinMode::Output => (GpioModeKind::OutputPushPull, 0),
        PinMode::Alternate(af) => (GpioModeKind::AlternatePushPull, af),
        PinMode::Analog => (GpioModeKind::Analog, 0),
    }
}

fn pull_kind(pull: Pull) -> GpioPullKind {
    match pull {
        Pull::None => GpioPullKind::NoPull,
        Pull::Up => GpioPullKind::PullUp,
        Pull::Down => GpioPullKind::PullDown,
    }
}

impl<'a, B: CubeHal> GpioDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn configure(&self, pin: Pin, mode: PinMode, pull: Pull) -> HalResult<()> {
        let (port_base, mask) = pin.checked()?;
        let (kind, alternate) = mode_kind(mode);
        self.lib.rcc_enable(ClockGate::GpioPort(pin.port()));
        self.lib.gpio_init(
            port_base,
            &GpioInit {
                pin_mask: mask,
                mode: kind,
                pull: pull_kind(pull),
                speed: GpioSpeed::High,
                alternate,
            },
        );
        Ok(())
    }
}

impl<B: CubeHal> Gpio for GpioDriver<'_, B> {
    type Pin = Pin;

    fn init(&mut self, config: &GpioConfig<Pin>) -> HalResult<()> {
        let (port_base, mask) = config.pin.checked()?;
        if config.mode == PinMode::Output {
            // ODR first so the driver comes up at the requested level.
            self.lib.rcc_enable(ClockGate::GpioPort(config.pin.port()));
            self.lib
                .gpio_write_pin(port_base, mask, config.initial_state.is_high());
        }
        self.configure(config.pin, config.mode, config.pull)?;
        trace!(
            "port {} pin {} init {:?}",
            config.pin.port(),
            config.pin.index(),
            config.mode
        );
        Ok(())
    }

    fn deinit(&mut self, pin: Pin) -> HalResult<()> {
        let (port_base, mask) = pin.checked()?;
        self.lib.gpio_deinit(port_base, mask);
        Ok(())
    }

    fn write(&mut self, pin: Pin, level: Level) -> HalResult<()> {
        let (port_base, mask) = pin.checked()?;
        self.lib.gpio_write_pin(port_base, mask, level.is_high());
        Ok(())
    }

    fn read(&self, pin: Pin) -> Level {
        match pin.checked() {
            Ok((port_base, mask)) => self.lib.gpio_read_pin(port_base, mask).into(),
            Err(_) => Level::Low,
        }
    }

    fn toggle(&mut self, pin: Pin) -> HalResult<()> {
        let (port_base, mask) = pin.checked()?;
        self.lib.gpio_toggle_pin(port_base, mask);
        Ok(())
    }

    fn set_mode(&mut self, pin: Pin, mode: PinMode) -> HalResult<()> {
        self.configure(pin, mode, Pull::None)
    }

    fn set_pull(&mut self, pin: Pin, pull: Pull) -> HalResult<()> {
        self.configure(pin, PinMode::Input, pull)
    }
}
