//! LED blink at 1 Hz with a pulled-up button input
//!
//! ```text
//! cargo run -p gpio-blink --features sim
//! cargo run -p gpio-blink --no-default-features --features ti-c2000,sim
//! ```

#![no_std]

use xmcu_platform::gpio::{Gpio, GpioConfig, Level, Pull};
use xmcu_platform::system::System;
use xmcu_platform::HalResult;

/// LED on time and off time.
pub const HALF_PERIOD_MS: u32 = 500;

/// LED as a low output, button as an input with pull-up.
pub fn configure<G: Gpio>(gpio: &mut G, led: G::Pin, button: G::Pin) -> HalResult<()> {
    gpio.init(&GpioConfig::output(led, Level::Low))?;
    gpio.init(&GpioConfig::input(button, Pull::Up))
}

/// One on/off cycle.
pub fn blink<G, S>(gpio: &mut G, system: &S, led: G::Pin) -> HalResult<()>
where
    G: Gpio,
    S: System + ?Sized,
{
    gpio.write(led, Level::High)?;
    system.delay_ms(HALF_PERIOD_MS);
    gpio.write(led, Level::Low)?;
    system.delay_ms(HALF_PERIOD_MS);
    Ok(())
}

/// Pressing the button pulls the line low.
pub fn button_pressed<G: Gpio>(gpio: &G, button: G::Pin) -> bool {
    gpio.read(button) == Level::Low
}
