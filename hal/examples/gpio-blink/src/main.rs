//! Blink loop on simulated hardware

use gpio_blink::{blink, button_pressed, configure};
use xmcu_platform::prelude::*;
use xmcu_platform::{board, HalError, PLATFORM_NAME};

const CYCLES: u32 = 3;

fn main() -> Result<(), HalError> {
    let hal = xmcu_platform::simulated();
    let mut system = hal.system();
    system.init()?;

    let mut gpio = hal.gpio();
    configure(&mut gpio, board::LED, board::BUTTON)?;
    println!("{PLATFORM_NAME}: blinking {:?}", board::LED);

    for cycle in 1..=CYCLES {
        blink(&mut gpio, &system, board::LED)?;
        println!(
            "cycle {cycle} done at {} ms, button pressed: {}",
            system.get_tick().raw(),
            button_pressed(&gpio, board::BUTTON)
        );
    }
    Ok(())
}
