//! Echo console on simulated hardware
//!
//! Keys typed on stdin are fed to the simulated console UART; everything
//! the console sends back is printed once input runs out.

use std::io::{self, Read, Write};

use uart_echo::EchoConsole;
use xmcu_platform::prelude::*;
use xmcu_platform::uart::UartConfig;
use xmcu_platform::{board, HalError, SimBindings};

#[cfg(feature = "ti-c2000")]
fn type_keys(sim: &SimBindings, keys: &[u8]) {
    sim.sci_inject(board::CONSOLE, keys);
}

#[cfg(feature = "ti-c2000")]
fn screen(sim: &SimBindings) -> Vec<u8> {
    sim.sci_sent(board::CONSOLE)
}

#[cfg(not(feature = "ti-c2000"))]
fn type_keys(sim: &SimBindings, keys: &[u8]) {
    sim.usart_inject(board::CONSOLE, keys);
}

#[cfg(not(feature = "ti-c2000"))]
fn screen(sim: &SimBindings) -> Vec<u8> {
    sim.usart_sent(board::CONSOLE)
}

fn main() -> Result<(), HalError> {
    let mut keys = Vec::new();
    io::stdin()
        .read_to_end(&mut keys)
        .map_err(|_| HalError::Error)?;

    let hal = xmcu_platform::simulated();
    let mut system = hal.system();
    system.init()?;

    let mut uart = hal.uart();
    uart.init(board::CONSOLE, &UartConfig::default())?;

    let mut console = EchoConsole::new(board::CONSOLE);
    console.start(&mut uart)?;
    type_keys(hal.bindings(), &keys);
    while console.poll(&mut uart)? {
        system.delay_ms(1);
    }

    io::stdout()
        .write_all(&screen(hal.bindings()))
        .map_err(|_| HalError::Error)?;
    Ok(())
}
