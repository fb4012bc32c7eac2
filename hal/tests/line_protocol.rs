//! Line helpers against a scripted UART.

use std::cell::Cell;
use std::collections::VecDeque;

use xmcu_hal::line::{self, BACKSPACE, DEL};
use xmcu_hal::system::System;
use xmcu_hal::uart::{Uart, UartConfig};
use xmcu_hal::{HalError, HalResult, Tick, Timeout};

#[derive(Default)]
struct ScriptedUart {
    sent: Vec<u8>,
    incoming: VecDeque<u8>,
    timeouts_seen: Vec<u32>,
}

impl Uart for ScriptedUart {
    type Id = u8;

    fn init(&mut self, _: u8, _: &UartConfig) -> HalResult<()> {
        Ok(())
    }
    fn deinit(&mut self, _: u8) -> HalResult<()> {
        Ok(())
    }
    fn transmit(&mut self, id: u8, data: &[u8], timeout: Timeout) -> HalResult<()> {
        if id != 0 || data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        self.timeouts_seen.push(timeout.millis());
        self.sent.extend_from_slice(data);
        Ok(())
    }
    fn receive(&mut self, id: u8, buf: &mut [u8], _: Timeout) -> HalResult<()> {
        if id != 0 || buf.is_empty() {
            return Err(HalError::InvalidParam);
        }
        for slot in buf.iter_mut() {
            *slot = self.incoming.pop_front().ok_or(HalError::Timeout)?;
        }
        Ok(())
    }
    fn is_busy(&self, _: u8) -> bool {
        false
    }
    fn data_available(&self, _: u8) -> bool {
        !self.incoming.is_empty()
    }
    fn flush_rx(&mut self, _: u8) -> HalResult<()> {
        self.incoming.clear();
        Ok(())
    }
    fn flush_tx(&mut self, _: u8) -> HalResult<()> {
        Ok(())
    }
}

/// Time only moves when the code under test sleeps.
struct SleepClock {
    now: Cell<u32>,
}

impl SleepClock {
    fn starting_at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }
}

impl System for SleepClock {
    fn init(&mut self) -> HalResult<()> {
        Ok(())
    }
    fn deinit(&mut self) -> HalResult<()> {
        Ok(())
    }
    fn get_tick(&self) -> Tick {
        Tick::from_raw(self.now.get())
    }
    fn system_clock(&self) -> u32 {
        16_000_000
    }
    fn delay_ms(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
    fn delay_us(&self, _: u32) {}
    fn system_reset(&self) -> ! {
        panic!("reset requested");
    }
}

#[test]
fn send_line_appends_crlf() {
    let mut uart = ScriptedUart::default();
    line::send_line(&mut uart, 0, "hello").unwrap();
    assert_eq!(uart.sent, b"hello\r\n");
    assert_eq!(uart.timeouts_seen, vec![1000, 100]);
}

#[test]
fn empty_text_is_rejected_and_nothing_sent() {
    let mut uart = ScriptedUart::default();
    assert_eq!(line::send_string(&mut uart, 0, ""), Err(HalError::InvalidParam));
    assert_eq!(line::send_line(&mut uart, 0, ""), Err(HalError::InvalidParam));
    assert!(uart.sent.is_empty());
}

#[test]
fn receive_line_applies_backspace() {
    let mut uart = ScriptedUart::default();
    uart.incoming.extend(b"helx");
    uart.incoming.push_back(BACKSPACE);
    uart.incoming.extend(b"lo\r");
    let system = SleepClock::starting_at(0);

    let got = line::receive_line::<_, _, 32>(&mut uart, &system, 0, Timeout::from_millis(500))
        .unwrap();
    assert_eq!(&got[..], b"hello");
}

#[test]
fn receive_line_erase_on_empty_is_ignored() {
    let mut uart = ScriptedUart::default();
    uart.incoming.extend([DEL, DEL, b'o', b'k', b'\n']);
    let system = SleepClock::starting_at(0);

    let got = line::receive_line::<_, _, 8>(&mut uart, &system, 0, Timeout::FOREVER).unwrap();
    assert_eq!(&got[..], b"ok");
}

#[test]
fn receive_line_truncates_when_full() {
    let mut uart = ScriptedUart::default();
    uart.incoming.extend(b"abcdefgh\r");
    let system = SleepClock::starting_at(0);

    let got = line::receive_line::<_, _, 4>(&mut uart, &system, 0, Timeout::FOREVER).unwrap();
    assert_eq!(&got[..], b"abcd");
    // Remaining input stays queued for the next read.
    assert_eq!(uart.incoming.len(), 5);
}

#[test]
fn receive_line_times_out_without_terminator() {
    let mut uart = ScriptedUart::default();
    uart.incoming.extend(b"partial");
    let system = SleepClock::starting_at(u32::MAX - 3);

    let result = line::receive_line::<_, _, 32>(&mut uart, &system, 0, Timeout::from_millis(20));
    assert_eq!(result, Err(HalError::Timeout));
    // One 1 ms idle per iteration; expiry is seen once 21 ms have passed.
    assert_eq!(
        Tick::from_raw(system.now.get()).elapsed_since(Tick::from_raw(u32::MAX - 3)),
        21
    );
}

#[test]
fn receive_line_propagates_invalid_instance() {
    let mut uart = ScriptedUart::default();
    let system = SleepClock::starting_at(0);
    let result = line::receive_line::<_, _, 8>(&mut uart, &system, 3, Timeout::FOREVER);
    assert_eq!(result, Err(HalError::InvalidParam));
}

#[test]
fn data_ready_reflects_pending_input() {
    let mut uart = ScriptedUart::default();
    assert!(!line::data_ready(&uart, 0));
    uart.incoming.push_back(b'x');
    assert!(line::data_ready(&uart, 0));
}
