//! Line-oriented helpers on top of [`Uart`]
//!
//! Lines end at CR or LF. Backspace and DEL remove the last byte. When the
//! buffer fills up the line is returned truncated.

use heapless::Vec;

use crate::blocking::{Deadline, Timeout};
use crate::error::{HalError, HalResult};
use crate::system::System;
use crate::uart::Uart;

pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';
pub const BACKSPACE: u8 = 0x08;
pub const DEL: u8 = 0x7F;

/// Budget for [`send_string`].
pub const STRING_TIMEOUT: Timeout = Timeout::from_millis(1000);
/// Budget for the terminator written by [`send_line`].
pub const TERMINATOR_TIMEOUT: Timeout = Timeout::from_millis(100);
/// Per-byte wait inside [`receive_line`].
pub const BYTE_POLL_TIMEOUT: Timeout = Timeout::from_millis(10);

/// Outcome of feeding one byte to a [`LineEditor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edit {
    /// Appended to the line
    Stored(u8),
    /// The last byte was removed
    Erased,
    /// Erase on an empty line, or the line is full
    Ignored,
    /// CR or LF; the line is complete
    EndOfLine,
}

/// Fixed-capacity line accumulator with backspace handling.
#[derive(Debug, Default)]
pub struct LineEditor<const N: usize> {
    line: Vec<u8, N>,
}

impl<const N: usize> LineEditor<N> {
    pub const fn new() -> Self {
        Self { line: Vec::new() }
    }

    pub fn feed(&mut self, byte: u8) -> Edit {
        match byte {
            CR | LF => Edit::EndOfLine,
            BACKSPACE | DEL => match self.line.pop() {
                Some(_) => Edit::Erased,
                None => Edit::Ignored,
            },
            _ => match self.line.push(byte) {
                Ok(()) => Edit::Stored(byte),
                Err(_) => Edit::Ignored,
            },
        }
    }

    pub fn is_full(&self) -> bool {
        self.line.is_full()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }

    pub fn into_line(self) -> Vec<u8, N> {
        self.line
    }
}

/// Send `text` with a one second budget. Empty text is `InvalidParam`,
/// as for [`Uart::transmit`].
pub fn send_string<U: Uart + ?Sized>(uart: &mut U, id: U::Id, text: &str) -> HalResult<()> {
    uart.transmit(id, text.as_bytes(), STRING_TIMEOUT)
}

/// Send `text` followed by CR LF. Nothing goes out when `text` is empty.
pub fn send_line<U: Uart + ?Sized>(uart: &mut U, id: U::Id, text: &str) -> HalResult<()> {
    send_string(uart, id, text)?;
    uart.transmit(id, b"\r\n", TERMINATOR_TIMEOUT)
}

/// Whether a byte is waiting to be read.
pub fn data_ready<U: Uart + ?Sized>(uart: &U, id: U::Id) -> bool {
    uart.data_available(id)
}

/// Collect one line of input.
///
/// Returns the bytes before the terminator, which is consumed but not
/// stored. A full buffer ends the line early. `timeout` bounds the whole
/// line; zero waits forever. Capacity zero is `InvalidParam`.
pub fn receive_line<U, S, const N: usize>(
    uart: &mut U,
    system: &S,
    id: U::Id,
    timeout: Timeout,
) -> HalResult<Vec<u8, N>>
where
    U: Uart + ?Sized,
    S: System + ?Sized,
{
    if N == 0 {
        return Err(HalError::InvalidParam);
    }
    let deadline = Deadline::starting_at(system.get_tick(), timeout);
    let mut editor = LineEditor::<N>::new();

    while !editor.is_full() {
        if deadline.expired_at(system.get_tick()) {
            warn!("receive_line timed out after {} bytes", editor.as_bytes().len());
            return Err(HalError::Timeout);
        }
        match uart.getchar(id, BYTE_POLL_TIMEOUT) {
            Ok(byte) => {
                if editor.feed(byte) == Edit::EndOfLine {
                    return Ok(editor.into_line());
                }
            }
            Err(HalError::Timeout) => {}
            Err(err) => return Err(err),
        }
        system.delay_ms(1);
    }
    Ok(editor.into_line())
}
