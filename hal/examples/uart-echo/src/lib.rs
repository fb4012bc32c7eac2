//! Line echo console
//!
//! Prints a banner and a prompt, echoes every keystroke, and on Enter
//! repeats the collected line back as `Echo: <line>`. Backspace and DEL
//! erase on screen. Once the line is full further input is echoed but
//! not kept.
//!
//! ```text
//! cargo run -p uart-echo --features sim
//! cargo run -p uart-echo --no-default-features --features ti-c2000,sim
//! ```

#![no_std]

use xmcu_platform::line::{send_string, Edit, LineEditor, STRING_TIMEOUT, TERMINATOR_TIMEOUT};
use xmcu_platform::uart::Uart;
use xmcu_platform::{HalError, HalResult, Timeout};

pub const WELCOME: &str = "Cross-MCU UART Echo Example\r\n";
pub const PROMPT: &str = "Enter text (press Enter to echo): ";
/// Input buffer size; one byte short of it is kept per line.
pub const BUFFER_SIZE: usize = 256;

/// Wait for one byte per [`EchoConsole::poll`].
pub const KEY_TIMEOUT: Timeout = Timeout::from_millis(10);

const ERASE: &[u8] = b" \x08";

pub struct EchoConsole<Id> {
    id: Id,
    editor: LineEditor<{ BUFFER_SIZE - 1 }>,
}

impl<Id: Copy> EchoConsole<Id> {
    pub const fn new(id: Id) -> Self {
        Self {
            id,
            editor: LineEditor::new(),
        }
    }

    /// Pending input.
    pub fn line(&self) -> &[u8] {
        self.editor.as_bytes()
    }

    /// Banner followed by the first prompt.
    pub fn start<U: Uart<Id = Id> + ?Sized>(&mut self, uart: &mut U) -> HalResult<()> {
        send_string(uart, self.id, WELCOME)?;
        send_string(uart, self.id, PROMPT)
    }

    /// Handle at most one received byte. Returns whether one arrived.
    pub fn poll<U: Uart<Id = Id> + ?Sized>(&mut self, uart: &mut U) -> HalResult<bool> {
        if !uart.data_available(self.id) {
            return Ok(false);
        }
        let byte = match uart.getchar(self.id, KEY_TIMEOUT) {
            Ok(byte) => byte,
            Err(HalError::Timeout) => return Ok(false),
            Err(err) => return Err(err),
        };
        uart.putchar(self.id, byte)?;

        match self.editor.feed(byte) {
            Edit::EndOfLine => self.finish_line(uart)?,
            Edit::Erased => uart.transmit(self.id, ERASE, TERMINATOR_TIMEOUT)?,
            Edit::Stored(_) | Edit::Ignored => {}
        }
        Ok(true)
    }

    fn finish_line<U: Uart<Id = Id> + ?Sized>(&mut self, uart: &mut U) -> HalResult<()> {
        uart.transmit(self.id, b"\r\n", TERMINATOR_TIMEOUT)?;
        if !self.editor.as_bytes().is_empty() {
            send_string(uart, self.id, "Echo: ")?;
            uart.transmit(self.id, self.editor.as_bytes(), STRING_TIMEOUT)?;
            uart.transmit(self.id, b"\r\n", TERMINATOR_TIMEOUT)?;
            self.editor.clear();
        }
        send_string(uart, self.id, PROMPT)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::collections::VecDeque;
    use std::vec::Vec;

    use xmcu_platform::uart::UartConfig;

    use super::*;

    #[derive(Default)]
    struct Terminal {
        input: VecDeque<u8>,
        output: Vec<u8>,
        budgets: Vec<u32>,
    }

    impl Terminal {
        fn typed(keys: &[u8]) -> Self {
            Self {
                input: keys.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn drain(&mut self, console: &mut EchoConsole<u8>) {
            while console.poll(self).unwrap() {}
        }
    }

    impl Uart for Terminal {
        type Id = u8;

        fn init(&mut self, _: u8, _: &UartConfig) -> HalResult<()> {
            Ok(())
        }
        fn deinit(&mut self, _: u8) -> HalResult<()> {
            Ok(())
        }
        fn transmit(&mut self, _: u8, data: &[u8], timeout: Timeout) -> HalResult<()> {
            if data.is_empty() {
                return Err(HalError::InvalidParam);
            }
            self.budgets.push(timeout.millis());
            self.output.extend_from_slice(data);
            Ok(())
        }
        fn receive(&mut self, _: u8, buf: &mut [u8], _: Timeout) -> HalResult<()> {
            for slot in buf {
                *slot = self.input.pop_front().ok_or(HalError::Timeout)?;
            }
            Ok(())
        }
        fn is_busy(&self, _: u8) -> bool {
            false
        }
        fn data_available(&self, _: u8) -> bool {
            !self.input.is_empty()
        }
        fn flush_rx(&mut self, _: u8) -> HalResult<()> {
            self.input.clear();
            Ok(())
        }
        fn flush_tx(&mut self, _: u8) -> HalResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_start_prints_banner_and_prompt() {
        let mut term = Terminal::default();
        let mut console = EchoConsole::new(0);
        console.start(&mut term).unwrap();
        assert_eq!(
            term.output,
            b"Cross-MCU UART Echo Example\r\nEnter text (press Enter to echo): "
        );
        assert!(!console.poll(&mut term).unwrap());
    }

    #[test]
    fn test_line_is_echoed_back() {
        let mut term = Terminal::typed(b"hi\r");
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        assert_eq!(
            term.output,
            b"hi\r\r\nEcho: hi\r\nEnter text (press Enter to echo): "
        );
        assert!(console.line().is_empty());
    }

    #[test]
    fn test_echoed_line_gets_string_budget() {
        let mut term = Terminal::typed(b"ok\n");
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        // Three echoed keys, then CR LF, "Echo: ", the line, CR LF and the prompt.
        assert_eq!(term.budgets, [1000, 1000, 1000, 100, 1000, 1000, 100, 1000]);
    }

    #[test]
    fn test_empty_line_only_reprompts() {
        let mut term = Terminal::typed(b"\n");
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        assert_eq!(term.output, b"\n\r\nEnter text (press Enter to echo): ");
    }

    #[test]
    fn test_backspace_erases_on_screen() {
        let mut term = Terminal::typed(b"ab\x08");
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        assert_eq!(term.output, b"ab\x08 \x08");
        assert_eq!(console.line(), b"a");
    }

    #[test]
    fn test_erase_on_empty_line_is_only_echoed() {
        let mut term = Terminal::typed(b"\x7f");
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        assert_eq!(term.output, b"\x7f");
        assert!(console.line().is_empty());
    }

    #[test]
    fn test_overflow_is_echoed_but_dropped() {
        let keys: Vec<u8> = core::iter::repeat(b'x').take(BUFFER_SIZE + 4).collect();
        let mut term = Terminal::typed(&keys);
        let mut console = EchoConsole::new(0);
        term.drain(&mut console);
        assert_eq!(term.output.len(), BUFFER_SIZE + 4);
        assert_eq!(console.line().len(), BUFFER_SIZE - 1);
    }
}
