use xmcu_hal::line::{receive_line, send_line};
use xmcu_hal::uart::{Baudrate, DataBits, Parity, StopBits, Uart, UartConfig};
use xmcu_hal::{HalError, Timeout};

use super::{elapsed, setup};
use crate::cube::{ClockGate, CubeHal, GpioModeKind, UsartParity, UsartStopBits, WordLength};
use crate::ids::UartId;
use crate::pins;

#[test]
fn test_init_routes_pins_and_programs_frame() {
    let hal = setup();
    let config = UartConfig {
        baudrate: Baudrate::B9600,
        data_bits: DataBits::Eight,
        stop_bits: StopBits::Two,
        parity: Parity::Odd,
    };
    hal.uart().init(UartId::USART2, &config).unwrap();

    let sim = hal.bindings();
    let frame = sim.usart_frame(UartId::USART2).unwrap();
    assert_eq!(frame.word_length, WordLength::Bits9);
    assert_eq!(frame.parity, UsartParity::Odd);
    assert_eq!(frame.stop_bits, UsartStopBits::Two);
    assert_eq!(sim.usart_baud(UartId::USART2).map(|(_, baud)| baud), Some(9600));
    assert!(sim.usart_enabled(UartId::USART2));
    assert!(sim.clock_enabled(ClockGate::Uart(1)));

    let tx = sim.pin_config(pins::PA2).unwrap();
    assert_eq!(tx.mode, GpioModeKind::AlternatePushPull);
    assert_eq!(tx.alternate, 7);
    assert_eq!(sim.pin_config(pins::PA3).unwrap().alternate, 7);
}

#[test]
fn test_usart1_clocked_from_apb2() {
    let hal = setup();
    hal.uart().init(UartId::USART1, &UartConfig::default()).unwrap();
    let (pclk, baud) = hal.bindings().usart_baud(UartId::USART1).unwrap();
    assert_eq!(baud, 115_200);
    assert_eq!(pclk, hal.bindings().pclk2_freq());
}

#[test]
fn test_too_wide_frame_rejected() {
    let hal = setup();
    let config = UartConfig {
        data_bits: DataBits::Nine,
        parity: Parity::Even,
        ..UartConfig::default()
    };
    assert_eq!(
        hal.uart().init(UartId::USART1, &config),
        Err(HalError::InvalidParam)
    );
    let nine_bit = UartConfig {
        data_bits: DataBits::Nine,
        ..UartConfig::default()
    };
    assert_eq!(hal.uart().init(UartId::USART1, &nine_bit), Ok(()));
}

#[test]
fn test_invalid_instance_and_empty_buffers() {
    let hal = setup();
    let mut uart = hal.uart();
    assert_eq!(
        uart.init(UartId::new(5), &UartConfig::default()),
        Err(HalError::InvalidParam)
    );
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    assert_eq!(
        uart.transmit(UartId::USART2, &[], Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        uart.receive(UartId::USART2, &mut [], Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
    assert!(!uart.data_available(UartId::new(9)));
    assert!(!uart.is_busy(UartId::new(9)));
}

#[test]
fn test_send_line_reaches_the_wire() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    send_line(&mut uart, UartId::USART2, "ok").unwrap();
    assert_eq!(hal.bindings().usart_sent(UartId::USART2), b"ok\r\n");
}

#[test]
fn test_stalled_transmit_times_out() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    hal.bindings().usart_stall_tx(UartId::USART2, true);

    let start = hal.now();
    assert_eq!(
        uart.transmit(UartId::USART2, b"abc", Timeout::from_millis(5)),
        Err(HalError::Timeout)
    );
    assert_eq!(elapsed(&hal, start), 6);
    assert!(hal.bindings().usart_sent(UartId::USART2).is_empty());
}

#[test]
fn test_receive_across_tick_wrap() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    hal.bindings().set_tick(u32::MAX - 3);
    hal.bindings().usart_inject(UartId::USART2, b"x");

    let start = hal.now();
    let mut buf = [0u8; 2];
    assert_eq!(
        uart.receive(UartId::USART2, &mut buf, Timeout::from_millis(10)),
        Err(HalError::Timeout)
    );
    assert_eq!(buf[0], b'x');
    assert_eq!(elapsed(&hal, start), 11);
}

#[test]
fn test_getchar_and_flush() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::USART3, &UartConfig::default()).unwrap();
    hal.bindings().usart_inject(UartId::USART3, b"qrs");

    assert_eq!(uart.getchar(UartId::USART3, Timeout::from_millis(5)), Ok(b'q'));
    uart.flush_rx(UartId::USART3).unwrap();
    assert!(!uart.data_available(UartId::USART3));
    assert_eq!(
        uart.getchar(UartId::USART3, Timeout::from_millis(3)),
        Err(HalError::Timeout)
    );
}

#[test]
fn test_busy_until_transfer_complete() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    hal.bindings().usart_busy_after_write(UartId::USART2, 3);
    uart.putchar(UartId::USART2, b'z').unwrap();
    assert!(uart.is_busy(UartId::USART2));
    uart.flush_tx(UartId::USART2).unwrap();
    assert!(!uart.is_busy(UartId::USART2));
}

#[test]
fn test_receive_line_with_editing() {
    let hal = setup();
    let mut uart = hal.uart();
    let system = hal.system();
    uart.init(UartId::USART2, &UartConfig::default()).unwrap();
    hal.bindings().usart_inject(UartId::USART2, b"cat\x7ft\n");

    let line =
        receive_line::<_, _, 16>(&mut uart, &system, UartId::USART2, Timeout::from_millis(200))
            .unwrap();
    assert_eq!(line.as_slice(), b"cat");
}

#[test]
fn test_deinit_gates_clock() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::UART4, &UartConfig::default()).unwrap();
    uart.deinit(UartId::UART4).unwrap();
    assert!(!hal.bindings().clock_enabled(ClockGate::Uart(3)));
    assert!(!hal.bindings().usart_enabled(UartId::UART4));
}
