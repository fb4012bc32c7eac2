use xmcu_hal::line;
use xmcu_hal::uart::{Baudrate, DataBits, Parity, StopBits, Uart, UartConfig};
use xmcu_hal::{HalError, Timeout};

use super::{elapsed, setup};
use crate::chip;
use crate::driverlib::{PeripheralClock, SciParity, SciStopBits};
use crate::ids::UartId;
use crate::pins;

#[test]
fn test_init_configures_module_and_pins() {
    let hal = setup();
    let config = UartConfig {
        baudrate: Baudrate::B9600,
        data_bits: DataBits::Seven,
        stop_bits: StopBits::Two,
        parity: Parity::Even,
    };
    hal.uart().init(UartId::SCIA, &config).unwrap();

    let lib = hal.bindings();
    let (lspclk, baud, frame) = lib.sci_config(UartId::SCIA).unwrap();
    assert_eq!(lspclk, chip::LSPCLK_HZ);
    assert_eq!(baud, 9_600);
    assert_eq!(frame.word_length, 7);
    assert_eq!(frame.stop_bits, SciStopBits::Two);
    assert_eq!(frame.parity, SciParity::Even);
    assert!(lib.sci_enabled(UartId::SCIA));
    assert!(lib.clock_enabled(PeripheralClock::Sci(0)));
    assert_eq!(lib.pin_mux(pins::GPIO28_SCIA_RX.number()), Some(1));
    assert_eq!(lib.pin_mux(pins::GPIO29_SCIA_TX.number()), Some(1));
    assert_eq!(lib.protected_violations(), 0);
}

#[test]
fn test_nine_data_bits_rejected() {
    let hal = setup();
    let config = UartConfig {
        data_bits: DataBits::Nine,
        ..UartConfig::default()
    };
    assert_eq!(
        hal.uart().init(UartId::SCIB, &config),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_invalid_instance() {
    let hal = setup();
    let mut uart = hal.uart();
    let bad = UartId::new(3);
    assert_eq!(uart.init(bad, &UartConfig::default()), Err(HalError::InvalidParam));
    assert_eq!(
        uart.transmit(bad, b"x", Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
    assert!(!uart.is_busy(bad));
    assert!(!uart.data_available(bad));
}

#[test]
fn test_empty_buffers_rejected() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    assert_eq!(
        uart.transmit(UartId::SCIA, &[], Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        uart.receive(UartId::SCIA, &mut [], Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_send_line_on_the_wire() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    line::send_line(&mut uart, UartId::SCIA, "hello").unwrap();
    assert_eq!(hal.bindings().sci_sent(UartId::SCIA), b"hello\r\n");
}

#[test]
fn test_transmit_times_out_within_one_poll() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    hal.bindings().sci_stall_tx(UartId::SCIA, true);

    let start = hal.timebase().now();
    assert_eq!(
        uart.transmit(UartId::SCIA, b"hi", Timeout::from_millis(5)),
        Err(HalError::Timeout)
    );
    assert_eq!(elapsed(&hal, start), 6);
    assert!(hal.bindings().sci_sent(UartId::SCIA).is_empty());
}

#[test]
fn test_receive_shares_one_budget_across_bytes() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIB, &UartConfig::default()).unwrap();
    hal.bindings().sci_inject(UartId::SCIB, b"ab");

    let start = hal.timebase().now();
    let mut buf = [0u8; 4];
    assert_eq!(
        uart.receive(UartId::SCIB, &mut buf, Timeout::from_millis(10)),
        Err(HalError::Timeout)
    );
    assert_eq!(&buf[..2], b"ab");
    // Two successful polls plus the wait for the third byte.
    assert_eq!(elapsed(&hal, start), 11);
}

#[test]
fn test_getchar_and_putchar() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    hal.bindings().sci_inject(UartId::SCIA, b"z");

    assert!(uart.data_available(UartId::SCIA));
    assert_eq!(uart.getchar(UartId::SCIA, Timeout::from_millis(10)), Ok(b'z'));
    assert_eq!(
        uart.getchar(UartId::SCIA, Timeout::from_millis(3)),
        Err(HalError::Timeout)
    );
    uart.putchar(UartId::SCIA, b'!').unwrap();
    assert_eq!(hal.bindings().sci_sent(UartId::SCIA), b"!");
}

#[test]
fn test_init_discards_stale_input() {
    let hal = setup();
    hal.bindings().sci_inject(UartId::SCIA, b"stale");
    hal.uart().init(UartId::SCIA, &UartConfig::default()).unwrap();
    assert_eq!(hal.bindings().sci_pending_rx(UartId::SCIA), 0);
}

#[test]
fn test_flush_rx_drains_everything() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    hal.bindings().sci_inject(UartId::SCIA, b"garbage");
    uart.flush_rx(UartId::SCIA).unwrap();
    assert!(!uart.data_available(UartId::SCIA));
}

#[test]
fn test_flush_tx_waits_for_idle_transmitter() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    hal.bindings().sci_busy_after_write(UartId::SCIA, 50);
    uart.putchar(UartId::SCIA, b'x').unwrap();

    assert!(uart.is_busy(UartId::SCIA));
    let start = hal.timebase().now();
    uart.flush_tx(UartId::SCIA).unwrap();
    assert!(elapsed(&hal, start) >= 49);
    assert!(!uart.is_busy(UartId::SCIA));
}

#[test]
fn test_receive_line_from_sci() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIA, &UartConfig::default()).unwrap();
    hal.bindings().sci_inject(UartId::SCIA, b"ls -\x08l\r");

    let system = hal.system();
    let got = line::receive_line::<_, _, 16>(&mut uart, &system, UartId::SCIA, Timeout::FOREVER)
        .unwrap();
    assert_eq!(&got[..], b"ls l");
}

#[test]
fn test_deinit_gates_clock() {
    let hal = setup();
    let mut uart = hal.uart();
    uart.init(UartId::SCIC, &UartConfig::default()).unwrap();
    uart.deinit(UartId::SCIC).unwrap();
    assert!(!hal.bindings().clock_enabled(PeripheralClock::Sci(2)));
    assert!(!hal.bindings().sci_enabled(UartId::SCIC));
}
