use xmcu_hal::i2c::{I2c, I2cConfig};
use xmcu_hal::{HalError, Timeout};

use super::setup;
use crate::ids::I2cId;

const EEPROM: u16 = 0x50;
const DISPLAY: u16 = 0x3C;
const T: Timeout = Timeout::from_millis(20);

fn ready_bus() -> crate::Hal<crate::sim::SimDriverLib> {
    let hal = setup();
    hal.i2c().init(I2cId::I2CA, &I2cConfig::default()).unwrap();
    hal.bindings().i2c_attach(I2cId::I2CA, EEPROM, 1);
    hal.bindings().i2c_attach(I2cId::I2CA, DISPLAY, 1);
    hal
}

#[test]
fn test_init_programs_bit_rate() {
    let hal = setup();
    let config = I2cConfig {
        frequency: 400_000,
        master_mode: true,
    };
    hal.i2c().init(I2cId::I2CB, &config).unwrap();
    assert_eq!(hal.bindings().i2c_bit_rate(I2cId::I2CB), Some(400_000));
}

#[test]
fn test_fast_mode_plus_not_supported() {
    let hal = setup();
    let config = I2cConfig {
        frequency: 1_000_000,
        master_mode: true,
    };
    assert_eq!(
        hal.i2c().init(I2cId::I2CA, &config),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_mem_write_then_mem_read() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    i2c.mem_write(I2cId::I2CA, EEPROM, 0x10, &[1, 2, 3], T).unwrap();
    assert_eq!(hal.bindings().i2c_register(I2cId::I2CA, EEPROM, 0x11), Some(2));

    let mut buf = [0u8; 3];
    i2c.mem_read(I2cId::I2CA, EEPROM, 0x10, &mut buf, T).unwrap();
    assert_eq!(buf, [1, 2, 3]);
}

#[test]
fn test_sixteen_bit_register_addresses() {
    let hal = setup();
    hal.i2c().init(I2cId::I2CA, &I2cConfig::default()).unwrap();
    hal.bindings().i2c_attach(I2cId::I2CA, 0x51, 2);

    let mut i2c = hal.i2c();
    i2c.mem_write(I2cId::I2CA, 0x51, 0x1234, &[0xAB], T).unwrap();
    assert_eq!(hal.bindings().i2c_register(I2cId::I2CA, 0x51, 0x1234), Some(0xAB));
}

#[test]
fn test_master_transmit_and_receive() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    // First byte sets the register pointer.
    i2c.master_transmit(I2cId::I2CA, DISPLAY, &[0x00, 0xAF], T).unwrap();
    hal.bindings().i2c_set_register(I2cId::I2CA, DISPLAY, 0x01, 0x42);

    let mut buf = [0u8; 1];
    i2c.master_receive(I2cId::I2CA, DISPLAY, &mut buf, T).unwrap();
    assert_eq!(buf, [0x42]);
    assert_eq!(hal.bindings().i2c_register(I2cId::I2CA, DISPLAY, 0x00), Some(0xAF));
}

#[test]
fn test_missing_device_nacks() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    assert_eq!(
        i2c.master_transmit(I2cId::I2CA, 0x29, &[1], T),
        Err(HalError::Error)
    );
    // The bus recovers for the next transfer.
    i2c.master_transmit(I2cId::I2CA, EEPROM, &[0, 9], T).unwrap();
}

#[test]
fn test_is_device_ready_with_retries() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    assert_eq!(i2c.is_device_ready(I2cId::I2CA, EEPROM, 3, T), Ok(()));
    assert_eq!(
        i2c.is_device_ready(I2cId::I2CA, 0x20, 3, T),
        Err(HalError::Error)
    );
    assert_eq!(
        i2c.is_device_ready(I2cId::I2CA, EEPROM, 0, T),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_scan_lists_attached_devices() {
    let hal = ready_bus();
    let mut devices = [0u16; 16];
    let found = hal.i2c().scan_devices(I2cId::I2CA, &mut devices).unwrap();
    assert_eq!(&devices[..found], &[DISPLAY, EEPROM]);
}

#[test]
fn test_busy_bus_is_reported() {
    let hal = ready_bus();
    hal.bindings().i2c_hold_bus(I2cId::I2CA, true);
    let mut i2c = hal.i2c();
    assert!(i2c.is_busy(I2cId::I2CA));
    assert_eq!(
        i2c.master_transmit(I2cId::I2CA, EEPROM, &[1], T),
        Err(HalError::Busy)
    );
}

#[test]
fn test_stretched_clock_times_out() {
    let hal = ready_bus();
    hal.bindings().i2c_stall(I2cId::I2CA, true);
    let mut i2c = hal.i2c();
    let mut buf = [0u8; 2];
    assert_eq!(
        i2c.master_receive(I2cId::I2CA, EEPROM, &mut buf, T),
        Err(HalError::Timeout)
    );
    // The abandoned transfer is closed with a STOP.
    assert!(!i2c.is_busy(I2cId::I2CA));

    let mut devices = [0u16; 4];
    assert_eq!(
        i2c.scan_devices(I2cId::I2CA, &mut devices),
        Err(HalError::Timeout)
    );

    hal.bindings().i2c_stall(I2cId::I2CA, false);
    i2c.master_transmit(I2cId::I2CA, EEPROM, &[0x00, 7], T).unwrap();
    assert_eq!(i2c.scan_devices(I2cId::I2CA, &mut devices), Ok(2));
    assert_eq!(&devices[..2], &[DISPLAY, EEPROM]);
}

#[test]
fn test_oversized_mem_read_touches_nothing() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    let mut buf = vec![0u8; 70_000];
    assert_eq!(
        i2c.mem_read(I2cId::I2CA, EEPROM, 0x05, &mut buf, T),
        Err(HalError::InvalidParam)
    );
    assert!(!i2c.is_busy(I2cId::I2CA));
    i2c.mem_write(I2cId::I2CA, EEPROM, 0x05, &[3], T).unwrap();
}

#[test]
fn test_parameter_checks() {
    let hal = ready_bus();
    let mut i2c = hal.i2c();
    assert_eq!(
        i2c.master_transmit(I2cId::I2CA, 0x80, &[1], T),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        i2c.master_transmit(I2cId::I2CA, EEPROM, &[], T),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        i2c.master_transmit(I2cId::new(2), EEPROM, &[1], T),
        Err(HalError::InvalidParam)
    );
    assert!(!i2c.is_busy(I2cId::new(2)));
}
