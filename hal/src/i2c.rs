//! I2C (Inter-Integrated Circuit) abstraction
//!
//! Addresses are 7-bit and unshifted (`0x00..=0x7F`); drivers shift them
//! into the wire format themselves.

use crate::blocking::Timeout;
use crate::error::{HalError, HalResult};

/// First address probed by [`I2c::scan_devices`]; below are reserved.
pub const SCAN_FIRST_ADDRESS: u16 = 0x08;
/// Last address probed by [`I2c::scan_devices`]; above are reserved.
pub const SCAN_LAST_ADDRESS: u16 = 0x77;
/// Per-address budget used while scanning.
pub const SCAN_PROBE_TIMEOUT: Timeout = Timeout::from_millis(10);

/// Highest 7-bit address.
pub const MAX_ADDRESS: u16 = 0x7F;

/// Fastest supported bus clock (Fast-mode Plus).
pub const MAX_FREQUENCY: u32 = 1_000_000;

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Bus clock in Hz, `1..=1_000_000`
    pub frequency: u32,
    /// Controller (master) role; target mode is not supported
    pub master_mode: bool,
}

impl I2cConfig {
    pub fn validate(&self) -> HalResult<()> {
        if !self.master_mode || self.frequency == 0 || self.frequency > MAX_FREQUENCY {
            return Err(HalError::InvalidParam);
        }
        Ok(())
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000,
            master_mode: true,
        }
    }
}

/// Memory register address as sent on the wire: one byte when it fits,
/// otherwise two bytes big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterAddress {
    bytes: [u8; 2],
    len: usize,
}

impl RegisterAddress {
    pub const fn new(reg: u16) -> Self {
        if reg <= 0xFF {
            Self {
                bytes: [reg as u8, 0],
                len: 1,
            }
        } else {
            Self {
                bytes: reg.to_be_bytes(),
                len: 2,
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Rejects addresses outside the 7-bit space.
pub fn check_address(address: u16) -> HalResult<()> {
    if address > MAX_ADDRESS {
        Err(HalError::InvalidParam)
    } else {
        Ok(())
    }
}

/// Blocking I2C controller
pub trait I2c {
    type Id: Copy + core::fmt::Debug;

    fn init(&mut self, id: Self::Id, config: &I2cConfig) -> HalResult<()>;

    fn deinit(&mut self, id: Self::Id) -> HalResult<()>;

    /// START, address+W, `data`, STOP. A NACK is `Error`.
    fn master_transmit(
        &mut self,
        id: Self::Id,
        address: u16,
        data: &[u8],
        timeout: Timeout,
    ) -> HalResult<()>;

    /// START, address+R, fill `buf`, STOP.
    fn master_receive(
        &mut self,
        id: Self::Id,
        address: u16,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()>;

    /// Write `data` starting at register `reg`.
    fn mem_write(
        &mut self,
        id: Self::Id,
        address: u16,
        reg: u16,
        data: &[u8],
        timeout: Timeout,
    ) -> HalResult<()>;

    /// Read into `buf` starting at register `reg` (repeated START).
    fn mem_read(
        &mut self,
        id: Self::Id,
        address: u16,
        reg: u16,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()>;

    /// Address the device up to `trials` times; `Ok` on the first ACK.
    fn is_device_ready(
        &mut self,
        id: Self::Id,
        address: u16,
        trials: u32,
        timeout: Timeout,
    ) -> HalResult<()>;

    fn is_busy(&self, id: Self::Id) -> bool;

    /// Probe every non-reserved 7-bit address once and record the ones that
    /// acknowledge, in ascending order. Returns how many were stored; the
    /// scan stops early once `devices` is full. A busy or stuck bus ends the
    /// scan with that error.
    fn scan_devices(&mut self, id: Self::Id, devices: &mut [u16]) -> HalResult<usize> {
        if devices.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let mut found = 0;
        for address in SCAN_FIRST_ADDRESS..=SCAN_LAST_ADDRESS {
            if found == devices.len() {
                break;
            }
            match self.is_device_ready(id, address, 1, SCAN_PROBE_TIMEOUT) {
                Ok(()) => {
                    devices[found] = address;
                    found += 1;
                }
                // No ACK: nothing at this address.
                Err(HalError::Error) => {}
                Err(err) => return Err(err),
            }
        }
        debug!("i2c scan found {} devices", found);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Acknowledges a fixed set of addresses.
    struct FakeBus {
        present: &'static [u16],
        probes: usize,
        fault: Option<HalError>,
    }

    impl I2c for FakeBus {
        type Id = u8;

        fn init(&mut self, _: u8, config: &I2cConfig) -> HalResult<()> {
            config.validate()
        }
        fn deinit(&mut self, _: u8) -> HalResult<()> {
            Ok(())
        }
        fn master_transmit(&mut self, _: u8, _: u16, _: &[u8], _: Timeout) -> HalResult<()> {
            Ok(())
        }
        fn master_receive(&mut self, _: u8, _: u16, _: &mut [u8], _: Timeout) -> HalResult<()> {
            Ok(())
        }
        fn mem_write(&mut self, _: u8, _: u16, _: u16, _: &[u8], _: Timeout) -> HalResult<()> {
            Ok(())
        }
        fn mem_read(&mut self, _: u8, _: u16, _: u16, _: &mut [u8], _: Timeout) -> HalResult<()> {
            Ok(())
        }
        fn is_device_ready(&mut self, id: u8, address: u16, _: u32, _: Timeout) -> HalResult<()> {
            if id > 1 {
                return Err(HalError::InvalidParam);
            }
            self.probes += 1;
            if let Some(err) = self.fault {
                return Err(err);
            }
            if self.present.contains(&address) {
                Ok(())
            } else {
                Err(HalError::Error)
            }
        }
        fn is_busy(&self, _: u8) -> bool {
            false
        }
    }

    #[test]
    fn test_scan_finds_devices_in_order() {
        let mut bus = FakeBus {
            present: &[0x68, 0x3C, 0x50],
            probes: 0,
            fault: None,
        };
        let mut devices = [0u16; 8];
        assert_eq!(bus.scan_devices(0, &mut devices), Ok(3));
        assert_eq!(&devices[..3], &[0x3C, 0x50, 0x68]);
        assert_eq!(bus.probes, 0x77 - 0x08 + 1);
    }

    #[test]
    fn test_scan_caps_at_buffer_length() {
        let mut bus = FakeBus {
            present: &[0x10, 0x20, 0x30],
            probes: 0,
            fault: None,
        };
        let mut devices = [0u16; 2];
        assert_eq!(bus.scan_devices(0, &mut devices), Ok(2));
        assert_eq!(devices, [0x10, 0x20]);
    }

    #[test]
    fn test_scan_rejects_invalid_instance() {
        let mut bus = FakeBus {
            present: &[],
            probes: 0,
            fault: None,
        };
        let mut devices = [0u16; 4];
        assert_eq!(bus.scan_devices(7, &mut devices), Err(HalError::InvalidParam));
    }

    #[test]
    fn test_scan_stops_on_bus_fault() {
        for fault in [HalError::Busy, HalError::Timeout] {
            let mut bus = FakeBus {
                present: &[0x50],
                probes: 0,
                fault: Some(fault),
            };
            let mut devices = [0u16; 4];
            assert_eq!(bus.scan_devices(0, &mut devices), Err(fault));
            assert_eq!(bus.probes, 1);
        }
    }

    #[test]
    fn test_register_address_width() {
        assert_eq!(RegisterAddress::new(0x42).as_bytes(), &[0x42]);
        assert_eq!(RegisterAddress::new(0x1234).as_bytes(), &[0x12, 0x34]);
    }

    #[test]
    fn test_config_validation() {
        assert!(I2cConfig::default().validate().is_ok());
        let too_fast = I2cConfig {
            frequency: 3_400_000,
            master_mode: true,
        };
        assert_eq!(too_fast.validate(), Err(HalError::InvalidParam));
        let target = I2cConfig {
            master_mode: false,
            ..I2cConfig::default()
        };
        assert_eq!(target.validate(), Err(HalError::InvalidParam));
    }
}
