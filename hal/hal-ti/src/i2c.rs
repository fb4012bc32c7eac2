//! C2000 I2C controller driver

use xmcu_hal::blocking::{block_until, Deadline, Timeout};
use xmcu_hal::i2c::{check_address, I2c, I2cConfig, RegisterAddress};
use xmcu_hal::timebase::Timebase;
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::driverlib::{protected, DriverLib, I2cDirection, I2cStatus, PeripheralClock};
use crate::ids::I2cId;

pub struct I2cDriver<'a, B> {
    lib: &'a B,
    timebase: &'a Timebase,
}

impl<'a, B: DriverLib> I2cDriver<'a, B> {
    pub(crate) fn new(lib: &'a B, timebase: &'a Timebase) -> Self {
        Self { lib, timebase }
    }

    /// STOP and drop the flags of an abandoned transfer so the bus frees up.
    fn abort(&self, base: u32) {
        self.lib.i2c_send_stop(base);
        self.lib
            .i2c_clear_status(base, I2cStatus::NO_ACK.union(I2cStatus::STOP_CONDITION));
    }

    /// Wait for `flag`. A NACK or timeout aborts the transfer with a STOP.
    fn wait_for(&self, base: u32, flag: I2cStatus, deadline: &Deadline) -> HalResult<()> {
        let result = block_until(self.timebase, deadline, || {
            let status = self.lib.i2c_get_status(base);
            if status.contains(I2cStatus::NO_ACK) {
                Err(nb::Error::Other(HalError::Error))
            } else if status.contains(flag) {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        });
        if let Err(err) = result {
            if err == HalError::Timeout {
                warn!("i2c transfer timed out, sending STOP");
            }
            self.abort(base);
        }
        result
    }

    fn start(&self, base: u32, address: u16, count: usize, direction: I2cDirection) -> HalResult<()> {
        let count = u16::try_from(count).map_err(|_| HalError::InvalidParam)?;
        self.lib.i2c_set_target_address(base, address);
        self.lib.i2c_set_data_count(base, count);
        self.lib.i2c_set_direction(base, direction);
        self.lib.i2c_send_start(base);
        Ok(())
    }

    fn write_bytes(&self, base: u32, bytes: &[u8], deadline: &Deadline) -> HalResult<()> {
        for &byte in bytes {
            self.wait_for(base, I2cStatus::TX_DATA_READY, deadline)?;
            self.lib.i2c_put_data(base, byte);
        }
        Ok(())
    }

    fn read_bytes(&self, base: u32, buf: &mut [u8], deadline: &Deadline) -> HalResult<()> {
        for slot in buf.iter_mut() {
            self.wait_for(base, I2cStatus::RX_DATA_READY, deadline)?;
            *slot = self.lib.i2c_get_data(base);
        }
        Ok(())
    }

    fn stop(&self, base: u32, deadline: &Deadline) -> HalResult<()> {
        self.lib.i2c_send_stop(base);
        self.wait_for(base, I2cStatus::STOP_CONDITION, deadline)?;
        self.lib.i2c_clear_status(base, I2cStatus::STOP_CONDITION);
        Ok(())
    }

    fn begin(&self, id: I2cId, address: u16) -> HalResult<u32> {
        let base = id.checked_base()?;
        check_address(address)?;
        if self.lib.i2c_get_status(base).contains(I2cStatus::BUS_BUSY) {
            return Err(HalError::Busy);
        }
        Ok(base)
    }

    fn probe(&self, base: u32, address: u16, timeout: Timeout) -> HalResult<()> {
        let deadline = Deadline::arm(self.timebase, timeout);
        self.start(base, address, 0, I2cDirection::ControllerSend)?;
        self.wait_for(base, I2cStatus::REG_ACCESS_READY, &deadline)?;
        self.stop(base, &deadline)
    }
}

impl<B: DriverLib> I2c for I2cDriver<'_, B> {
    type Id = I2cId;

    fn init(&mut self, id: I2cId, config: &I2cConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        config.validate()?;
        if config.frequency > chip::I2C_MAX_BIT_RATE {
            return Err(HalError::InvalidParam);
        }
        protected(self.lib, || {
            self.lib.sysctl_enable_peripheral(PeripheralClock::I2c(id.index()))
        });
        self.lib.i2c_disable_module(base);
        self.lib.i2c_init_controller(base, chip::CPU_CLOCK_HZ, config.frequency);
        self.lib.i2c_enable_module(base);
        debug!("i2c{} up at {} Hz", id.index(), config.frequency);
        Ok(())
    }

    fn deinit(&mut self, id: I2cId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.i2c_disable_module(base);
        protected(self.lib, || {
            self.lib.sysctl_disable_peripheral(PeripheralClock::I2c(id.index()))
        });
        Ok(())
    }

    fn master_transmit(
        &mut self,
        id: I2cId,
        address: u16,
        data: &[u8],
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = self.begin(id, address)?;
        if data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(self.timebase, timeout);
        self.start(base, address, data.len(), I2cDirection::ControllerSend)?;
        self.write_bytes(base, data, &deadline)?;
        self.stop(base, &deadline)
    }

    fn master_receive(
        &mut self,
        id: I2cId,
        address: u16,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = self.begin(id, address)?;
        if buf.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let deadline = Deadline::arm(self.timebase, timeout);
        self.start(base, address, buf.len(), I2cDirection::ControllerReceive)?;
        self.read_bytes(base, buf, &deadline)?;
        self.stop(base, &deadline)
    }

    fn mem_write(
        &mut self,
        id: I2cId,
        address: u16,
        reg: u16,
        data: &[u8],
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = self.begin(id, address)?;
        if data.is_empty() {
            return Err(HalError::InvalidParam);
        }
        let reg = RegisterAddress::new(reg);
        let deadline = Deadline::arm(self.timebase, timeout);
        self.start(
            base,
            address,
            reg.as_bytes().len() + data.len(),
            I2cDirection::ControllerSend,
        )?;
        self.write_bytes(base, reg.as_bytes(), &deadline)?;
        self.write_bytes(base, data, &deadline)?;
        self.stop(base, &deadline)
    }

    fn mem_read(
        &mut self,
        id: I2cId,
        address: u16,
        reg: u16,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = self.begin(id, address)?;
        if buf.is_empty() || buf.len() > usize::from(u16::MAX) {
            return Err(HalError::InvalidParam);
        }
        let reg = RegisterAddress::new(reg);
        let deadline = Deadline::arm(self.timebase, timeout);
        self.start(base, address, reg.as_bytes().len(), I2cDirection::ControllerSend)?;
        self.write_bytes(base, reg.as_bytes(), &deadline)?;
        self.wait_for(base, I2cStatus::REG_ACCESS_READY, &deadline)?;
        // Repeated START into the read phase.
        self.start(base, address, buf.len(), I2cDirection::ControllerReceive)?;
        self.read_bytes(base, buf, &deadline)?;
        self.stop(base, &deadline)
    }

    fn is_device_ready(
        &mut self,
        id: I2cId,
        address: u16,
        trials: u32,
        timeout: Timeout,
    ) -> HalResult<()> {
        let base = self.begin(id, address)?;
        if trials == 0 {
            return Err(HalError::InvalidParam);
        }
        let mut last = HalError::Error;
        for _ in 0..trials {
            match self.probe(base, address, timeout) {
                Ok(()) => return Ok(()),
                Err(err) => last = err,
            }
        }
        Err(last)
    }

    fn is_busy(&self, id: I2cId) -> bool {
        id.base().is_some_and(|base| {
            self.lib
                .i2c_get_status(base)
                .contains(I2cStatus::BUS_BUSY)
        })
    }
}
