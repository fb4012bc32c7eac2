//! STM32G4 I2C controller driver
//!
//! Transfers go through `LL_I2C_HandleTransfer` with the byte count in
//! NBYTES and no reload, so one transfer moves at most 255 bytes.

use xmcu_hal::blocking::{block_until, Deadline, Timeout};
use xmcu_hal::i2c::{check_address, I2c, I2cConfig, RegisterAddress};
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::cube::{CubeHal, CubeTick, I2cEndMode, I2cIsr, I2cTransfer};
use crate::ids::I2cId;

pub struct I2cDriver<'a, B> {
    lib: &'a B,
}

impl<'a, B: CubeHal> I2cDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    fn clock(&self) -> CubeTick<'a, B> {
        CubeTick(self.lib)
    }

    /// STOP and drop the flags of an abandoned transfer so the bus frees up.
    fn abort(&self, base: u32) {
        self.lib.i2c_generate_stop(base);
        self.lib
            .i2c_clear_flags(base, I2cIsr::NACKF.union(I2cIsr::STOPF));
    }

    /// Wait for `flag`. A NACK or timeout ends the transfer and clears the bus.
    fn wait_for(&self, base: u32, flag: I2cIsr, deadline: &Deadline) -> HalResult<()> {
        let result = block_until(&self.clock(), deadline, || {
            let isr = self.lib.i2c_isr(base);
            if isr.contains(I2cIsr::NACKF) {
                Err(nb::Error::Other(HalError::Error))
            } else if isr.contains(flag) {
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

    fn transfer(
        &self,
        base: u32,
        address: u16,
        count: usize,
        read: bool,
        end: I2cEndMode,
    ) -> HalResult<()> {
        if count > chip::I2C_MAX_TRANSFER {
            return Err(HalError::InvalidParam);
        }
        self.lib.i2c_handle_transfer(
            base,
            &I2cTransfer {
                address: address << 1,
                bytes: count as u8,
                read,
                end,
            },
        );
        Ok(())
    }

    fn write_bytes(&self, base: u32, bytes: &[u8], deadline: &Deadline) -> HalResult<()> {
        for &byte in bytes {
            self.wait_for(base, I2cIsr::TXIS, deadline)?;
            self.lib.i2c_transmit_data8(base, byte);
        }
        Ok(())
    }

    fn read_bytes(&self, base: u32, buf: &mut [u8], deadline: &Deadline) -> HalResult<()> {
        for slot in buf.iter_mut() {
            self.wait_for(base, I2cIsr::RXNE, deadline)?;
            *slot = self.lib.i2c_receive_data8(base);
        }
        Ok(())
    }

    /// Wait out the automatic STOP.
    fn finish(&self, base: u32, deadline: &Deadline) -> HalResult<()> {
        self.wait_for(base, I2cIsr::STOPF, deadline)?;
        self.lib.i2c_clear_flags(base, I2cIsr::STOPF);
        Ok(())
    }

    fn begin(&self, id: I2cId, address: u16) -> HalResult<u32> {
        let base = id.checked_base()?;
        check_address(address)?;
        if self.lib.i2c_isr(base).contains(I2cIsr::BUSY) {
            return Err(HalError::Busy);
        }
        Ok(base)
    }

    /// Address-only write; the target either ACKs and gets a STOP or NACKs.
    fn probe(&self, base: u32, address: u16, timeout: Timeout) -> HalResult<()> {
        let clock = self.clock();
        let deadline = Deadline::arm(&clock, timeout);
        self.transfer(base, address, 0, false, I2cEndMode::AutoEnd)?;
        let isr = block_until(&clock, &deadline, || {
            let isr = self.lib.i2c_isr(base);
            if isr.intersects(I2cIsr::STOPF.union(I2cIsr::NACKF)) {
                Ok(isr)
            } else {
                Err(nb::Error::WouldBlock)
            }
        })
        .inspect_err(|_| self.abort(base))?;
        if isr.contains(I2cIsr::NACKF) {
            self.lib
                .i2c_clear_flags(base, I2cIsr::NACKF.union(I2cIsr::STOPF));
            return Err(HalError::Error);
        }
        self.lib.i2c_clear_flags(base, I2cIsr::STOPF);
        Ok(())
    }
}

impl<B: CubeHal> I2c for I2cDriver<'_, B> {
    type Id = I2cId;

    fn init(&mut self, id: I2cId, config: &I2cConfig) -> HalResult<()> {
        let base = id.checked_base()?;
        config.validate()?;
        self.lib.rcc_enable(id.clock());
        self.lib.i2c_disable(base);
        self.lib.i2c_set_timing(base, chip::i2c_timing(config.frequency));
        self.lib.i2c_enable(base);
        debug!("i2c{} up at {} Hz", id.index() + 1, config.frequency);
        Ok(())
    }

    fn deinit(&mut self, id: I2cId) -> HalResult<()> {
        let base = id.checked_base()?;
        self.lib.i2c_disable(base);
        self.lib.rcc_disable(id.clock());
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
        let deadline = Deadline::arm(&self.clock(), timeout);
        self.transfer(base, address, data.len(), false, I2cEndMode::AutoEnd)?;
        self.write_bytes(base, data, &deadline)?;
        self.finish(base, &deadline)
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
        let deadline = Deadline::arm(&self.clock(), timeout);
        self.transfer(base, address, buf.len(), true, I2cEndMode::AutoEnd)?;
        self.read_bytes(base, buf, &deadline)?;
        self.finish(base, &deadline)
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
        let deadline = Deadline::arm(&self.clock(), timeout);
        self.transfer(
            base,
            address,
            reg.as_bytes().len() + data.len(),
            false,
            I2cEndMode::AutoEnd,
        )?;
        self.write_bytes(base, reg.as_bytes(), &deadline)?;
        self.write_bytes(base, data, &deadline)?;
        self.finish(base, &deadline)
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
        if buf.is_empty() || buf.len() > chip::I2C_MAX_TRANSFER {
            return Err(HalError::InvalidParam);
        }
        let reg = RegisterAddress::new(reg);
        let deadline = Deadline::arm(&self.clock(), timeout);
        self.transfer(base, address, reg.as_bytes().len(), false, I2cEndMode::SoftEnd)?;
        self.write_bytes(base, reg.as_bytes(), &deadline)?;
        self.wait_for(base, I2cIsr::TC, &deadline)?;
        // Repeated START into the read phase.
        self.transfer(base, address, buf.len(), true, I2cEndMode::AutoEnd)?;
        self.read_bytes(base, buf, &deadline)?;
        self.finish(base, &deadline)
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
        id.base()
            .is_some_and(|base| self.lib.i2c_isr(base).contains(I2cIsr::BUSY))
    }
}
