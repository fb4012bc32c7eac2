//! C2000 system bring-up, tick and delays

use xmcu_hal::system::System;
use xmcu_hal::timebase::{Tick, Timebase};
use xmcu_hal::{HalError, HalResult};

use crate::chip;
use crate::driverlib::{protected, DriverLib, PeripheralClock};

pub struct SystemDriver<'a, B> {
    lib: &'a B,
    timebase: &'a Timebase,
}

impl<'a, B: DriverLib> SystemDriver<'a, B> {
    pub(crate) fn new(lib: &'a B, timebase: &'a Timebase) -> Self {
        Self { lib, timebase }
    }

    fn init_clocks(&self) -> HalResult<()> {
        let ok = protected(self.lib, || {
            self.lib.sysctl_device_cal();
            self.lib.sysctl_disable_watchdog();
            if !self.lib.sysctl_set_clock(chip::CPU_CLOCK_HZ) {
                return false;
            }
            for timer in 0..3 {
                self.lib.sysctl_enable_peripheral(PeripheralClock::Timer(timer));
            }
            true
        });
        if ok {
            Ok(())
        } else {
            warn!("{} clock setup failed", chip::DEVICE);
            Err(HalError::Error)
        }
    }

    fn init_interrupts(&self) {
        self.lib.interrupt_disable_global();
        self.lib.interrupt_init_module();
        self.lib.interrupt_init_vector_table();
        self.lib.interrupt_clear_all_flags();
    }
}

impl<B: DriverLib> System for SystemDriver<'_, B> {
    fn init(&mut self) -> HalResult<()> {
        self.init_clocks()?;
        self.init_interrupts();
        self.lib.cpu_timer0_start_periodic(chip::TICK_TIMER_PERIOD);
        self.lib.interrupt_enable_global();
        debug!("{} up at {} Hz", chip::DEVICE, chip::CPU_CLOCK_HZ);
        Ok(())
    }

    fn deinit(&mut self) -> HalResult<()> {
        self.lib.interrupt_disable_global();
        self.lib.cpu_timer0_stop();
        Ok(())
    }

    fn get_tick(&self) -> Tick {
        self.timebase.now()
    }

    fn system_clock(&self) -> u32 {
        chip::CPU_CLOCK_HZ
    }

    fn delay_ms(&self, ms: u32) {
        for _ in 0..ms {
            self.lib.sysctl_delay_us(1_000);
        }
    }

    fn delay_us(&self, us: u32) {
        self.lib.sysctl_delay_us(us);
    }

    fn system_reset(&self) -> ! {
        self.lib.sysctl_reset_device();
        loop {
            core::hint::spin_loop();
        }
    }
}
