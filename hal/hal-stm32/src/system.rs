//! STM32G4 system bring-up, tick and delays

use xmcu_hal::system::System;
use xmcu_hal::timebase::Tick;
use xmcu_hal::HalResult;

use crate::chip;
use crate::cube::CubeHal;

pub struct SystemDriver<'a, B> {
    lib: &'a B,
}

impl<'a, B: CubeHal> SystemDriver<'a, B> {
    pub(crate) fn new(lib: &'a B) -> Self {
        Self { lib }
    }

    /// HSI through the PLL to 170 MHz, range 1 boost.
    fn init_clocks(&self) -> HalResult<()> {
        self.lib.pwr_enable_range1_boost();
        HalResult::from(self.lib.rcc_osc_config(&chip::OSC_INIT))
            .inspect_err(|_| warn!("oscillator setup failed"))?;
        HalResult::from(
            self.lib
                .rcc_clock_config(&chip::CLK_INIT, chip::FLASH_LATENCY),
        )
        .inspect_err(|_| warn!("bus clock setup failed"))
    }
}

impl<B: CubeHal> System for SystemDriver<'_, B> {
    fn init(&mut self) -> HalResult<()> {
        HalResult::from(self.lib.hal_init())?;
        self.init_clocks()?;
        self.lib.dwt_enable_cycle_counter();
        HalResult::from(self.lib.hal_init_tick(chip::TICK_PRIORITY))?;
        debug!("{} up at {} Hz", chip::DEVICE, self.lib.system_core_clock());
        Ok(())
    }

    fn deinit(&mut self) -> HalResult<()> {
        self.lib.hal_deinit().into()
    }

    fn get_tick(&self) -> Tick {
        Tick::from_raw(self.lib.hal_get_tick())
    }

    fn system_clock(&self) -> u32 {
        self.lib.system_core_clock()
    }

    fn delay_ms(&self, ms: u32) {
        self.lib.hal_delay(ms);
    }

    /// Busy-waits on the DWT cycle counter, tolerating counter wrap.
    fn delay_us(&self, us: u32) {
        let target = (self.lib.system_core_clock() / 1_000_000) as u64 * us as u64;
        let mut waited = 0u64;
        let mut last = self.lib.dwt_cycle_count();
        while waited < target {
            let now = self.lib.dwt_cycle_count();
            waited += now.wrapping_sub(last) as u64;
            last = now;
        }
    }

    fn system_reset(&self) -> ! {
        self.lib.nvic_system_reset()
    }
}
