//! Simulated DriverLib for host builds and tests
//!
//! Models just enough register behaviour for the drivers: pin latches and
//! pads, SCI and SPI FIFOs, an I2C bus with register-file targets, and an ADC
//! with a conversion latency. Every status-flag read advances the tick by one
//! millisecond, so polling loops observe time passing.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use xmcu_hal::timebase::Timebase;

use crate::chip;
use crate::driverlib::{
    AdcMode, Direction, DriverLib, I2cDirection, I2cStatus, PadConfig, PeripheralClock,
    Qualification, SciFrame, SpiProtocol, SpiRole,
};
use crate::ids::{AdcId, I2cId, SpiId, UartId};
use crate::Hal;

/// A [`Hal`] over fresh simulated hardware with its own tick counter.
pub fn hal() -> Hal<SimDriverLib> {
    let timebase: &'static Timebase = Box::leak(Box::new(Timebase::new()));
    Hal::with_timebase(SimDriverLib::new(timebase), timebase)
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    mux: u8,
    direction: Direction,
    pad: PadConfig,
    qualification: Qualification,
    analog: bool,
    latch: bool,
    external: Option<bool>,
}

impl Default for PinState {
    fn default() -> Self {
        Self {
            mux: 0,
            direction: Direction::In,
            pad: PadConfig::Std,
            qualification: Qualification::Sync,
            analog: false,
            latch: false,
            external: None,
        }
    }
}

impl PinState {
    fn level(&self) -> bool {
        match self.direction {
            Direction::Out => self.latch,
            Direction::In => self
                .external
                .unwrap_or(matches!(self.pad, PadConfig::Pullup)),
        }
    }
}

#[derive(Debug, Default)]
struct SciState {
    enabled: bool,
    fifo: bool,
    config: Option<(u32, u32, SciFrame)>,
    sent: Vec<u8>,
    rx: VecDeque<u8>,
    stalled: bool,
    busy_after_write: u32,
    busy_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSetup {
    pub protocol: SpiProtocol,
    pub role: SpiRole,
    pub bit_rate: u32,
    pub data_width: u8,
}

#[derive(Debug, Default)]
struct SpiState {
    enabled: bool,
    setup: Option<SpiSetup>,
    sent: Vec<u8>,
    responses: VecDeque<u8>,
    rx_fifo: VecDeque<u16>,
    stalled: bool,
}

#[derive(Debug, Default)]
struct I2cTarget {
    registers: BTreeMap<u16, u8>,
    address_bytes: usize,
    pointer: u16,
    pointer_bytes_seen: usize,
}

impl I2cTarget {
    fn write(&mut self, byte: u8) {
        if self.pointer_bytes_seen < self.address_bytes {
            self.pointer = if self.pointer_bytes_seen == 0 {
                byte as u16
            } else {
                (self.pointer << 8) | byte as u16
            };
            self.pointer_bytes_seen += 1;
        } else {
            self.registers.insert(self.pointer, byte);
            self.pointer = self.pointer.wrapping_add(1);
        }
    }

    fn read(&mut self) -> u8 {
        let byte = self.registers.get(&self.pointer).copied().unwrap_or(0);
        self.pointer = self.pointer.wrapping_add(1);
        byte
    }
}

#[derive(Debug)]
struct I2cState {
    enabled: bool,
    bit_rate: Option<u32>,
    target_address: u16,
    count: u16,
    direction: I2cDirection,
    active: bool,
    transferred: u16,
    nack: bool,
    register_access_ready: bool,
    stop_detected: bool,
    held: bool,
    stalled: bool,
    targets: BTreeMap<u16, I2cTarget>,
}

impl Default for I2cState {
    fn default() -> Self {
        Self {
            enabled: false,
            bit_rate: None,
            target_address: 0,
            count: 0,
            direction: I2cDirection::ControllerSend,
            active: false,
            transferred: 0,
            nack: false,
            register_access_ready: false,
            stop_detected: false,
            held: false,
            stalled: false,
            targets: BTreeMap::new(),
        }
    }
}

impl I2cState {
    fn advance_count(&mut self) {
        self.transferred = self.transferred.saturating_add(1);
        if self.transferred >= self.count {
            self.register_access_ready = true;
        }
    }
}

#[derive(Debug)]
struct AdcState {
    enabled: bool,
    mode: Option<AdcMode>,
    socs: [(u32, u32); chip::ADC_SOC_COUNT as usize],
    interrupt_source: u8,
    interrupt_flag: bool,
    pending: Option<(u8, u32)>,
    results: [u16; chip::ADC_SOC_COUNT as usize],
    inputs: BTreeMap<u32, u16>,
    latency: u32,
    trimmed: bool,
}

impl Default for AdcState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: None,
            socs: [(0, 0); chip::ADC_SOC_COUNT as usize],
            interrupt_source: 0,
            interrupt_flag: false,
            pending: None,
            results: [0; chip::ADC_SOC_COUNT as usize],
            inputs: BTreeMap::new(),
            latency: 2,
            trimmed: false,
        }
    }
}

impl AdcState {
    fn progress(&mut self) {
        let Some((soc, remaining)) = self.pending else {
            return;
        };
        if remaining > 0 {
            self.pending = Some((soc, remaining - 1));
            return;
        }
        let channel = self.socs[soc as usize].0;
        let raw = self.inputs.get(&channel).copied().unwrap_or(0);
        self.results[soc as usize] = match self.mode {
            Some(AdcMode::Resolution12Bit) => raw & 0x0FFF,
            _ => raw,
        };
        if soc == self.interrupt_source {
            self.interrupt_flag = true;
        }
        self.pending = None;
    }
}

#[derive(Debug)]
struct SimState {
    eallow: bool,
    protected_violations: u32,
    pins: BTreeMap<u32, PinState>,
    gpio_accesses: u32,
    clocks: BTreeSet<PeripheralClock>,
    watchdog_enabled: bool,
    device_cal: bool,
    cpu_hz: u32,
    clock_setup_fails: bool,
    global_interrupts: bool,
    pie_ready: bool,
    timer0_period: Option<u32>,
    group1_acks: u32,
    delay_us_total: u64,
    pending_us: u32,
    scis: BTreeMap<u32, SciState>,
    spis: BTreeMap<u32, SpiState>,
    i2cs: BTreeMap<u32, I2cState>,
    adcs: BTreeMap<u32, AdcState>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            eallow: false,
            protected_violations: 0,
            pins: BTreeMap::new(),
            gpio_accesses: 0,
            clocks: BTreeSet::new(),
            watchdog_enabled: true,
            device_cal: false,
            cpu_hz: 0,
            clock_setup_fails: false,
            global_interrupts: false,
            pie_ready: false,
            timer0_period: None,
            group1_acks: 0,
            delay_us_total: 0,
            pending_us: 0,
            scis: BTreeMap::new(),
            spis: BTreeMap::new(),
            i2cs: BTreeMap::new(),
            adcs: BTreeMap::new(),
        }
    }
}

impl SimState {
    fn protected_write(&mut self) {
        if !self.eallow {
            self.protected_violations += 1;
        }
    }

    fn pin(&mut self, pin: u32) -> &mut PinState {
        self.gpio_accesses += 1;
        self.pins.entry(pin).or_default()
    }
}

/// Simulated DriverLib
pub struct SimDriverLib {
    state: RefCell<SimState>,
    timebase: &'static Timebase,
}

fn base_of(base: Option<u32>) -> u32 {
    base.unwrap_or(u32::MAX)
}

fn adc_base_for_result(result_base: u32) -> u32 {
    (0..AdcId::COUNT as u8)
        .map(AdcId::new)
        .find(|id| id.result_base() == Some(result_base))
        .and_then(AdcId::base)
        .unwrap_or(u32::MAX)
}

impl SimDriverLib {
    pub fn new(timebase: &'static Timebase) -> Self {
        Self {
            state: RefCell::new(SimState::default()),
            timebase,
        }
    }

    /// One millisecond passes per hardware status read.
    fn poll(&self) {
        self.timebase.advance();
    }

    // GPIO

    /// Drive an input pin from outside the chip.
    pub fn drive_input(&self, pin: u32, high: bool) {
        self.state.borrow_mut().pins.entry(pin).or_default().external = Some(high);
    }

    pub fn pin_direction(&self, pin: u32) -> Option<Direction> {
        self.state.borrow().pins.get(&pin).map(|p| p.direction)
    }

    pub fn pin_pad(&self, pin: u32) -> Option<PadConfig> {
        self.state.borrow().pins.get(&pin).map(|p| p.pad)
    }

    pub fn pin_mux(&self, pin: u32) -> Option<u8> {
        self.state.borrow().pins.get(&pin).map(|p| p.mux)
    }

    pub fn pin_qualification(&self, pin: u32) -> Option<Qualification> {
        self.state.borrow().pins.get(&pin).map(|p| p.qualification)
    }

    pub fn pin_is_analog(&self, pin: u32) -> bool {
        self.state.borrow().pins.get(&pin).is_some_and(|p| p.analog)
    }

    /// GPIO register accesses so far.
    pub fn gpio_accesses(&self) -> u32 {
        self.state.borrow().gpio_accesses
    }

    /// Protected-register writes made without `EALLOW`.
    pub fn protected_violations(&self) -> u32 {
        self.state.borrow().protected_violations
    }

    // SysCtl / interrupts

    pub fn clock_enabled(&self, clock: PeripheralClock) -> bool {
        self.state.borrow().clocks.contains(&clock)
    }

    pub fn watchdog_enabled(&self) -> bool {
        self.state.borrow().watchdog_enabled
    }

    pub fn device_calibrated(&self) -> bool {
        self.state.borrow().device_cal
    }

    pub fn cpu_clock(&self) -> u32 {
        self.state.borrow().cpu_hz
    }

    pub fn fail_clock_setup(&self) {
        self.state.borrow_mut().clock_setup_fails = true;
    }

    pub fn global_interrupts_enabled(&self) -> bool {
        self.state.borrow().global_interrupts
    }

    pub fn pie_initialized(&self) -> bool {
        self.state.borrow().pie_ready
    }

    pub fn timer0_period(&self) -> Option<u32> {
        self.state.borrow().timer0_period
    }

    pub fn group1_acks(&self) -> u32 {
        self.state.borrow().group1_acks
    }

    pub fn total_delay_us(&self) -> u64 {
        self.state.borrow().delay_us_total
    }

    // SCI

    pub fn sci_sent(&self, id: UartId) -> Vec<u8> {
        self.state
            .borrow()
            .scis
            .get(&base_of(id.base()))
            .map(|s| s.sent.clone())
            .unwrap_or_default()
    }

    /// Queue bytes as if they arrived on the RX line.
    pub fn sci_inject(&self, id: UartId, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let sci = state.scis.entry(base_of(id.base())).or_default();
        sci.rx.extend(bytes.iter().copied());
    }

    pub fn sci_pending_rx(&self, id: UartId) -> usize {
        self.state
            .borrow()
            .scis
            .get(&base_of(id.base()))
            .map_or(0, |s| s.rx.len())
    }

    /// Hold the transmitter so it never has room.
    pub fn sci_stall_tx(&self, id: UartId, stalled: bool) {
        let mut state = self.state.borrow_mut();
        state.scis.entry(base_of(id.base())).or_default().stalled = stalled;
    }

    /// Keep the transmitter busy for `polls` status reads after each byte.
    pub fn sci_busy_after_write(&self, id: UartId, polls: u32) {
        let mut state = self.state.borrow_mut();
        state.scis.entry(base_of(id.base())).or_default().busy_after_write = polls;
    }

    pub fn sci_config(&self, id: UartId) -> Option<(u32, u32, SciFrame)> {
        self.state
            .borrow()
            .scis
            .get(&base_of(id.base()))
            .and_then(|s| s.config)
    }

    pub fn sci_enabled(&self, id: UartId) -> bool {
        self.state
            .borrow()
            .scis
            .get(&base_of(id.base()))
            .is_some_and(|s| s.enabled && s.fifo)
    }

    // SPI

    pub fn spi_sent(&self, id: SpiId) -> Vec<u8> {
        self.state
            .borrow()
            .spis
            .get(&base_of(id.base()))
            .map(|s| s.sent.clone())
            .unwrap_or_default()
    }

    /// Bytes the peripheral answers with; once exhausted it echoes.
    pub fn spi_queue_response(&self, id: SpiId, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let spi = state.spis.entry(base_of(id.base())).or_default();
        spi.responses.extend(bytes.iter().copied());
    }

    pub fn spi_stall(&self, id: SpiId, stalled: bool) {
        let mut state = self.state.borrow_mut();
        state.spis.entry(base_of(id.base())).or_default().stalled = stalled;
    }

    pub fn spi_setup(&self, id: SpiId) -> Option<SpiSetup> {
        self.state
            .borrow()
            .spis
            .get(&base_of(id.base()))
            .and_then(|s| s.setup)
    }

    // I2C

    /// Attach a register-file target at `address` using `address_bytes`
    /// wide register pointers.
    pub fn i2c_attach(&self, id: I2cId, address: u16, address_bytes: usize) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base_of(id.base())).or_default();
        bus.targets.insert(
            address,
            I2cTarget {
                address_bytes,
                ..I2cTarget::default()
            },
        );
    }

    pub fn i2c_register(&self, id: I2cId, address: u16, reg: u16) -> Option<u8> {
        self.state
            .borrow()
            .i2cs
            .get(&base_of(id.base()))
            .and_then(|bus| bus.targets.get(&address))
            .and_then(|t| t.registers.get(&reg).copied())
    }

    pub fn i2c_set_register(&self, id: I2cId, address: u16, reg: u16, value: u8) {
        let mut state = self.state.borrow_mut();
        if let Some(target) = state
            .i2cs
            .get_mut(&base_of(id.base()))
            .and_then(|bus| bus.targets.get_mut(&address))
        {
            target.registers.insert(reg, value);
        }
    }

    /// Another controller owns the bus.
    pub fn i2c_hold_bus(&self, id: I2cId, held: bool) {
        let mut state = self.state.borrow_mut();
        state.i2cs.entry(base_of(id.base())).or_default().held = held;
    }

    /// Clock stretched forever: data-ready flags never assert.
    pub fn i2c_stall(&self, id: I2cId, stalled: bool) {
        let mut state = self.state.borrow_mut();
        state.i2cs.entry(base_of(id.base())).or_default().stalled = stalled;
    }

    pub fn i2c_bit_rate(&self, id: I2cId) -> Option<u32> {
        self.state
            .borrow()
            .i2cs
            .get(&base_of(id.base()))
            .and_then(|bus| bus.bit_rate)
    }

    // ADC

    pub fn adc_set_input(&self, id: AdcId, channel: u32, raw: u16) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base_of(id.base())).or_default();
        adc.inputs.insert(channel, raw);
    }

    /// Status polls a conversion takes; `u32::MAX` never finishes.
    pub fn adc_set_latency(&self, id: AdcId, polls: u32) {
        let mut state = self.state.borrow_mut();
        state.adcs.entry(base_of(id.base())).or_default().latency = polls;
    }

    pub fn adc_sample_window(&self, id: AdcId, channel: u32) -> Option<u32> {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .and_then(|adc| adc.socs.get(channel as usize).map(|soc| soc.1))
    }

    pub fn adc_mode(&self, id: AdcId) -> Option<AdcMode> {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .and_then(|adc| adc.mode)
    }

    pub fn adc_trimmed(&self, id: AdcId) -> bool {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .is_some_and(|adc| adc.trimmed)
    }
}

impl DriverLib for SimDriverLib {
    fn eallow(&self) {
        self.state.borrow_mut().eallow = true;
    }

    fn edis(&self) {
        self.state.borrow_mut().eallow = false;
    }

    fn sysctl_device_cal(&self) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.device_cal = true;
    }

    fn sysctl_set_clock(&self, cpu_hz: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        if state.clock_setup_fails {
            return false;
        }
        state.cpu_hz = cpu_hz;
        true
    }

    fn sysctl_disable_watchdog(&self) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.watchdog_enabled = false;
    }

    fn sysctl_enable_peripheral(&self, clock: PeripheralClock) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.clocks.insert(clock);
    }

    fn sysctl_disable_peripheral(&self, clock: PeripheralClock) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.clocks.remove(&clock);
    }

    fn sysctl_delay_us(&self, us: u32) {
        let whole_ms = {
            let mut state = self.state.borrow_mut();
            state.delay_us_total += us as u64;
            let total = state.pending_us as u64 + us as u64;
            state.pending_us = (total % 1_000) as u32;
            total / 1_000
        };
        for _ in 0..whole_ms {
            self.timebase.advance();
        }
    }

    fn sysctl_reset_device(&self) {
        panic!("device reset");
    }

    fn interrupt_disable_global(&self) {
        self.state.borrow_mut().global_interrupts = false;
    }

    fn interrupt_enable_global(&self) {
        self.state.borrow_mut().global_interrupts = true;
    }

    fn interrupt_init_module(&self) {
        self.state.borrow_mut().pie_ready = true;
    }

    fn interrupt_init_vector_table(&self) {}

    fn interrupt_clear_all_flags(&self) {}

    fn interrupt_ack_group1(&self) {
        self.state.borrow_mut().group1_acks += 1;
    }

    fn cpu_timer0_start_periodic(&self, period_cycles: u32) {
        self.state.borrow_mut().timer0_period = Some(period_cycles);
    }

    fn cpu_timer0_stop(&self) {
        self.state.borrow_mut().timer0_period = None;
    }

    fn gpio_set_pin_config(&self, pin: u32, mux: u8) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.pin(pin).mux = mux;
    }

    fn gpio_set_direction_mode(&self, pin: u32, direction: Direction) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.pin(pin).direction = direction;
    }

    fn gpio_set_pad_config(&self, pin: u32, pad: PadConfig) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.pin(pin).pad = pad;
    }

    fn gpio_set_qualification_mode(&self, pin: u32, qualification: Qualification) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.pin(pin).qualification = qualification;
    }

    fn gpio_set_analog_mode(&self, pin: u32, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.pin(pin).analog = enabled;
    }

    fn gpio_write_pin(&self, pin: u32, high: bool) {
        self.state.borrow_mut().pin(pin).latch = high;
    }

    fn gpio_read_pin(&self, pin: u32) -> bool {
        self.state.borrow_mut().pin(pin).level()
    }

    fn gpio_toggle_pin(&self, pin: u32) {
        let mut state = self.state.borrow_mut();
        let p = state.pin(pin);
        p.latch = !p.latch;
    }

    fn sci_set_config(&self, base: u32, lspclk_hz: u32, baud: u32, frame: SciFrame) {
        let mut state = self.state.borrow_mut();
        state.scis.entry(base).or_default().config = Some((lspclk_hz, baud, frame));
    }

    fn sci_enable_fifo(&self, base: u32) {
        self.state.borrow_mut().scis.entry(base).or_default().fifo = true;
    }

    fn sci_enable_module(&self, base: u32) {
        self.state.borrow_mut().scis.entry(base).or_default().enabled = true;
    }

    fn sci_disable_module(&self, base: u32) {
        self.state.borrow_mut().scis.entry(base).or_default().enabled = false;
    }

    fn sci_perform_software_reset(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let sci = state.scis.entry(base).or_default();
        sci.rx.clear();
        sci.busy_left = 0;
    }

    fn sci_is_space_available(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .scis
            .get(&base)
            .is_some_and(|s| s.enabled && !s.stalled)
    }

    fn sci_is_transmitter_busy(&self, base: u32) -> bool {
        self.poll();
        let mut state = self.state.borrow_mut();
        let sci = state.scis.entry(base).or_default();
        if sci.busy_left > 0 {
            sci.busy_left -= 1;
            true
        } else {
            false
        }
    }

    fn sci_is_data_available(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .scis
            .get(&base)
            .is_some_and(|s| s.enabled && !s.rx.is_empty())
    }

    fn sci_write_char(&self, base: u32, byte: u8) {
        let mut state = self.state.borrow_mut();
        let sci = state.scis.entry(base).or_default();
        sci.sent.push(byte);
        sci.busy_left = sci.busy_after_write;
    }

    fn sci_read_char(&self, base: u32) -> u8 {
        let mut state = self.state.borrow_mut();
        state
            .scis
            .entry(base)
            .or_default()
            .rx
            .pop_front()
            .unwrap_or(0)
    }

    fn spi_set_config(
        &self,
        base: u32,
        _lspclk_hz: u32,
        protocol: SpiProtocol,
        role: SpiRole,
        bit_rate: u32,
        data_width: u8,
    ) {
        let mut state = self.state.borrow_mut();
        state.spis.entry(base).or_default().setup = Some(SpiSetup {
            protocol,
            role,
            bit_rate,
            data_width,
        });
    }

    fn spi_enable_fifo(&self, _base: u32) {}

    fn spi_enable_module(&self, base: u32) {
        self.state.borrow_mut().spis.entry(base).or_default().enabled = true;
    }

    fn spi_disable_module(&self, base: u32) {
        self.state.borrow_mut().spis.entry(base).or_default().enabled = false;
    }

    fn spi_tx_fifo_has_space(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .spis
            .get(&base)
            .is_some_and(|s| s.enabled && !s.stalled)
    }

    fn spi_rx_fifo_has_data(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .spis
            .get(&base)
            .is_some_and(|s| !s.rx_fifo.is_empty())
    }

    fn spi_is_busy(&self, base: u32) -> bool {
        self.state.borrow().spis.get(&base).is_some_and(|s| s.stalled)
    }

    fn spi_write_data(&self, base: u32, data: u16) {
        let mut state = self.state.borrow_mut();
        let spi = state.spis.entry(base).or_default();
        let byte = (data >> 8) as u8;
        spi.sent.push(byte);
        let reply = spi.responses.pop_front().unwrap_or(byte);
        spi.rx_fifo.push_back(reply as u16);
    }

    fn spi_read_data(&self, base: u32) -> u16 {
        let mut state = self.state.borrow_mut();
        state
            .spis
            .entry(base)
            .or_default()
            .rx_fifo
            .pop_front()
            .unwrap_or(0)
    }

    fn i2c_init_controller(&self, base: u32, _sysclk_hz: u32, bit_rate: u32) {
        self.state.borrow_mut().i2cs.entry(base).or_default().bit_rate = Some(bit_rate);
    }

    fn i2c_enable_module(&self, base: u32) {
        self.state.borrow_mut().i2cs.entry(base).or_default().enabled = true;
    }

    fn i2c_disable_module(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.enabled = false;
        bus.active = false;
    }

    fn i2c_set_target_address(&self, base: u32, address: u16) {
        self.state.borrow_mut().i2cs.entry(base).or_default().target_address = address;
    }

    fn i2c_set_data_count(&self, base: u32, count: u16) {
        self.state.borrow_mut().i2cs.entry(base).or_default().count = count;
    }

    fn i2c_set_direction(&self, base: u32, direction: I2cDirection) {
        self.state.borrow_mut().i2cs.entry(base).or_default().direction = direction;
    }

    fn i2c_send_start(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.transferred = 0;
        bus.register_access_ready = false;
        bus.stop_detected = false;
        if !bus.enabled {
            return;
        }
        let address = bus.target_address;
        let direction = bus.direction;
        match bus.targets.get_mut(&address) {
            Some(target) => {
                if direction == I2cDirection::ControllerSend {
                    target.pointer_bytes_seen = 0;
                }
                bus.active = true;
                bus.register_access_ready = bus.count == 0;
            }
            None => {
                bus.active = false;
                bus.nack = true;
            }
        }
    }

    fn i2c_send_stop(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.active = false;
        bus.register_access_ready = false;
        bus.stop_detected = bus.enabled;
    }

    fn i2c_put_data(&self, base: u32, byte: u8) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if !bus.active {
            return;
        }
        let address = bus.target_address;
        if let Some(target) = bus.targets.get_mut(&address) {
            target.write(byte);
        }
        bus.advance_count();
    }

    fn i2c_get_data(&self, base: u32) -> u8 {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if !bus.active {
            return 0;
        }
        let address = bus.target_address;
        let byte = bus
            .targets
            .get_mut(&address)
            .map_or(0, |target| target.read());
        bus.advance_count();
        byte
    }

    fn i2c_get_status(&self, base: u32) -> I2cStatus {
        self.poll();
        let state = self.state.borrow();
        let Some(bus) = state.i2cs.get(&base) else {
            return I2cStatus::default();
        };
        let mut status = I2cStatus::default();
        let room = bus.active && !bus.stalled && bus.transferred < bus.count;
        if bus.nack {
            status = status.union(I2cStatus::NO_ACK);
        }
        if bus.register_access_ready && !bus.stalled {
            status = status.union(I2cStatus::REG_ACCESS_READY);
        }
        if room && bus.direction == I2cDirection::ControllerSend {
            status = status.union(I2cStatus::TX_DATA_READY);
        }
        if room && bus.direction == I2cDirection::ControllerReceive {
            status = status.union(I2cStatus::RX_DATA_READY);
        }
        if bus.stop_detected {
            status = status.union(I2cStatus::STOP_CONDITION);
        }
        if bus.active || bus.held {
            status = status.union(I2cStatus::BUS_BUSY);
        }
        status
    }

    fn i2c_clear_status(&self, base: u32, status: I2cStatus) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if status.contains(I2cStatus::NO_ACK) {
            bus.nack = false;
        }
        if status.contains(I2cStatus::STOP_CONDITION) {
            bus.stop_detected = false;
        }
        if status.contains(I2cStatus::REG_ACCESS_READY) {
            bus.register_access_ready = false;
        }
    }

    fn adc_set_mode(&self, base: u32, mode: AdcMode) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.adcs.entry(base).or_default().mode = Some(mode);
    }

    fn adc_enable_converter(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.adcs.entry(base).or_default().enabled = true;
    }

    fn adc_disable_converter(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.adcs.entry(base).or_default().enabled = false;
    }

    fn adc_setup_soc(&self, base: u32, soc: u8, channel: u32, sample_window: u32) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        let adc = state.adcs.entry(base).or_default();
        if let Some(slot) = adc.socs.get_mut(soc as usize) {
            *slot = (channel, sample_window);
        }
    }

    fn adc_set_interrupt_source(&self, base: u32, soc: u8) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.adcs.entry(base).or_default().interrupt_source = soc;
    }

    fn adc_get_interrupt_source(&self, base: u32) -> u8 {
        self.state
            .borrow()
            .adcs
            .get(&base)
            .map_or(0, |adc| adc.interrupt_source)
    }

    fn adc_force_soc(&self, base: u32, soc: u8) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        if adc.enabled && (soc as u32) < chip::ADC_SOC_COUNT {
            adc.pending = Some((soc, adc.latency));
        }
    }

    fn adc_is_busy(&self, base: u32) -> bool {
        self.state
            .borrow()
            .adcs
            .get(&base)
            .is_some_and(|adc| adc.pending.is_some())
    }

    fn adc_get_interrupt_status(&self, base: u32) -> bool {
        self.poll();
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        adc.progress();
        adc.interrupt_flag
    }

    fn adc_clear_interrupt_status(&self, base: u32) {
        self.state
            .borrow_mut()
            .adcs
            .entry(base)
            .or_default()
            .interrupt_flag = false;
    }

    fn adc_set_offset_trim(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        state.protected_write();
        state.adcs.entry(base).or_default().trimmed = true;
    }

    fn adc_read_result(&self, result_base: u32, soc: u8) -> u16 {
        let base = adc_base_for_result(result_base);
        self.state
            .borrow()
            .adcs
            .get(&base)
            .and_then(|adc| adc.results.get(soc as usize).copied())
            .unwrap_or(0)
    }
}
