//! Simulated Cube HAL/LL for host builds and tests
//!
//! Each flag read advances `HAL_GetTick` by one millisecond, so polling
//! loops see time pass. The DWT cycle counter moves a fixed step per read.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::chip;
use crate::cube::{
    AdcResolutionKind, ClkInit, ClockGate, CubeHal, CubeStatus, GpioInit, GpioModeKind,
    GpioPullKind, I2cEndMode, I2cIsr, I2cTransfer, OscInit, SpiSetup, UsartFrame,
};
use crate::ids::{AdcId, I2cId, SpiId, UartId};
use crate::pins::Pin;
use crate::Hal;

/// Cycles the DWT counter advances per read.
pub const CYCLES_PER_READ: u32 = 17;

/// A [`Hal`] over fresh simulated hardware.
pub fn hal() -> Hal<SimCube> {
    Hal::new(SimCube::new())
}

#[derive(Debug, Default, Clone, Copy)]
struct PinState {
    init: Option<GpioInit>,
    odr: bool,
    external: Option<bool>,
}

impl PinState {
    fn level(&self) -> bool {
        match self.init.map(|init| (init.mode, init.pull)) {
            Some((GpioModeKind::OutputPushPull, _)) => self.odr,
            Some((_, pull)) => self.external.unwrap_or(pull == GpioPullKind::PullUp),
            None => self.external.unwrap_or(false),
        }
    }
}

#[derive(Debug, Default)]
struct UsartState {
    enabled: bool,
    tx_rx: bool,
    fifo: bool,
    frame: Option<UsartFrame>,
    baud: Option<(u32, u32)>,
    sent: Vec<u8>,
    rx: VecDeque<u8>,
    stalled: bool,
    busy_after_write: u32,
    busy_left: u32,
}

#[derive(Debug, Default)]
struct SpiState {
    enabled: bool,
    setup: Option<SpiSetup>,
    sent: Vec<u8>,
    responses: VecDeque<u8>,
    rx: VecDeque<u8>,
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
struct I2cBus {
    enabled: bool,
    timing: Option<u32>,
    target: u16,
    active: bool,
    remaining: u8,
    read: bool,
    end: I2cEndMode,
    nack: bool,
    stop: bool,
    transfer_complete: bool,
    held: bool,
    stalled: bool,
    targets: BTreeMap<u16, I2cTarget>,
}

impl Default for I2cBus {
    fn default() -> Self {
        Self {
            enabled: false,
            timing: None,
            target: 0,
            active: false,
            remaining: 0,
            read: false,
            end: I2cEndMode::AutoEnd,
            nack: false,
            stop: false,
            transfer_complete: false,
            held: false,
            stalled: false,
            targets: BTreeMap::new(),
        }
    }
}

impl I2cBus {
    fn byte_done(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.complete();
        }
    }

    fn complete(&mut self) {
        match self.end {
            I2cEndMode::AutoEnd => {
                self.active = false;
                self.stop = true;
            }
            I2cEndMode::SoftEnd => self.transfer_complete = true,
        }
    }
}

#[derive(Debug)]
struct AdcUnit {
    regulator: bool,
    enabled: bool,
    ready_blocked: bool,
    resolution: Option<AdcResolutionKind>,
    sampling: [u8; chip::ADC_CHANNEL_COUNT as usize],
    sequence: u32,
    pending: Option<u32>,
    eoc: bool,
    data: u16,
    inputs: BTreeMap<u32, u16>,
    latency: u32,
    calibrating: u32,
    calibrated: bool,
}

impl Default for AdcUnit {
    fn default() -> Self {
        Self {
            regulator: false,
            enabled: false,
            ready_blocked: false,
            resolution: None,
            sampling: [0; chip::ADC_CHANNEL_COUNT as usize],
            sequence: 0,
            pending: None,
            eoc: false,
            data: 0,
            inputs: BTreeMap::new(),
            latency: 2,
            calibrating: 0,
            calibrated: false,
        }
    }
}

impl AdcUnit {
    fn progress(&mut self) {
        let Some(remaining) = self.pending else {
            return;
        };
        if remaining > 0 {
            self.pending = Some(remaining - 1);
            return;
        }
        let raw = self.inputs.get(&self.sequence).copied().unwrap_or(0);
        let bits = match self.resolution {
            Some(AdcResolutionKind::Bits10) => 10,
            Some(AdcResolutionKind::Bits8) => 8,
            Some(AdcResolutionKind::Bits6) => 6,
            _ => 12,
        };
        self.data = raw & ((1u16 << bits) - 1);
        self.eoc = true;
        self.pending = None;
    }
}

#[derive(Debug)]
struct SimState {
    tick: u32,
    hal_ready: bool,
    tick_priority: Option<u32>,
    boost: bool,
    osc: Option<OscInit>,
    clk: Option<(ClkInit, u32)>,
    core_hz: u32,
    osc_fails: bool,
    dwt_enabled: bool,
    cycles: u64,
    gates: BTreeSet<ClockGate>,
    pins: BTreeMap<(u32, u16), PinState>,
    usarts: BTreeMap<u32, UsartState>,
    spis: BTreeMap<u32, SpiState>,
    i2cs: BTreeMap<u32, I2cBus>,
    adcs: BTreeMap<u32, AdcUnit>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            tick: 0,
            hal_ready: false,
            tick_priority: None,
            boost: false,
            osc: None,
            clk: None,
            core_hz: chip::HSI_HZ,
            osc_fails: false,
            dwt_enabled: false,
            cycles: 0,
            gates: BTreeSet::new(),
            pins: BTreeMap::new(),
            usarts: BTreeMap::new(),
            spis: BTreeMap::new(),
            i2cs: BTreeMap::new(),
            adcs: BTreeMap::new(),
        }
    }
}

impl SimState {
    fn bus_hz(&self, divider: u32) -> u32 {
        self.core_hz / divider.max(1)
    }
}

/// Simulated Cube library
#[derive(Default)]
pub struct SimCube {
    state: RefCell<SimState>,
}

fn base_of(base: Option<u32>) -> u32 {
    base.unwrap_or(u32::MAX)
}

fn pin_key(pin: Pin) -> (u32, u16) {
    (pin.port_base(), pin.mask())
}

impl SimCube {
    pub fn new() -> Self {
        Self::default()
    }

    fn poll(&self) {
        let mut state = self.state.borrow_mut();
        state.tick = state.tick.wrapping_add(1);
    }

    pub fn set_tick(&self, tick: u32) {
        self.state.borrow_mut().tick = tick;
    }

    // Core and clocks

    pub fn hal_initialized(&self) -> bool {
        self.state.borrow().hal_ready
    }

    pub fn tick_priority(&self) -> Option<u32> {
        self.state.borrow().tick_priority
    }

    pub fn boost_enabled(&self) -> bool {
        self.state.borrow().boost
    }

    pub fn osc_config(&self) -> Option<OscInit> {
        self.state.borrow().osc
    }

    pub fn flash_latency(&self) -> Option<u32> {
        self.state.borrow().clk.map(|(_, latency)| latency)
    }

    pub fn fail_clock_setup(&self) {
        self.state.borrow_mut().osc_fails = true;
    }

    pub fn cycle_counter_enabled(&self) -> bool {
        self.state.borrow().dwt_enabled
    }

    pub fn cycles(&self) -> u64 {
        self.state.borrow().cycles
    }

    pub fn clock_enabled(&self, gate: ClockGate) -> bool {
        self.state.borrow().gates.contains(&gate)
    }

    // GPIO

    pub fn drive_input(&self, pin: Pin, high: bool) {
        self.state
            .borrow_mut()
            .pins
            .entry(pin_key(pin))
            .or_default()
            .external = Some(high);
    }

    pub fn pin_config(&self, pin: Pin) -> Option<GpioInit> {
        self.state
            .borrow()
            .pins
            .get(&pin_key(pin))
            .and_then(|p| p.init)
    }

    pub fn pin_output_latch(&self, pin: Pin) -> bool {
        self.state
            .borrow()
            .pins
            .get(&pin_key(pin))
            .is_some_and(|p| p.odr)
    }

    // USART

    pub fn usart_sent(&self, id: UartId) -> Vec<u8> {
        self.state
            .borrow()
            .usarts
            .get(&base_of(id.base()))
            .map(|u| u.sent.clone())
            .unwrap_or_default()
    }

    pub fn usart_inject(&self, id: UartId, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let usart = state.usarts.entry(base_of(id.base())).or_default();
        usart.rx.extend(bytes.iter().copied());
    }

    pub fn usart_stall_tx(&self, id: UartId, stalled: bool) {
        let mut state = self.state.borrow_mut();
        state.usarts.entry(base_of(id.base())).or_default().stalled = stalled;
    }

    /// TC stays low for `polls` reads after each byte.
    pub fn usart_busy_after_write(&self, id: UartId, polls: u32) {
        let mut state = self.state.borrow_mut();
        state
            .usarts
            .entry(base_of(id.base()))
            .or_default()
            .busy_after_write = polls;
    }

    pub fn usart_frame(&self, id: UartId) -> Option<UsartFrame> {
        self.state
            .borrow()
            .usarts
            .get(&base_of(id.base()))
            .and_then(|u| u.frame)
    }

    /// Kernel clock and baud rate as programmed.
    pub fn usart_baud(&self, id: UartId) -> Option<(u32, u32)> {
        self.state
            .borrow()
            .usarts
            .get(&base_of(id.base()))
            .and_then(|u| u.baud)
    }

    pub fn usart_enabled(&self, id: UartId) -> bool {
        self.state
            .borrow()
            .usarts
            .get(&base_of(id.base()))
            .is_some_and(|u| u.enabled && u.tx_rx && u.fifo)
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

    /// Attach a register-file target at the 7-bit `address`.
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

    pub fn i2c_hold_bus(&self, id: I2cId, held: bool) {
        let mut state = self.state.borrow_mut();
        state.i2cs.entry(base_of(id.base())).or_default().held = held;
    }

    pub fn i2c_stall(&self, id: I2cId, stalled: bool) {
        let mut state = self.state.borrow_mut();
        state.i2cs.entry(base_of(id.base())).or_default().stalled = stalled;
    }

    pub fn i2c_timing(&self, id: I2cId) -> Option<u32> {
        self.state
            .borrow()
            .i2cs
            .get(&base_of(id.base()))
            .and_then(|bus| bus.timing)
    }

    // ADC

    pub fn adc_set_input(&self, id: AdcId, channel: u32, raw: u16) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base_of(id.base())).or_default();
        adc.inputs.insert(channel, raw);
    }

    /// Flag polls a conversion takes; `u32::MAX` never finishes.
    pub fn adc_set_latency(&self, id: AdcId, polls: u32) {
        let mut state = self.state.borrow_mut();
        state.adcs.entry(base_of(id.base())).or_default().latency = polls;
    }

    /// ADRDY never asserts.
    pub fn adc_block_ready(&self, id: AdcId) {
        let mut state = self.state.borrow_mut();
        state.adcs.entry(base_of(id.base())).or_default().ready_blocked = true;
    }

    pub fn adc_sampling_code(&self, id: AdcId, channel: u32) -> Option<u8> {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .and_then(|adc| adc.sampling.get(channel as usize).copied())
    }

    pub fn adc_resolution(&self, id: AdcId) -> Option<AdcResolutionKind> {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .and_then(|adc| adc.resolution)
    }

    pub fn adc_enabled(&self, id: AdcId) -> bool {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .is_some_and(|adc| adc.regulator && adc.enabled)
    }

    pub fn adc_calibrated(&self, id: AdcId) -> bool {
        self.state
            .borrow()
            .adcs
            .get(&base_of(id.base()))
            .is_some_and(|adc| adc.calibrated)
    }
}

impl CubeHal for SimCube {
    fn hal_init(&self) -> CubeStatus {
        self.state.borrow_mut().hal_ready = true;
        CubeStatus::Ok
    }

    fn hal_deinit(&self) -> CubeStatus {
        let mut state = self.state.borrow_mut();
        state.hal_ready = false;
        state.gates.clear();
        CubeStatus::Ok
    }

    fn hal_init_tick(&self, priority: u32) -> CubeStatus {
        self.state.borrow_mut().tick_priority = Some(priority);
        CubeStatus::Ok
    }

    fn hal_inc_tick(&self) {
        self.poll();
    }

    fn hal_get_tick(&self) -> u32 {
        self.state.borrow().tick
    }

    fn hal_delay(&self, ms: u32) {
        let mut state = self.state.borrow_mut();
        state.tick = state.tick.wrapping_add(ms);
    }

    fn pwr_enable_range1_boost(&self) {
        self.state.borrow_mut().boost = true;
    }

    fn rcc_osc_config(&self, osc: &OscInit) -> CubeStatus {
        let mut state = self.state.borrow_mut();
        if state.osc_fails {
            return CubeStatus::Timeout;
        }
        state.osc = Some(*osc);
        CubeStatus::Ok
    }

    fn rcc_clock_config(&self, clk: &ClkInit, flash_latency: u32) -> CubeStatus {
        let mut state = self.state.borrow_mut();
        let Some(osc) = state.osc else {
            return CubeStatus::Error;
        };
        state.clk = Some((*clk, flash_latency));
        if clk.sysclk_from_pll {
            state.core_hz = chip::HSI_HZ / osc.pll_m * osc.pll_n / osc.pll_r / clk.ahb_divider;
        }
        CubeStatus::Ok
    }

    fn rcc_enable(&self, gate: ClockGate) {
        self.state.borrow_mut().gates.insert(gate);
    }

    fn rcc_disable(&self, gate: ClockGate) {
        self.state.borrow_mut().gates.remove(&gate);
    }

    fn system_core_clock(&self) -> u32 {
        self.state.borrow().core_hz
    }

    fn pclk1_freq(&self) -> u32 {
        let state = self.state.borrow();
        state.bus_hz(state.clk.map_or(1, |(clk, _)| clk.apb1_divider))
    }

    fn pclk2_freq(&self) -> u32 {
        let state = self.state.borrow();
        state.bus_hz(state.clk.map_or(1, |(clk, _)| clk.apb2_divider))
    }

    fn dwt_enable_cycle_counter(&self) {
        self.state.borrow_mut().dwt_enabled = true;
    }

    fn dwt_cycle_count(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        if state.dwt_enabled {
            state.cycles += CYCLES_PER_READ as u64;
        }
        state.cycles as u32
    }

    fn nvic_system_reset(&self) -> ! {
        panic!("system reset");
    }

    fn gpio_init(&self, port_base: u32, init: &GpioInit) {
        let mut state = self.state.borrow_mut();
        state.pins.entry((port_base, init.pin_mask)).or_default().init = Some(*init);
    }

    fn gpio_deinit(&self, port_base: u32, pin_mask: u16) {
        let mut state = self.state.borrow_mut();
        if let Some(pin) = state.pins.get_mut(&(port_base, pin_mask)) {
            pin.init = None;
            pin.odr = false;
        }
    }

    fn gpio_write_pin(&self, port_base: u32, pin_mask: u16, high: bool) {
        let mut state = self.state.borrow_mut();
        state.pins.entry((port_base, pin_mask)).or_default().odr = high;
    }

    fn gpio_read_pin(&self, port_base: u32, pin_mask: u16) -> bool {
        self.state
            .borrow()
            .pins
            .get(&(port_base, pin_mask))
            .is_some_and(PinState::level)
    }

    fn gpio_toggle_pin(&self, port_base: u32, pin_mask: u16) {
        let mut state = self.state.borrow_mut();
        let pin = state.pins.entry((port_base, pin_mask)).or_default();
        pin.odr = !pin.odr;
    }

    fn usart_disable(&self, base: u32) {
        self.state.borrow_mut().usarts.entry(base).or_default().enabled = false;
    }

    fn usart_config_character(&self, base: u32, frame: &UsartFrame) {
        self.state.borrow_mut().usarts.entry(base).or_default().frame = Some(*frame);
    }

    fn usart_set_baud_rate(&self, base: u32, pclk_hz: u32, baud: u32) {
        self.state.borrow_mut().usarts.entry(base).or_default().baud = Some((pclk_hz, baud));
    }

    fn usart_enable_fifo(&self, base: u32) {
        self.state.borrow_mut().usarts.entry(base).or_default().fifo = true;
    }

    fn usart_enable_direction_tx_rx(&self, base: u32) {
        self.state.borrow_mut().usarts.entry(base).or_default().tx_rx = true;
    }

    fn usart_enable(&self, base: u32) {
        self.state.borrow_mut().usarts.entry(base).or_default().enabled = true;
    }

    fn usart_request_flush(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let usart = state.usarts.entry(base).or_default();
        usart.rx.clear();
        usart.busy_left = 0;
    }

    fn usart_is_tx_not_full(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .usarts
            .get(&base)
            .is_some_and(|u| u.enabled && !u.stalled)
    }

    fn usart_is_transfer_complete(&self, base: u32) -> bool {
        self.poll();
        let mut state = self.state.borrow_mut();
        let usart = state.usarts.entry(base).or_default();
        if usart.busy_left > 0 {
            usart.busy_left -= 1;
            false
        } else {
            true
        }
    }

    fn usart_is_rx_not_empty(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .usarts
            .get(&base)
            .is_some_and(|u| u.enabled && !u.rx.is_empty())
    }

    fn usart_transmit_data8(&self, base: u32, byte: u8) {
        let mut state = self.state.borrow_mut();
        let usart = state.usarts.entry(base).or_default();
        usart.sent.push(byte);
        usart.busy_left = usart.busy_after_write;
    }

    fn usart_receive_data8(&self, base: u32) -> u8 {
        let mut state = self.state.borrow_mut();
        state
            .usarts
            .entry(base)
            .or_default()
            .rx
            .pop_front()
            .unwrap_or(0)
    }

    fn spi_disable(&self, base: u32) {
        self.state.borrow_mut().spis.entry(base).or_default().enabled = false;
    }

    fn spi_configure(&self, base: u32, setup: &SpiSetup) {
        self.state.borrow_mut().spis.entry(base).or_default().setup = Some(*setup);
    }

    fn spi_enable(&self, base: u32) {
        self.state.borrow_mut().spis.entry(base).or_default().enabled = true;
    }

    fn spi_is_tx_empty(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .spis
            .get(&base)
            .is_some_and(|s| s.enabled && !s.stalled)
    }

    fn spi_is_rx_not_empty(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .spis
            .get(&base)
            .is_some_and(|s| !s.rx.is_empty())
    }

    fn spi_is_busy(&self, base: u32) -> bool {
        self.state.borrow().spis.get(&base).is_some_and(|s| s.stalled)
    }

    fn spi_transmit_data8(&self, base: u32, byte: u8) {
        let mut state = self.state.borrow_mut();
        let spi = state.spis.entry(base).or_default();
        spi.sent.push(byte);
        let reply = spi.responses.pop_front().unwrap_or(byte);
        spi.rx.push_back(reply);
    }

    fn spi_receive_data8(&self, base: u32) -> u8 {
        let mut state = self.state.borrow_mut();
        state
            .spis
            .entry(base)
            .or_default()
            .rx
            .pop_front()
            .unwrap_or(0)
    }

    fn i2c_disable(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.enabled = false;
        bus.active = false;
    }

    fn i2c_set_timing(&self, base: u32, timing: u32) {
        self.state.borrow_mut().i2cs.entry(base).or_default().timing = Some(timing);
    }

    fn i2c_enable(&self, base: u32) {
        self.state.borrow_mut().i2cs.entry(base).or_default().enabled = true;
    }

    fn i2c_handle_transfer(&self, base: u32, transfer: &I2cTransfer) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.transfer_complete = false;
        if !bus.enabled {
            return;
        }
        let address = transfer.address >> 1;
        match bus.targets.get_mut(&address) {
            Some(target) => {
                if !transfer.read {
                    target.pointer_bytes_seen = 0;
                }
                bus.target = address;
                bus.active = true;
                bus.remaining = transfer.bytes;
                bus.read = transfer.read;
                bus.end = transfer.end;
                if transfer.bytes == 0 {
                    bus.complete();
                }
            }
            None => {
                // Address NACK, then the automatic STOP.
                bus.active = false;
                bus.nack = true;
                bus.stop = true;
            }
        }
    }

    fn i2c_generate_stop(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        bus.active = false;
        bus.transfer_complete = false;
        bus.stop = bus.enabled;
    }

    fn i2c_isr(&self, base: u32) -> I2cIsr {
        self.poll();
        let state = self.state.borrow();
        let Some(bus) = state.i2cs.get(&base) else {
            return I2cIsr::default();
        };
        let room = bus.active && !bus.stalled && bus.remaining > 0;
        let mut isr = I2cIsr::default();
        if bus.nack {
            isr = isr.union(I2cIsr::NACKF);
        }
        if bus.stop {
            isr = isr.union(I2cIsr::STOPF);
        }
        if bus.transfer_complete && !bus.stalled {
            isr = isr.union(I2cIsr::TC);
        }
        if room && !bus.read {
            isr = isr.union(I2cIsr::TXIS);
        }
        if room && bus.read {
            isr = isr.union(I2cIsr::RXNE);
        }
        if bus.active || bus.held {
            isr = isr.union(I2cIsr::BUSY);
        }
        isr
    }

    fn i2c_clear_flags(&self, base: u32, flags: I2cIsr) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if flags.contains(I2cIsr::NACKF) {
            bus.nack = false;
        }
        if flags.contains(I2cIsr::STOPF) {
            bus.stop = false;
        }
    }

    fn i2c_transmit_data8(&self, base: u32, byte: u8) {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if !bus.active || bus.read {
            return;
        }
        let address = bus.target;
        if let Some(target) = bus.targets.get_mut(&address) {
            target.write(byte);
        }
        bus.byte_done();
    }

    fn i2c_receive_data8(&self, base: u32) -> u8 {
        let mut state = self.state.borrow_mut();
        let bus = state.i2cs.entry(base).or_default();
        if !bus.active || !bus.read {
            return 0;
        }
        let address = bus.target;
        let byte = bus
            .targets
            .get_mut(&address)
            .map_or(0, |target| target.read());
        bus.byte_done();
        byte
    }

    fn adc_enable_regulator(&self, base: u32) {
        self.state.borrow_mut().adcs.entry(base).or_default().regulator = true;
    }

    fn adc_set_resolution(&self, base: u32, resolution: AdcResolutionKind) {
        self.state.borrow_mut().adcs.entry(base).or_default().resolution = Some(resolution);
    }

    fn adc_set_sampling_time(&self, base: u32, channel: u32, code: u8) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        if let Some(slot) = adc.sampling.get_mut(channel as usize) {
            *slot = code;
        }
    }

    fn adc_set_sequence(&self, base: u32, channel: u32) {
        self.state.borrow_mut().adcs.entry(base).or_default().sequence = channel;
    }

    fn adc_enable(&self, base: u32) {
        self.state.borrow_mut().adcs.entry(base).or_default().enabled = true;
    }

    fn adc_disable(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        adc.enabled = false;
        adc.pending = None;
    }

    fn adc_is_ready(&self, base: u32) -> bool {
        self.poll();
        self.state
            .borrow()
            .adcs
            .get(&base)
            .is_some_and(|adc| adc.regulator && adc.enabled && !adc.ready_blocked)
    }

    fn adc_start_conversion(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        if adc.enabled {
            adc.pending = Some(adc.latency);
        }
    }

    fn adc_stop_conversion(&self, base: u32) {
        self.state.borrow_mut().adcs.entry(base).or_default().pending = None;
    }

    fn adc_is_converting(&self, base: u32) -> bool {
        self.state
            .borrow()
            .adcs
            .get(&base)
            .is_some_and(|adc| adc.pending.is_some())
    }

    fn adc_is_end_of_conversion(&self, base: u32) -> bool {
        self.poll();
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        adc.progress();
        adc.eoc
    }

    fn adc_clear_end_of_conversion(&self, base: u32) {
        self.state.borrow_mut().adcs.entry(base).or_default().eoc = false;
    }

    fn adc_read_data(&self, base: u32) -> u16 {
        self.state.borrow().adcs.get(&base).map_or(0, |adc| adc.data)
    }

    fn adc_start_calibration(&self, base: u32) {
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        if !adc.enabled {
            adc.calibrating = 3;
        }
    }

    fn adc_is_calibrating(&self, base: u32) -> bool {
        self.poll();
        let mut state = self.state.borrow_mut();
        let adc = state.adcs.entry(base).or_default();
        if adc.calibrating == 0 {
            return false;
        }
        adc.calibrating -= 1;
        if adc.calibrating == 0 {
            adc.calibrated = true;
        }
        adc.calibrating > 0
    }
}
