use xmcu_hal::adc::{to_voltage, Adc, AdcConfig, AdcResolution, AdcState};
use xmcu_hal::{HalError, Timeout};

use super::{elapsed, setup};
use crate::cube::{AdcResolutionKind, ClockGate};
use crate::ids::AdcId;
use crate::sim::SimCube;
use crate::Hal;

const T: Timeout = Timeout::from_millis(20);

fn ready_adc(resolution: AdcResolution) -> Hal<SimCube> {
    let hal = setup();
    let config = AdcConfig {
        resolution,
        ..AdcConfig::default()
    };
    hal.adc().init(AdcId::ADC1, &config).unwrap();
    hal
}

#[test]
fn test_init_configures_converter() {
    let hal = ready_adc(AdcResolution::Bits12);
    let sim = hal.bindings();
    assert!(sim.adc_enabled(AdcId::ADC1));
    assert!(sim.clock_enabled(ClockGate::Adc12));
    assert_eq!(sim.adc_resolution(AdcId::ADC1), Some(AdcResolutionKind::Bits12));
    // Default 15 cycles rounds up to 24.5.
    assert_eq!(sim.adc_sampling_code(AdcId::ADC1, 0), Some(3));
    assert_eq!(sim.adc_sampling_code(AdcId::ADC1, 18), Some(3));
}

#[test]
fn test_unsupported_settings() {
    let hal = setup();
    let mut adc = hal.adc();
    let wide = AdcConfig {
        resolution: AdcResolution::Bits16,
        ..AdcConfig::default()
    };
    assert_eq!(adc.init(AdcId::ADC2, &wide), Err(HalError::InvalidParam));
    let slow = AdcConfig {
        sampling_time: 700,
        ..AdcConfig::default()
    };
    assert_eq!(adc.init(AdcId::ADC2, &slow), Err(HalError::InvalidParam));
    assert_eq!(
        adc.init(AdcId::new(5), &AdcConfig::default()),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_converter_that_never_readies() {
    let hal = setup();
    hal.bindings().adc_block_ready(AdcId::ADC3);
    assert_eq!(
        hal.adc().init(AdcId::ADC3, &AdcConfig::default()),
        Err(HalError::Timeout)
    );
}

#[test]
fn test_read_single_masks_to_resolution() {
    let hal = ready_adc(AdcResolution::Bits10);
    hal.bindings().adc_set_input(AdcId::ADC1, 4, 0xFFFF);
    let value = hal.adc().read_single(AdcId::ADC1, 4, T).unwrap();
    assert_eq!(value, 0x3FF);
    assert_eq!(to_voltage(value, 10, 3300), 3300);
}

#[test]
fn test_read_multiple_in_order() {
    let hal = ready_adc(AdcResolution::Bits12);
    for (channel, raw) in [(1, 100), (2, 200), (17, 1700)] {
        hal.bindings().adc_set_input(AdcId::ADC1, channel, raw);
    }
    let mut values = [0u32; 3];
    hal.adc()
        .read_multiple(AdcId::ADC1, &[17, 1, 2], &mut values, T)
        .unwrap();
    assert_eq!(values, [1700, 100, 200]);
}

#[test]
fn test_conversion_timeout_leaves_converter_busy() {
    let hal = ready_adc(AdcResolution::Bits12);
    hal.bindings().adc_set_latency(AdcId::ADC1, u32::MAX);
    let mut adc = hal.adc();

    let start = hal.now();
    assert_eq!(adc.read_single(AdcId::ADC1, 0, T), Err(HalError::Timeout));
    assert_eq!(elapsed(&hal, start), 21);
    assert_eq!(adc.state(AdcId::ADC1), AdcState::Converting);
    assert_eq!(adc.read_single(AdcId::ADC1, 0, T), Err(HalError::Busy));
    assert_eq!(adc.start_conversion(AdcId::ADC1), Err(HalError::Busy));

    adc.stop_conversion(AdcId::ADC1).unwrap();
    assert_eq!(adc.state(AdcId::ADC1), AdcState::Idle);
}

#[test]
fn test_non_blocking_conversion() {
    let hal = ready_adc(AdcResolution::Bits12);
    hal.bindings().adc_set_input(AdcId::ADC1, 0, 1234);
    let mut adc = hal.adc();
    assert_eq!(adc.state(AdcId::ADC1), AdcState::Idle);

    adc.start_conversion(AdcId::ADC1).unwrap();
    assert_eq!(adc.state(AdcId::ADC1), AdcState::Converting);
    while !adc.is_conversion_complete(AdcId::ADC1) {}
    assert_eq!(adc.get_value(AdcId::ADC1), 1234);
}

#[test]
fn test_config_channel() {
    let hal = ready_adc(AdcResolution::Bits12);
    let mut adc = hal.adc();
    adc.config_channel(AdcId::ADC1, 5, 93).unwrap();
    assert_eq!(hal.bindings().adc_sampling_code(AdcId::ADC1, 5), Some(5));
    assert_eq!(
        adc.config_channel(AdcId::ADC1, 19, 93),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        adc.read_single(AdcId::ADC1, 19, T),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_calibration_reenables_converter() {
    let hal = ready_adc(AdcResolution::Bits12);
    hal.adc().calibrate(AdcId::ADC1).unwrap();
    assert!(hal.bindings().adc_calibrated(AdcId::ADC1));
    assert!(hal.bindings().adc_enabled(AdcId::ADC1));
}

#[test]
fn test_deinit_disables_converter() {
    let hal = ready_adc(AdcResolution::Bits8);
    let mut adc = hal.adc();
    adc.deinit(AdcId::ADC1).unwrap();
    assert!(!hal.bindings().adc_enabled(AdcId::ADC1));
    assert_eq!(adc.deinit(AdcId::new(9)), Err(HalError::InvalidParam));
    assert_eq!(adc.get_value(AdcId::new(9)), 0);
}
