use xmcu_hal::adc::{to_voltage, Adc, AdcConfig, AdcResolution, AdcState};
use xmcu_hal::{HalError, Timeout};

use super::{elapsed, setup};
use crate::driverlib::{AdcMode, PeripheralClock};
use crate::ids::AdcId;

#[test]
fn test_init_powers_converter() {
    let hal = setup();
    let config = AdcConfig {
        resolution: AdcResolution::Bits16,
        sampling_time: 64,
    };
    hal.adc().init(AdcId::ADCB, &config).unwrap();

    let lib = hal.bindings();
    assert_eq!(lib.adc_mode(AdcId::ADCB), Some(AdcMode::Resolution16Bit));
    assert!(lib.clock_enabled(PeripheralClock::Adc(1)));
    assert_eq!(lib.adc_sample_window(AdcId::ADCB, 7), Some(64));
    assert!(lib.total_delay_us() >= 1_000);
    assert_eq!(lib.protected_violations(), 0);
}

#[test]
fn test_unsupported_resolution() {
    let hal = setup();
    let config = AdcConfig {
        resolution: AdcResolution::Bits10,
        ..AdcConfig::default()
    };
    assert_eq!(
        hal.adc().init(AdcId::ADCA, &config),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_read_single_returns_scaled_result() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    hal.bindings().adc_set_input(AdcId::ADCA, 3, 2048);

    let raw = adc.read_single(AdcId::ADCA, 3, Timeout::from_millis(10)).unwrap();
    assert_eq!(raw, 2048);
    assert_eq!(to_voltage(raw, 12, 3300), 1650);
    assert_eq!(adc.get_value(AdcId::ADCA), 2048);
}

#[test]
fn test_twelve_bit_results_are_masked() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    hal.bindings().adc_set_input(AdcId::ADCA, 0, 0xFFFF);
    assert_eq!(adc.read_single(AdcId::ADCA, 0, Timeout::FOREVER), Ok(0x0FFF));
}

#[test]
fn test_read_multiple_in_channel_order() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCC, &AdcConfig::default()).unwrap();
    for (channel, raw) in [(1, 100), (2, 200), (5, 500)] {
        hal.bindings().adc_set_input(AdcId::ADCC, channel, raw);
    }
    let mut values = [0u32; 3];
    adc.read_multiple(AdcId::ADCC, &[5, 1, 2], &mut values, Timeout::from_millis(10))
        .unwrap();
    assert_eq!(values, [500, 100, 200]);
}

#[test]
fn test_conversion_timeout() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    hal.bindings().adc_set_latency(AdcId::ADCA, u32::MAX);

    let start = hal.timebase().now();
    assert_eq!(
        adc.read_single(AdcId::ADCA, 0, Timeout::from_millis(20)),
        Err(HalError::Timeout)
    );
    assert_eq!(elapsed(&hal, start), 21);
    assert_eq!(adc.state(AdcId::ADCA), AdcState::Converting);
    assert_eq!(
        adc.read_single(AdcId::ADCA, 0, Timeout::from_millis(20)),
        Err(HalError::Busy)
    );
}

#[test]
fn test_forever_outlasts_any_finite_budget() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCD, &AdcConfig::default()).unwrap();
    hal.bindings().adc_set_latency(AdcId::ADCD, 5_000);
    hal.bindings().adc_set_input(AdcId::ADCD, 4, 77);

    let start = hal.timebase().now();
    assert_eq!(adc.read_single(AdcId::ADCD, 4, Timeout::FOREVER), Ok(77));
    assert!(elapsed(&hal, start) > 5_000);
}

#[test]
fn test_state_machine() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    hal.bindings().adc_set_input(AdcId::ADCA, 0, 1234);
    assert_eq!(adc.state(AdcId::ADCA), AdcState::Idle);

    adc.start_conversion(AdcId::ADCA).unwrap();
    assert_eq!(adc.state(AdcId::ADCA), AdcState::Converting);
    while !adc.is_conversion_complete(AdcId::ADCA) {}
    assert_eq!(adc.get_value(AdcId::ADCA), 1234);

    adc.stop_conversion(AdcId::ADCA).unwrap();
    assert_eq!(adc.state(AdcId::ADCA), AdcState::Idle);
}

#[test]
fn test_channel_configuration() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    adc.config_channel(AdcId::ADCA, 9, 200).unwrap();
    assert_eq!(hal.bindings().adc_sample_window(AdcId::ADCA, 9), Some(200));

    assert_eq!(
        adc.config_channel(AdcId::ADCA, 16, 200),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        adc.config_channel(AdcId::ADCA, 9, 0),
        Err(HalError::InvalidParam)
    );
    assert_eq!(
        adc.read_single(AdcId::ADCA, 16, Timeout::FOREVER),
        Err(HalError::InvalidParam)
    );
}

#[test]
fn test_calibrate_and_invalid_ids() {
    let hal = setup();
    let mut adc = hal.adc();
    adc.init(AdcId::ADCA, &AdcConfig::default()).unwrap();
    adc.calibrate(AdcId::ADCA).unwrap();
    assert!(hal.bindings().adc_trimmed(AdcId::ADCA));

    let bad = AdcId::new(4);
    assert_eq!(adc.calibrate(bad), Err(HalError::InvalidParam));
    assert_eq!(adc.get_value(bad), 0);
    assert_eq!(adc.state(bad), AdcState::Idle);
}
