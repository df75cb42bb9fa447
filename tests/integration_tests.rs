//! Integration tests for the AS5600 driver using mocked I2C.

mod common;

use as5600::{
    ANGLE_UNAVAILABLE, Access, As5600, BurnCommand, Config, Configuration, Error, NoAnalog,
    OutputStage, Peripheral, Register, SupplyBand, UnresolvedMnemonic, Width, classify,
    is_readable, is_writable,
};
use common::{ADDRESS, AdcFault, FakeAdc, finish, ready_sensor};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

const REGISTER_TABLE: [(u8, Width, Access); 11] = [
    (0x00, Width::Byte, Access::ReadOnly),
    (0x01, Width::Word, Access::ReadWrite),
    (0x03, Width::Word, Access::ReadWrite),
    (0x05, Width::Word, Access::ReadWrite),
    (0x07, Width::Word, Access::ReadWrite),
    (0x0B, Width::Byte, Access::ReadOnly),
    (0x0C, Width::Word, Access::ReadOnly),
    (0x0E, Width::Word, Access::ReadOnly),
    (0x1A, Width::Byte, Access::ReadOnly),
    (0x1B, Width::Word, Access::ReadOnly),
    (0xFF, Width::Byte, Access::WriteOnly),
];

fn reduced_range() -> Configuration {
    Configuration::default().with_output_stage(OutputStage::AnalogReducedRange)
}

fn conf_write(configuration: Configuration) -> I2cTransaction {
    let [high, low] = configuration.word().to_be_bytes();
    I2cTransaction::write(ADDRESS, vec![0x07, high, low])
}

#[test]
fn classifies_every_documented_register() {
    for (address, width, access) in REGISTER_TABLE {
        let info = classify(address).unwrap();
        assert_eq!(info.width, width, "width of 0x{address:02X}");
        assert_eq!(info.access, access, "access of 0x{address:02X}");
        assert_eq!(is_readable(address), access.is_readable());
        assert_eq!(is_writable(address), access.is_writable());
    }
}

#[test]
fn rejects_every_other_address() {
    for address in 0..=u8::MAX {
        if REGISTER_TABLE.iter().any(|(known, _, _)| *known == address) {
            continue;
        }
        assert_eq!(classify(address), None, "0x{address:02X}");
        assert!(!is_readable(address));
        assert!(!is_writable(address));
    }
}

#[test]
fn resolves_mnemonics_to_their_registers() {
    let expected = [
        ("zmco", Register::Zmco),
        ("zpos", Register::ZPos),
        ("mpos", Register::MPos),
        ("mang", Register::MAng),
        ("conf", Register::Conf),
        ("stat", Register::Status),
        ("rang", Register::RawAngle),
        ("angl", Register::Angle),
        ("agco", Register::Agc),
        ("magn", Register::Magnitude),
        ("burn", Register::Burn),
    ];

    for (mnemonic, register) in expected {
        assert_eq!(mnemonic.parse::<Register>(), Ok(register));
        assert_eq!(register.mnemonic(), mnemonic);
    }
}

#[test]
fn unknown_mnemonic_is_not_mistaken_for_a_register() {
    for mnemonic in ["", "zmc", "ZPOS", "angle", "status"] {
        assert_eq!(mnemonic.parse::<Register>(), Err(UnresolvedMnemonic));
    }
}

#[test]
fn reads_word_register_in_wire_order() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write_read(ADDRESS, vec![0x0C], vec![0x0A, 0xBC])],
        FakeAdc::default(),
    );

    assert_eq!(sensor.raw_angle().unwrap(), 0x0ABC);
    assert_eq!(sensor.last_register(), Some(Register::RawAngle));

    finish(sensor);
}

#[test]
fn register_write_then_read_returns_same_value() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write(ADDRESS, vec![0x05, 0x0B, 0x7E]),
            I2cTransaction::write_read(ADDRESS, vec![0x05], vec![0x0B, 0x7E]),
        ],
        FakeAdc::default(),
    );

    sensor.write_register(0x05, 0x0B7E).unwrap();
    assert_eq!(sensor.read_register(0x05).unwrap(), 0x0B7E);

    finish(sensor);
}

#[test]
fn reads_single_byte_registers() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write_read(ADDRESS, vec![0x0B], vec![0x28]),
            I2cTransaction::write_read(ADDRESS, vec![0x1A], vec![0x80]),
            I2cTransaction::write_read(ADDRESS, vec![0x00], vec![0xFE]),
        ],
        FakeAdc::default(),
    );

    let status = sensor.status().unwrap();
    assert!(status.md());
    assert!(!status.ml());
    assert!(status.mh());
    assert_eq!(sensor.agc().unwrap(), 0x80);
    assert_eq!(sensor.burn_count().unwrap(), 0b10);

    finish(sensor);
}

#[test]
fn access_violations_never_reach_the_bus() {
    let mut sensor = ready_sensor(&[], FakeAdc::default());

    assert_eq!(sensor.read_register(0xFF), Err(Error::InvalidRegister(0xFF)));
    assert_eq!(sensor.write_register(0x0C, 0x0123), Err(Error::InvalidRegister(0x0C)));
    assert_eq!(sensor.write_register(0x00, 0x0001), Err(Error::InvalidRegister(0x00)));
    assert_eq!(sensor.read_register(0x02), Err(Error::InvalidRegister(0x02)));
    assert_eq!(sensor.write_register(0x20, 0x0001), Err(Error::InvalidRegister(0x20)));
    assert_eq!(sensor.last_register(), None);

    finish(sensor);
}

#[test]
fn burn_register_only_accepts_documented_commands() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write(ADDRESS, vec![0xFF, 0x80])],
        FakeAdc::default(),
    );

    assert_eq!(sensor.write_register(0xFF, 0x01), Err(Error::InvalidBurnCommand(0x01)));
    assert_eq!(sensor.write_register(0xFF, 0x0180), Err(Error::InvalidBurnCommand(0x0180)));
    sensor.burn(BurnCommand::Angle).unwrap();
    assert_eq!(sensor.last_register(), Some(Register::Burn));

    finish(sensor);
}

#[test]
fn setting_burn_uses_its_own_code() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write(ADDRESS, vec![0xFF, 0x40])],
        FakeAdc::default(),
    );

    sensor.write_register(0xFF, 0x40).unwrap();

    finish(sensor);
}

#[test]
fn position_writes_are_single_transactions_masked_to_12_bits() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write(ADDRESS, vec![0x01, 0x01, 0x23]),
            I2cTransaction::write(ADDRESS, vec![0x03, 0x0F, 0xFF]),
            I2cTransaction::write(ADDRESS, vec![0x05, 0x08, 0x00]),
        ],
        FakeAdc::default(),
    );

    sensor.set_start_position(0xF123).unwrap();
    sensor.set_stop_position(0x0FFF).unwrap();
    sensor.set_max_angle(0x0800).unwrap();

    finish(sensor);
}

#[test]
fn reads_positions_back() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write_read(ADDRESS, vec![0x01], vec![0x01, 0x23]),
            I2cTransaction::write_read(ADDRESS, vec![0x03], vec![0x0E, 0x00]),
            I2cTransaction::write_read(ADDRESS, vec![0x05], vec![0x04, 0x00]),
        ],
        FakeAdc::default(),
    );

    assert_eq!(sensor.start_position().unwrap(), 0x0123);
    assert_eq!(sensor.stop_position().unwrap(), 0x0E00);
    assert_eq!(sensor.max_angle().unwrap(), 0x0400);

    finish(sensor);
}

#[test]
fn set_configuration_caches_and_writes_word() {
    let configuration = reduced_range().with_watchdog(true);
    let mut sensor = ready_sensor(&[conf_write(configuration)], FakeAdc::default());

    assert_eq!(sensor.cached_configuration(), Configuration::default());
    sensor.set_configuration(configuration).unwrap();
    assert_eq!(sensor.cached_configuration(), configuration);

    finish(sensor);
}

#[test]
fn set_configuration_drops_reserved_bits_from_cache_and_bus() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write(ADDRESS, vec![0x07, 0x00, 0x20])],
        FakeAdc::default(),
    );

    sensor.set_configuration(Configuration::new(0xC020)).unwrap();
    assert_eq!(sensor.cached_configuration().word(), 0x0020);
    assert_eq!(sensor.cached_configuration().output_stage(), Some(OutputStage::DigitalPwm));

    finish(sensor);
}

#[test]
fn reading_configuration_refreshes_cache() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write_read(ADDRESS, vec![0x07], vec![0x20, 0x10])],
        FakeAdc::default(),
    );

    let configuration = sensor.configuration().unwrap();
    assert_eq!(configuration.word(), 0x2010);
    assert!(configuration.watchdog());
    assert_eq!(configuration.output_stage(), Some(OutputStage::AnalogReducedRange));
    assert_eq!(sensor.cached_configuration(), configuration);

    finish(sensor);
}

#[test]
fn converts_filtered_angle_to_degrees() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write_read(ADDRESS, vec![0x0E], vec![0x08, 0x00]),
            I2cTransaction::write_read(ADDRESS, vec![0x0E], vec![0x0F, 0xFF]),
        ],
        FakeAdc::default(),
    );

    assert_eq!(sensor.angle_degrees().unwrap(), 180);
    assert_eq!(sensor.angle_degrees().unwrap(), 359);

    finish(sensor);
}

#[test]
fn reads_diagnostics() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write_read(ADDRESS, vec![0x0B], vec![0x20]),
            I2cTransaction::write_read(ADDRESS, vec![0x1A], vec![0x64]),
            I2cTransaction::write_read(ADDRESS, vec![0x1B], vec![0x06, 0x40]),
        ],
        FakeAdc::default(),
    );

    let diagnostics = sensor.diagnostics().unwrap();
    assert!(diagnostics.magnet_detected());
    assert!(diagnostics.magnetic_field_ok());
    assert!(diagnostics.is_valid());
    assert_eq!(diagnostics.agc_value(), 0x64);
    assert_eq!(diagnostics.magnitude(), 0x0640);

    finish(sensor);
}

#[test]
fn weak_magnet_is_not_valid() {
    let mut sensor = ready_sensor(
        &[
            I2cTransaction::write_read(ADDRESS, vec![0x0B], vec![0x30]),
            I2cTransaction::write_read(ADDRESS, vec![0x1A], vec![0xFF]),
            I2cTransaction::write_read(ADDRESS, vec![0x1B], vec![0x00, 0x10]),
        ],
        FakeAdc::default(),
    );

    let diagnostics = sensor.diagnostics().unwrap();
    assert!(diagnostics.magnet_too_weak());
    assert!(!diagnostics.is_valid());

    finish(sensor);
}

#[test]
fn propagates_bus_errors() {
    let mut sensor = ready_sensor(
        &[I2cTransaction::write_read(ADDRESS, vec![0x1B], vec![0x00, 0x00])
            .with_error(ErrorKind::Other)],
        FakeAdc::default(),
    );

    assert_eq!(sensor.magnitude(), Err(Error::Communication(ErrorKind::Other)));

    finish(sensor);
}

#[test]
fn every_operation_fails_before_init() {
    let mut sensor = As5600::new(I2cMock::new(&[]), FakeAdc::calibrated_at(1650));

    assert!(!sensor.is_ready());
    assert_eq!(sensor.raw_angle(), Err(Error::NotReady));
    assert_eq!(sensor.read_register(0x0C), Err(Error::NotReady));
    assert_eq!(sensor.set_start_position(0x0100), Err(Error::NotReady));
    assert_eq!(sensor.set_configuration(reduced_range()), Err(Error::NotReady));
    assert_eq!(sensor.cached_configuration(), Configuration::default());
    assert_eq!(sensor.analog_angle_degrees(), Err(Error::NotReady));

    let adc = finish(sensor);
    assert_eq!(adc.deinits, 0);
}

#[test]
fn bus_failure_leaves_handle_not_ready() {
    let probe =
        I2cTransaction::write_read(ADDRESS, vec![0x0B], vec![0x00]).with_error(ErrorKind::Other);
    let mut sensor = As5600::new(I2cMock::new(&[probe]), FakeAdc::default());

    assert_eq!(sensor.init(), Err(Error::InitializationFailure(Peripheral::Bus)));
    assert!(!sensor.is_ready());
    assert_eq!(sensor.status().map(|s| s.raw()), Err(Error::NotReady));

    let adc = finish(sensor);
    assert_eq!(adc.inits, 0);
    assert_eq!(adc.deinits, 0);
}

#[test]
fn analog_failure_leaves_handle_not_ready() {
    let adc = FakeAdc {
        fail_init: true,
        ..FakeAdc::default()
    };
    let mut sensor = As5600::new(I2cMock::new(&[common::probe()]), adc);

    assert_eq!(sensor.init(), Err(Error::InitializationFailure(Peripheral::Analog)));
    assert!(!sensor.is_ready());
    assert_eq!(sensor.magnitude(), Err(Error::NotReady));

    let adc = finish(sensor);
    assert_eq!(adc.deinits, 0);
}

#[test]
fn release_deinitializes_analog_front_end_once() {
    let sensor = ready_sensor(&[], FakeAdc::default());

    let adc = finish(sensor);
    assert_eq!(adc.inits, 1);
    assert_eq!(adc.deinits, 1);
}

#[test]
fn failed_reinit_still_deinitializes_acquired_front_end() {
    let mut sensor = ready_sensor(&[], FakeAdc::default());
    sensor.analog_mut().fail_init = true;

    assert_eq!(
        sensor.init_analog(),
        Err(Error::InitializationFailure(Peripheral::Analog))
    );
    assert!(sensor.is_ready());

    let adc = finish(sensor);
    assert_eq!(adc.inits, 1);
    assert_eq!(adc.deinits, 1);
}

#[test]
fn analog_angle_unavailable_without_calibrated_front_end() {
    let mut sensor = ready_sensor(
        &[conf_write(reduced_range())],
        FakeAdc {
            calibrated: false,
            millivolts: 1650,
            ..FakeAdc::default()
        },
    );
    sensor.set_configuration(reduced_range()).unwrap();

    assert_eq!(sensor.analog_angle_degrees(), Ok(ANGLE_UNAVAILABLE));
    assert_eq!(sensor.analog_angle_degrees().unwrap(), -1.0);

    let adc = finish(sensor);
    assert_eq!(adc.samples, 0);
}

#[test]
fn analog_angle_unavailable_outside_reduced_range_mode() {
    let pwm = Configuration::default().with_output_stage(OutputStage::DigitalPwm);
    let full = Configuration::default().with_output_stage(OutputStage::AnalogFullRange);
    let mut sensor = ready_sensor(
        &[conf_write(pwm), conf_write(full)],
        FakeAdc::calibrated_at(1650),
    );

    sensor.set_configuration(pwm).unwrap();
    assert_eq!(sensor.analog_angle_degrees(), Ok(-1.0));
    sensor.set_configuration(full).unwrap();
    assert_eq!(sensor.analog_angle_degrees(), Ok(-1.0));

    let adc = finish(sensor);
    assert_eq!(adc.samples, 0);
}

#[test]
fn analog_angle_maps_band_to_full_circle() {
    let mut sensor = ready_sensor(&[conf_write(reduced_range())], FakeAdc::calibrated_at(330));
    sensor.set_configuration(reduced_range()).unwrap();

    let mut angle_at = |millivolts: u16| {
        sensor.analog_mut().millivolts = millivolts;
        sensor.analog_angle_degrees().unwrap()
    };
    assert_eq!(angle_at(330), 0.0);
    assert_eq!(angle_at(2970), 360.0);
    assert_eq!(angle_at(1650), 180.0);
    assert_eq!(angle_at(100), 0.0);
    assert_eq!(angle_at(3300), 360.0);

    finish(sensor);
}

#[test]
fn analog_sample_errors_propagate() {
    let mut sensor = ready_sensor(
        &[conf_write(reduced_range())],
        FakeAdc {
            fail_read: true,
            ..FakeAdc::calibrated_at(1650)
        },
    );
    sensor.set_configuration(reduced_range()).unwrap();

    assert_eq!(sensor.analog_angle_degrees(), Err(Error::Analog(AdcFault)));

    finish(sensor);
}

#[test]
fn custom_address_and_5v_band_reach_analog_readout() {
    const ALT_ADDRESS: u8 = 0x37;
    let [high, low] = reduced_range().word().to_be_bytes();
    let i2c = I2cMock::new(&[
        I2cTransaction::write_read(ALT_ADDRESS, vec![0x0B], vec![0x20]),
        I2cTransaction::write(ALT_ADDRESS, vec![0x07, high, low]),
    ]);
    let config = Config {
        address: ALT_ADDRESS,
        supply: SupplyBand::VCC_5V,
    };
    let mut sensor = As5600::with_config(i2c, FakeAdc::calibrated_at(4500), config);
    sensor.init().unwrap();
    sensor.set_configuration(reduced_range()).unwrap();

    assert_eq!(sensor.analog_angle_degrees(), Ok(360.0));
    sensor.analog_mut().millivolts = 2500;
    assert_eq!(sensor.analog_angle_degrees(), Ok(180.0));
    // 3.3 V full scale sits mid-band on a 5 V supply
    sensor.analog_mut().millivolts = 2970;
    assert_eq!(sensor.analog_angle_degrees(), Ok(222.3));

    let adc = finish(sensor);
    assert_eq!(adc.samples, 3);
}

#[test]
fn board_without_analog_output_reports_unavailable() {
    let i2c = I2cMock::new(&[common::probe(), conf_write(reduced_range())]);
    let mut sensor = As5600::new(i2c, NoAnalog);

    sensor.init().unwrap();
    sensor.set_configuration(reduced_range()).unwrap();
    assert_eq!(sensor.analog_angle_degrees(), Ok(ANGLE_UNAVAILABLE));

    let (mut i2c, _) = sensor.release();
    i2c.done();
}
