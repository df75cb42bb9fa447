//! Shared fakes for the AS5600 integration tests.

#![allow(dead_code)]

use as5600::{AnalogInput, As5600};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

pub const ADDRESS: u8 = 0x36;

/// Error raised by [`FakeAdc`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcFault;

/// Analog front-end returning a fixed voltage and counting calls
#[derive(Debug, Default)]
pub struct FakeAdc {
    pub calibrated: bool,
    pub millivolts: u16,
    pub fail_init: bool,
    pub fail_read: bool,
    pub inits: u32,
    pub deinits: u32,
    pub samples: u32,
}

impl FakeAdc {
    pub fn calibrated_at(millivolts: u16) -> Self {
        Self {
            calibrated: true,
            millivolts,
            ..Self::default()
        }
    }
}

impl AnalogInput for FakeAdc {
    type Error = AdcFault;

    fn init(&mut self) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(AdcFault);
        }
        self.inits += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        self.deinits += 1;
        Ok(())
    }

    fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    fn read_millivolts(&mut self) -> Result<u16, Self::Error> {
        if self.fail_read {
            return Err(AdcFault);
        }
        self.samples += 1;
        Ok(self.millivolts)
    }
}

/// STATUS read issued by `As5600::init`
pub fn probe() -> I2cTransaction {
    I2cTransaction::write_read(ADDRESS, vec![0x0B], vec![0x20])
}

/// A driver that has passed `init`, expecting `expectations` afterwards
pub fn ready_sensor(expectations: &[I2cTransaction], adc: FakeAdc) -> As5600<I2cMock, FakeAdc> {
    let mut all = vec![probe()];
    all.extend_from_slice(expectations);

    let mut sensor = As5600::new(I2cMock::new(&all), adc);
    sensor.init().unwrap();
    sensor
}

/// Release the driver and check that every expected transaction happened
pub fn finish(sensor: As5600<I2cMock, FakeAdc>) -> FakeAdc {
    let (mut i2c, adc) = sensor.release();
    i2c.done();
    adc
}
