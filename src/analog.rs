//! Angle readout through the sensor's analog OUT pin.

use core::convert::Infallible;

use embedded_hal::i2c::I2c;

use crate::{driver::As5600, error::Error, register::OutputStage};

/// Returned by [`As5600::analog_angle_degrees`] when no analog reading is
/// possible. Never a valid angle, which lies in `0.0..=360.0`.
pub const ANGLE_UNAVAILABLE: f32 = -1.0;

/// Analog front-end sampling the OUT pin
pub trait AnalogInput {
    type Error;

    /// Acquire the converter; calling it again re-initializes
    fn init(&mut self) -> Result<(), Self::Error>;

    fn deinit(&mut self) -> Result<(), Self::Error>;

    /// Whether the converter's own voltage calibration is in effect
    fn is_calibrated(&self) -> bool;

    /// Sample the pin voltage in millivolts
    fn read_millivolts(&mut self) -> Result<u16, Self::Error>;
}

/// Placeholder for boards where OUT is not wired to a converter
///
/// Never calibrated, so analog readings always report
/// [`ANGLE_UNAVAILABLE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoAnalog;

impl AnalogInput for NoAnalog {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_calibrated(&self) -> bool {
        false
    }

    fn read_millivolts(&mut self) -> Result<u16, Self::Error> {
        Ok(0)
    }
}

/// Voltage band of the OUT pin in reduced-range mode (10%-90% of supply)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupplyBand {
    pub min_mv: u16,
    pub max_mv: u16,
}

impl SupplyBand {
    pub const VCC_3V3: Self = Self {
        min_mv: 330,
        max_mv: 2970,
    };

    pub const VCC_5V: Self = Self {
        min_mv: 500,
        max_mv: 4500,
    };

    /// Map a pin voltage to degrees
    ///
    /// The voltage is clamped into the band first, so out-of-band samples
    /// saturate at 0° or 360°.
    #[must_use]
    pub fn degrees(&self, millivolts: u16) -> f32 {
        let span = self.max_mv.saturating_sub(self.min_mv);
        if span == 0 {
            return 0.0;
        }
        let clamped = millivolts.clamp(self.min_mv, self.max_mv);
        f32::from(clamped - self.min_mv) * 360.0 / f32::from(span)
    }
}

impl<I2C, ADC, E, A> As5600<I2C, ADC>
where
    I2C: I2c<Error = E>,
    ADC: AnalogInput<Error = A>,
{
    /// Angle in degrees sampled from the analog OUT pin
    ///
    /// Returns [`ANGLE_UNAVAILABLE`] when the converter is not calibrated
    /// or the cached configuration does not select the reduced-range analog
    /// output stage. Only the cached configuration is consulted; the device
    /// is not queried.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or the converter fails
    /// to sample
    pub fn analog_angle_degrees(&mut self) -> Result<f32, Error<E, A>> {
        self.ensure_ready()?;

        if !self.analog_mut().is_calibrated() {
            #[cfg(feature = "defmt")]
            defmt::debug!("Analog front-end not calibrated");
            return Ok(ANGLE_UNAVAILABLE);
        }

        if self.cached_configuration().output_stage() != Some(OutputStage::AnalogReducedRange) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Output stage is not reduced-range analog");
            return Ok(ANGLE_UNAVAILABLE);
        }

        let millivolts = self.analog_mut().read_millivolts().map_err(Error::Analog)?;
        let degrees = self.config.supply.degrees(millivolts);

        #[cfg(feature = "defmt")]
        defmt::trace!("OUT pin {} mV -> {} deg", millivolts, degrees);

        Ok(degrees)
    }
}
