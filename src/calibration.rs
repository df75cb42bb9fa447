//! Field calibration of the start and stop positions.
//!
//! The sequence follows the datasheet's programming procedure: the current
//! raw angle becomes the start position, the operator gets a window to move
//! the mechanism to its other limit, and the raw angle there becomes the stop
//! position. Every step is triggered by the expiry of a single one-shot timer
//! that the sequencer re-arms itself:
//!
//! | State             | Entry action                              | Timer  |
//! |-------------------|-------------------------------------------|--------|
//! | `AwaitStart`      | write raw angle to ZPOS                   | 500 ms |
//! | `AwaitMaxMove`    | operator moves the mechanism              | 5 s    |
//! | `SetStop`         | write raw angle to MPOS                   | 500 ms |
//! | `VerifyAndFinish` | optional burn, sample the analog output   | -      |
//! | `Done`            | -                                         | -      |
//!
//! The sensor is borrowed mutably for each step, so no other register
//! traffic can interleave with a step in progress.

use core::convert::Infallible;

use embedded_hal::i2c::I2c;

use crate::{
    analog::{ANGLE_UNAVAILABLE, AnalogInput},
    driver::As5600,
    error::Error,
    register::BurnCommand,
};

/// Dead time after a register write before the bus is reliably usable
pub const SETTLE_DELAY_MS: u32 = 500;

/// Time given to the operator to move the mechanism to its stop position
pub const MOVE_WINDOW_MS: u32 = 5_000;

const DEFAULT_VERIFY_SAMPLES: u16 = 10;

/// Single-shot timer driving the sequencer
pub trait OneShotTimer {
    type Error;

    /// Arm the timer to expire once after `duration_ms`
    fn start_once(&mut self, duration_ms: u32) -> Result<(), Self::Error>;

    /// Release the timer resource
    fn delete(self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    AwaitStart,
    AwaitMaxMove,
    SetStop,
    VerifyAndFinish,
    Done,
}

impl CalibrationState {
    const fn next(self) -> Self {
        match self {
            Self::AwaitStart => Self::AwaitMaxMove,
            Self::AwaitMaxMove => Self::SetStop,
            Self::SetStop => Self::VerifyAndFinish,
            Self::VerifyAndFinish | Self::Done => Self::Done,
        }
    }
}

/// Whether the calibrated positions are burned into OTP memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurnPolicy {
    /// Leave the positions in volatile registers
    #[default]
    Never,
    /// Issue [`BurnCommand::Angle`]. Irreversible, and the device accepts
    /// at most three angle burns over its lifetime.
    Angle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOptions {
    pub burn: BurnPolicy,
    /// Number of analog readings taken to verify the result
    pub verify_samples: u16,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            burn: BurnPolicy::Never,
            verify_samples: DEFAULT_VERIFY_SAMPLES,
        }
    }
}

/// Outcome of a completed calibration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    pub start_position: u16,
    pub stop_position: u16,
    /// An angle burn command was issued
    pub burned: bool,
    /// Last analog verification reading, [`ANGLE_UNAVAILABLE`] if the analog
    /// path could not produce one
    pub angle_degrees: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError<E, A, T> {
    Sensor(Error<E, A>),
    Timer(T),
}

impl<E, A, T> From<Error<E, A>> for CalibrationError<E, A, T> {
    fn from(error: Error<E, A>) -> Self {
        Self::Sensor(error)
    }
}

/// Timer-driven calibration state machine
///
/// Created by [`Self::begin`], which captures the start position and arms the
/// timer. The scheduler calls [`Self::advance`] on every expiry. States are
/// only ever entered once; a failed step propagates its error and leaves the
/// timer unarmed, ending the run. The timer is deleted on entering
/// `VerifyAndFinish`, or when the sequencer is dropped.
#[derive(Debug)]
pub struct CalibrationSequencer<T: OneShotTimer> {
    state: CalibrationState,
    timer: Option<T>,
    options: CalibrationOptions,
    start_position: u16,
    stop_position: u16,
    report: Option<CalibrationReport>,
}

impl<T: OneShotTimer> CalibrationSequencer<T> {
    /// Capture the current raw angle as start position and arm the timer
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor or the timer fails; the timer is
    /// released in that case
    pub fn begin<I2C, ADC, E, A>(
        sensor: &mut As5600<I2C, ADC>,
        timer: T,
        options: CalibrationOptions,
    ) -> Result<Self, CalibrationError<E, A, T::Error>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
    {
        let mut sequencer = Self {
            state: CalibrationState::AwaitStart,
            timer: Some(timer),
            options,
            start_position: 0,
            stop_position: 0,
            report: None,
        };
        sequencer.enter(sensor)?;
        Ok(sequencer)
    }

    /// Handle a timer expiry: move to the next state and run its entry action
    ///
    /// Returns the state entered. Once `Done`, further calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a register transfer, the analog front-end or the
    /// timer fails. Nothing is retried.
    pub fn advance<I2C, ADC, E, A>(
        &mut self,
        sensor: &mut As5600<I2C, ADC>,
    ) -> Result<CalibrationState, CalibrationError<E, A, T::Error>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
    {
        if self.state == CalibrationState::Done {
            return Ok(self.state);
        }
        self.state = self.state.next();
        self.enter(sensor)?;
        Ok(self.state)
    }

    #[must_use]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Available once `VerifyAndFinish` has completed
    #[must_use]
    pub fn report(&self) -> Option<CalibrationReport> {
        self.report
    }

    fn enter<I2C, ADC, E, A>(
        &mut self,
        sensor: &mut As5600<I2C, ADC>,
    ) -> Result<(), CalibrationError<E, A, T::Error>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
    {
        match self.state {
            CalibrationState::AwaitStart => {
                let raw = sensor.raw_angle()?;
                sensor.set_start_position(raw)?;
                self.start_position = raw;
                #[cfg(feature = "defmt")]
                defmt::info!("Start position set to 0x{:04X}", raw);
                self.arm(SETTLE_DELAY_MS)
            }
            CalibrationState::AwaitMaxMove => {
                #[cfg(feature = "defmt")]
                defmt::info!("Move the mechanism to its stop position within {} ms", MOVE_WINDOW_MS);
                self.arm(MOVE_WINDOW_MS)
            }
            CalibrationState::SetStop => {
                let raw = sensor.raw_angle()?;
                sensor.set_stop_position(raw)?;
                self.stop_position = raw;
                #[cfg(feature = "defmt")]
                defmt::info!("Stop position set to 0x{:04X}", raw);
                self.arm(SETTLE_DELAY_MS)
            }
            CalibrationState::VerifyAndFinish => {
                self.release_timer();
                self.report = Some(self.verify(sensor)?);
                Ok(())
            }
            CalibrationState::Done => Ok(()),
        }
    }

    fn verify<I2C, ADC, E, A>(
        &self,
        sensor: &mut As5600<I2C, ADC>,
    ) -> Result<CalibrationReport, Error<E, A>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
    {
        let burned = match self.options.burn {
            BurnPolicy::Never => false,
            BurnPolicy::Angle => {
                sensor.burn(BurnCommand::Angle)?;
                true
            }
        };

        sensor.init_analog()?;

        let mut angle_degrees = ANGLE_UNAVAILABLE;
        for _ in 0..self.options.verify_samples {
            angle_degrees = sensor.analog_angle_degrees()?;
            #[cfg(feature = "defmt")]
            defmt::info!("Verification angle: {} deg", angle_degrees);
        }

        Ok(CalibrationReport {
            start_position: self.start_position,
            stop_position: self.stop_position,
            burned,
            angle_degrees,
        })
    }

    fn arm<E, A>(&mut self, duration_ms: u32) -> Result<(), CalibrationError<E, A, T::Error>> {
        match self.timer.as_mut() {
            Some(timer) => timer
                .start_once(duration_ms)
                .map_err(CalibrationError::Timer),
            None => Ok(()),
        }
    }

    fn release_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.delete();
        }
    }
}

impl<T: OneShotTimer> Drop for CalibrationSequencer<T> {
    fn drop(&mut self) {
        self.release_timer();
    }
}

/// Timer that only records the requested expiry
///
/// Lets a caller drive the sequencer with a delay provider instead of a
/// hardware timer, see [`CalibrationSequencer::run_blocking`] and
/// [`CalibrationSequencer::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeferredTimer {
    pending: Option<u32>,
}

impl DeferredTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Take the armed duration, disarming the timer
    pub fn take_pending(&mut self) -> Option<u32> {
        self.pending.take()
    }
}

impl OneShotTimer for DeferredTimer {
    type Error = Infallible;

    fn start_once(&mut self, duration_ms: u32) -> Result<(), Self::Error> {
        self.pending = Some(duration_ms);
        Ok(())
    }

    fn delete(self) {}
}

impl CalibrationSequencer<DeferredTimer> {
    fn next_expiry(&mut self) -> Option<u32> {
        self.timer.as_mut().and_then(DeferredTimer::take_pending)
    }

    /// Run the remaining steps, waiting on a blocking delay between them
    ///
    /// The sequence is left in [`CalibrationState::Done`] once verification
    /// has run.
    ///
    /// Returns `None` only if an earlier step failed before this call, which
    /// leaves the timer unarmed and the verification undone.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a step
    pub fn run_blocking<I2C, ADC, E, A, D>(
        &mut self,
        sensor: &mut As5600<I2C, ADC>,
        delay: &mut D,
    ) -> Result<Option<CalibrationReport>, CalibrationError<E, A, Infallible>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
        D: embedded_hal::delay::DelayNs,
    {
        while let Some(duration_ms) = self.next_expiry() {
            delay.delay_ms(duration_ms);
            self.advance(sensor)?;
        }
        if self.state == CalibrationState::VerifyAndFinish {
            self.advance(sensor)?;
        }
        Ok(self.report)
    }

    /// Run the remaining steps, awaiting an async delay between them
    ///
    /// Ends in [`CalibrationState::Done`] like [`Self::run_blocking`].
    ///
    /// Register transfers stay blocking; only the waits yield.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a step
    pub async fn run<I2C, ADC, E, A, D>(
        &mut self,
        sensor: &mut As5600<I2C, ADC>,
        delay: &mut D,
    ) -> Result<Option<CalibrationReport>, CalibrationError<E, A, Infallible>>
    where
        I2C: I2c<Error = E>,
        ADC: AnalogInput<Error = A>,
        D: embedded_hal_async::delay::DelayNs,
    {
        while let Some(duration_ms) = self.next_expiry() {
            delay.delay_ms(duration_ms).await;
            self.advance(sensor)?;
        }
        if self.state == CalibrationState::VerifyAndFinish {
            self.advance(sensor)?;
        }
        Ok(self.report)
    }
}
