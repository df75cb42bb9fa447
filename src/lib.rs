#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

mod analog;
mod calibration;
mod diagnostics;
mod driver;
mod error;
mod register;
mod utils;

pub use analog::{ANGLE_UNAVAILABLE, AnalogInput, NoAnalog, SupplyBand};
pub use calibration::{
    BurnPolicy, CalibrationError, CalibrationOptions, CalibrationReport, CalibrationSequencer,
    CalibrationState, DeferredTimer, MOVE_WINDOW_MS, OneShotTimer, SETTLE_DELAY_MS,
};
pub use diagnostics::Diagnostics;
pub use driver::{ANGLE_MAX, As5600, Config, DEFAULT_ADDRESS};
pub use error::{Error, Peripheral};
pub use register::{
    Access, BurnCommand, Configuration, FastFilterThreshold, Hysteresis, OutputStage, PowerMode,
    PwmFrequency, Register, RegisterInfo, SlowFilter, Status, UnresolvedMnemonic, Width, classify,
    is_readable, is_writable,
};
