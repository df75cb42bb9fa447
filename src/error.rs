/// Peripheral that failed to come up during [`As5600::init`](crate::As5600::init)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    /// The I2C bus, or the sensor did not answer on it
    Bus,
    /// The analog front-end sampling the OUT pin
    Analog,
}

/// Error type for AS5600 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E, A> {
    /// Communication error with the sensor
    Communication(E),
    /// The analog front-end failed to sample
    Analog(A),
    /// A peripheral could not be acquired; the handle stays not ready
    InitializationFailure(Peripheral),
    /// The handle was never successfully initialized
    NotReady,
    /// Address is not in the register map, or does not allow the requested
    /// direction
    InvalidRegister(u8),
    /// Value written to the BURN register is not a documented command code
    InvalidBurnCommand(u16),
}
