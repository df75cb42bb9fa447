//! Blocking driver for the AS5600 magnetic position sensor

use embedded_hal::i2c::I2c;

use crate::{
    analog::{AnalogInput, SupplyBand},
    diagnostics::Diagnostics,
    error::{Error, Peripheral},
    register::{BurnCommand, Configuration, Register, Status, Width},
    utils,
};

/// Factory-fixed 7-bit I2C address
pub const DEFAULT_ADDRESS: u8 = 0x36;

const POSITION_MASK: u16 = 0x0FFF;
const CONFIGURATION_MASK: u16 = 0x3FFF;
const BURN_COUNT_MASK: u16 = 0b11;

/// Maximum angle value (12-bit: 0-4095, representing 0-360°)
pub const ANGLE_MAX: u16 = 0x0FFF + 1;

/// Driver settings that are not stored on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit I2C address of the sensor
    pub address: u8,
    /// Supply voltage band of the OUT pin in reduced-range analog mode
    pub supply: SupplyBand,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            supply: SupplyBand::VCC_3V3,
        }
    }
}

/// AS5600 driver instance
///
/// Owns the I2C bus and the analog front-end wired to the OUT pin. Every
/// operation fails with [`Error::NotReady`] until [`Self::init`] succeeds.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct As5600<I2C, ADC> {
    i2c: I2C,
    adc: ADC,
    pub(crate) config: Config,
    ready: bool,
    analog_ready: bool,
    configuration: Configuration,
    last_register: Option<Register>,
}

impl<I2C, ADC> As5600<I2C, ADC> {
    /// Create a new AS5600 driver instance at the default address
    pub fn new(i2c: I2C, adc: ADC) -> Self {
        Self::with_config(i2c, adc, Config::default())
    }

    pub fn with_config(i2c: I2C, adc: ADC, config: Config) -> Self {
        Self {
            i2c,
            adc,
            config,
            ready: false,
            analog_ready: false,
            configuration: Configuration::default(),
            last_register: None,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Configuration last written to or read from the device
    ///
    /// Never refreshed implicitly; call [`Self::configuration`] to resync.
    #[must_use]
    pub fn cached_configuration(&self) -> Configuration {
        self.configuration
    }

    /// The analog front-end, e.g. to rerun its own calibration
    pub fn analog_mut(&mut self) -> &mut ADC {
        &mut self.adc
    }

    /// Register touched by the most recent transfer
    #[must_use]
    pub fn last_register(&self) -> Option<Register> {
        self.last_register
    }
}

impl<I2C, ADC, E, A> As5600<I2C, ADC>
where
    I2C: I2c<Error = E>,
    ADC: AnalogInput<Error = A>,
{
    /// Bring up the handle
    ///
    /// Probes the sensor with a STATUS read, then initializes the analog
    /// front-end. On failure the handle stays not ready and every later
    /// operation reports [`Error::NotReady`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitializationFailure`] naming the peripheral that
    /// failed to come up
    pub fn init(&mut self) -> Result<(), Error<E, A>> {
        self.ready = false;

        let mut probe = [0u8; 1];
        if self
            .i2c
            .write_read(self.config.address, &[Register::Status.address()], &mut probe)
            .is_err()
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("No answer from AS5600 at 0x{:02X}", self.config.address);
            return Err(Error::InitializationFailure(Peripheral::Bus));
        }

        self.init_analog()?;

        self.ready = true;
        #[cfg(feature = "defmt")]
        defmt::debug!("AS5600 ready, status 0x{:02X}", probe[0]);

        Ok(())
    }

    /// (Re)initialize the analog front-end sampling the OUT pin
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitializationFailure`] if the front-end refuses to
    /// initialize. A front-end acquired by an earlier call stays marked as
    /// acquired and is still de-initialized by [`Self::release`].
    pub fn init_analog(&mut self) -> Result<(), Error<E, A>> {
        if self.adc.init().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Analog front-end initialization failed");
            return Err(Error::InitializationFailure(Peripheral::Analog));
        }
        self.analog_ready = true;
        Ok(())
    }

    /// Tear the handle down, returning the I2C bus and analog front-end
    ///
    /// Both peripherals are handed back even if initialization failed
    /// part-way. The analog front-end is de-initialized if it was acquired.
    pub fn release(mut self) -> (I2C, ADC) {
        if self.analog_ready && self.adc.deinit().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Analog front-end deinitialization failed");
        }
        (self.i2c, self.adc)
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), Error<E, A>> {
        if self.ready {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("AS5600 handle used before successful init");
            Err(Error::NotReady)
        }
    }

    /// Read the register starting at `address`
    ///
    /// One-byte registers are returned in the low byte. Two-byte registers
    /// are reassembled from wire order into a host value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegister`] without touching the bus if
    /// `address` is not a readable register
    pub fn read_register(&mut self, address: u8) -> Result<u16, Error<E, A>> {
        self.ensure_ready()?;
        let register = Register::from_address(address).ok_or(Error::InvalidRegister(address))?;
        self.read(register)
    }

    /// Write `value` to the register starting at `address`
    ///
    /// Writes to [`Register::Burn`] only accept the [`BurnCommand`] codes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegister`] without touching the bus if
    /// `address` is not a writable register
    pub fn write_register(&mut self, address: u8, value: u16) -> Result<(), Error<E, A>> {
        self.ensure_ready()?;
        let register = Register::from_address(address).ok_or(Error::InvalidRegister(address))?;
        self.write(register, value)
    }

    fn read(&mut self, register: Register) -> Result<u16, Error<E, A>> {
        self.ensure_ready()?;
        let info = register.info();
        let address = register.address();

        if !info.access.is_readable() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Register 0x{:02X} is not readable", address);
            return Err(Error::InvalidRegister(address));
        }

        self.last_register = Some(register);

        #[cfg(feature = "defmt")]
        defmt::trace!("Reading {} byte(s) from register 0x{:02X}", info.width.bytes(), address);

        let value = match info.width {
            Width::Byte => {
                let mut rx = [0u8; 1];
                self.i2c
                    .write_read(self.config.address, &[address], &mut rx)
                    .map_err(Error::Communication)?;
                u16::from(rx[0])
            }
            Width::Word => {
                let mut rx = [0u8; 2];
                self.i2c
                    .write_read(self.config.address, &[address], &mut rx)
                    .map_err(Error::Communication)?;
                utils::from_wire(rx)
            }
        };

        #[cfg(feature = "defmt")]
        defmt::debug!("Register 0x{:02X} value: 0x{:04X}", address, value);

        Ok(value)
    }

    /// Write a register in a single bus transaction: address byte followed
    /// by the data byte(s)
    fn write(&mut self, register: Register, value: u16) -> Result<(), Error<E, A>> {
        self.ensure_ready()?;
        let info = register.info();
        let address = register.address();

        if !info.access.is_writable() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Register 0x{:02X} is not writable", address);
            return Err(Error::InvalidRegister(address));
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Writing 0x{:04X} to register 0x{:02X}", value, address);

        match info.width {
            Width::Byte => {
                // BURN is the only writable single-byte register
                let command = u8::try_from(value)
                    .ok()
                    .and_then(|code| BurnCommand::try_from(code).ok())
                    .ok_or(Error::InvalidBurnCommand(value))?;
                self.last_register = Some(register);
                self.i2c
                    .write(self.config.address, &[address, command as u8])
                    .map_err(Error::Communication)?;
            }
            Width::Word => {
                let [high, low] = utils::to_wire(value);
                self.last_register = Some(register);
                self.i2c
                    .write(self.config.address, &[address, high, low])
                    .map_err(Error::Communication)?;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("Write to register 0x{:02X} successful", address);

        Ok(())
    }

    /// Get the 12-bit start position (ZPOS)
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn start_position(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::ZPos)? & POSITION_MASK)
    }

    /// Set the start position (ZPOS); upper bits beyond 12 are dropped
    ///
    /// The device needs about 1 ms before the bus is usable again.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn set_start_position(&mut self, position: u16) -> Result<(), Error<E, A>> {
        self.write(Register::ZPos, position & POSITION_MASK)
    }

    /// Get the 12-bit stop position (MPOS)
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn stop_position(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::MPos)? & POSITION_MASK)
    }

    /// Set the stop position (MPOS); upper bits beyond 12 are dropped
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn set_stop_position(&mut self, position: u16) -> Result<(), Error<E, A>> {
        self.write(Register::MPos, position & POSITION_MASK)
    }

    /// Get the 12-bit maximum angle (MANG)
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn max_angle(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::MAng)? & POSITION_MASK)
    }

    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn set_max_angle(&mut self, angle: u16) -> Result<(), Error<E, A>> {
        self.write(Register::MAng, angle & POSITION_MASK)
    }

    /// Read the configuration word and refresh the cached copy
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn configuration(&mut self) -> Result<Configuration, Error<E, A>> {
        let configuration = Configuration::new(self.read(Register::Conf)? & CONFIGURATION_MASK);
        self.configuration = configuration;
        Ok(configuration)
    }

    /// Cache and write the configuration word
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn set_configuration(&mut self, configuration: Configuration) -> Result<(), Error<E, A>> {
        self.ensure_ready()?;
        let configuration = Configuration::new(configuration.word() & CONFIGURATION_MASK);
        self.configuration = configuration;
        self.write(Register::Conf, configuration.word())
    }

    /// Get the unscaled, unfiltered 12-bit angle
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn raw_angle(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::RawAngle)? & POSITION_MASK)
    }

    /// Get the scaled 12-bit angle, with hysteresis and filtering applied
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn angle(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::Angle)? & POSITION_MASK)
    }

    /// Get the filtered angle in degrees (0-359)
    ///
    /// Integer conversion of [`Self::angle`], rounded down
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn angle_degrees(&mut self) -> Result<u16, Error<E, A>> {
        let angle = self.angle()?;
        let degrees = (u32::from(angle) * 360) / u32::from(ANGLE_MAX);
        Ok(degrees as u16)
    }

    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn status(&mut self) -> Result<Status, Error<E, A>> {
        self.read(Register::Status).map(|raw| Status::new(raw as u8))
    }

    /// Get the automatic gain control value
    ///
    /// Range depends on supply: 0-255 at 3.3 V, 0-128 at 5 V
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn agc(&mut self) -> Result<u8, Error<E, A>> {
        self.read(Register::Agc).map(|raw| raw as u8)
    }

    /// Get the 12-bit CORDIC magnitude
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn magnitude(&mut self) -> Result<u16, Error<E, A>> {
        Ok(self.read(Register::Magnitude)? & POSITION_MASK)
    }

    /// Number of angle burns already performed (0-3)
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    #[allow(clippy::cast_possible_truncation)]
    pub fn burn_count(&mut self) -> Result<u8, Error<E, A>> {
        self.read(Register::Zmco).map(|raw| (raw & BURN_COUNT_MASK) as u8)
    }

    /// Issue a burn command
    ///
    /// This permanently programs the device's OTP memory. The hardware only
    /// accepts a limited number of burns and repeating one is not
    /// idempotent. Wait at least 1 ms before using the bus again.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn burn(&mut self, command: BurnCommand) -> Result<(), Error<E, A>> {
        #[cfg(feature = "defmt")]
        defmt::warn!("Issuing burn command {}", command);
        self.write(Register::Burn, u16::from(command as u8))
    }

    /// Read STATUS, AGC and MAGNITUDE in one go
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is not ready or I2C communication fails
    pub fn diagnostics(&mut self) -> Result<Diagnostics, Error<E, A>> {
        let status = self.status()?;
        let agc = self.agc()?;
        let magnitude = self.magnitude()?;
        Ok(Diagnostics::new(status, agc, magnitude))
    }
}
