//! Register map for the AS5600 sensor.

use core::str::FromStr;

/// Register addresses for AS5600
///
/// Two-byte registers are addressed by their high byte; the low byte at the
/// next address is always transferred together with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
#[repr(u8)]
pub enum Register {
    /// Number of times ZPOS and MPOS have been burned (2 bits)
    Zmco = 0x00,
    /// Start position
    ZPos = 0x01,
    /// Stop position
    MPos = 0x03,
    /// Maximum angle
    MAng = 0x05,
    /// Configuration
    Conf = 0x07,
    /// Magnet status
    Status = 0x0B,
    /// Unscaled, unmodified angle
    RawAngle = 0x0C,
    /// Scaled output angle, with hysteresis and filtering applied
    Angle = 0x0E,
    /// Automatic gain control
    Agc = 0x1A,
    /// CORDIC magnitude
    Magnitude = 0x1B,
    /// Burn command, see [`BurnCommand`]
    Burn = 0xFF,
}

const ALL: [Register; 11] = [
    Register::Zmco,
    Register::ZPos,
    Register::MPos,
    Register::MAng,
    Register::Conf,
    Register::Status,
    Register::RawAngle,
    Register::Angle,
    Register::Agc,
    Register::Magnitude,
    Register::Burn,
];

impl From<Register> for u8 {
    fn from(reg: Register) -> u8 {
        reg as u8
    }
}

/// Direction(s) a register can be accessed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    #[must_use]
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// Number of bytes moved per register transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
        }
    }
}

/// Width and access class of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterInfo {
    pub width: Width,
    pub access: Access,
}

impl Register {
    /// Look up the register starting at `address`
    ///
    /// Low-byte addresses of two-byte registers and reserved addresses are
    /// not registers on their own and yield `None`.
    #[must_use]
    pub fn from_address(address: u8) -> Option<Self> {
        ALL.into_iter().find(|reg| u8::from(*reg) == address)
    }

    /// Device address of the register (high byte for two-byte registers)
    #[must_use]
    pub const fn address(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn info(self) -> RegisterInfo {
        let width = match self {
            Self::Zmco | Self::Status | Self::Agc | Self::Burn => Width::Byte,
            _ => Width::Word,
        };
        let access = match self {
            Self::ZPos | Self::MPos | Self::MAng | Self::Conf => Access::ReadWrite,
            Self::Burn => Access::WriteOnly,
            _ => Access::ReadOnly,
        };
        RegisterInfo { width, access }
    }

    /// Short name used in the datasheet's register table
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Zmco => "zmco",
            Self::ZPos => "zpos",
            Self::MPos => "mpos",
            Self::MAng => "mang",
            Self::Conf => "conf",
            Self::Status => "stat",
            Self::RawAngle => "rang",
            Self::Angle => "angl",
            Self::Agc => "agco",
            Self::Magnitude => "magn",
            Self::Burn => "burn",
        }
    }
}

/// Width and access class of `address`, `None` if it is not a register
#[must_use]
pub fn classify(address: u8) -> Option<RegisterInfo> {
    Register::from_address(address).map(Register::info)
}

#[must_use]
pub fn is_readable(address: u8) -> bool {
    classify(address).is_some_and(|info| info.access.is_readable())
}

#[must_use]
pub fn is_writable(address: u8) -> bool {
    classify(address).is_some_and(|info| info.access.is_writable())
}

/// Mnemonic did not name any register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnresolvedMnemonic;

impl FromStr for Register {
    type Err = UnresolvedMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.into_iter()
            .find(|reg| reg.mnemonic() == s)
            .ok_or(UnresolvedMnemonic)
    }
}

/// Commands accepted by the BURN register
///
/// Each command permanently programs the device's OTP memory and works a
/// limited number of times. The driver does not guard against repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BurnCommand {
    /// Persist ZPOS and MPOS (up to 3 times)
    Angle = 0x80,
    /// Persist MANG and CONF (once, only if ZPOS/MPOS were never burned)
    Setting = 0x40,
}

impl TryFrom<u8> for BurnCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x80 => Ok(Self::Angle),
            0x40 => Ok(Self::Setting),
            other => Err(other),
        }
    }
}

bitfield::bitfield! {
    /// CONF
    ///
    /// Raw field accessors mirror the datasheet names; the typed accessors
    /// on the impl below are usually more convenient.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Configuration(u16);
    impl Debug;
    u8;
    /// Watchdog
    pub wd, set_wd: 13;
    /// Fast filter threshold
    pub fth, set_fth: 12, 10;
    /// Slow filter
    pub sf, set_sf: 9, 8;
    /// PWM frequency
    pub pwmf, set_pwmf: 7, 6;
    /// Output stage
    pub outs, set_outs: 5, 4;
    /// Hysteresis
    pub hyst, set_hyst: 3, 2;
    /// Power mode
    pub pm, set_pm: 1, 0;
}

#[cfg(feature = "defmt")]
impl defmt::Format for Configuration {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Configuration({=u16:#06x})", self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Nominal = 0b00,
    LowPower1 = 0b01,
    LowPower2 = 0b10,
    LowPower3 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hysteresis {
    Off = 0b00,
    Lsb1 = 0b01,
    Lsb2 = 0b10,
    Lsb3 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputStage {
    /// Analog, 0% to 100% of supply
    AnalogFullRange = 0b00,
    /// Analog, 10% to 90% of supply
    AnalogReducedRange = 0b01,
    /// Digital PWM
    DigitalPwm = 0b10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmFrequency {
    Hz115 = 0b00,
    Hz230 = 0b01,
    Hz460 = 0b10,
    Hz920 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlowFilter {
    X16 = 0b00,
    X8 = 0b01,
    X4 = 0b10,
    X2 = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FastFilterThreshold {
    SlowFilterOnly = 0b000,
    Lsb6 = 0b001,
    Lsb7 = 0b010,
    Lsb9 = 0b011,
    Lsb18 = 0b100,
    Lsb21 = 0b101,
    Lsb24 = 0b110,
    Lsb10 = 0b111,
}

impl Configuration {
    #[must_use]
    pub const fn new(word: u16) -> Self {
        Self(word)
    }

    /// The packed configuration word as written to CONF
    #[must_use]
    pub const fn word(&self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn power_mode(&self) -> PowerMode {
        match self.pm() {
            0b00 => PowerMode::Nominal,
            0b01 => PowerMode::LowPower1,
            0b10 => PowerMode::LowPower2,
            _ => PowerMode::LowPower3,
        }
    }

    #[must_use]
    pub fn hysteresis(&self) -> Hysteresis {
        match self.hyst() {
            0b00 => Hysteresis::Off,
            0b01 => Hysteresis::Lsb1,
            0b10 => Hysteresis::Lsb2,
            _ => Hysteresis::Lsb3,
        }
    }

    /// Output stage, `None` for the reserved encoding `0b11`
    #[must_use]
    pub fn output_stage(&self) -> Option<OutputStage> {
        match self.outs() {
            0b00 => Some(OutputStage::AnalogFullRange),
            0b01 => Some(OutputStage::AnalogReducedRange),
            0b10 => Some(OutputStage::DigitalPwm),
            _ => None,
        }
    }

    #[must_use]
    pub fn pwm_frequency(&self) -> PwmFrequency {
        match self.pwmf() {
            0b00 => PwmFrequency::Hz115,
            0b01 => PwmFrequency::Hz230,
            0b10 => PwmFrequency::Hz460,
            _ => PwmFrequency::Hz920,
        }
    }

    #[must_use]
    pub fn slow_filter(&self) -> SlowFilter {
        match self.sf() {
            0b00 => SlowFilter::X16,
            0b01 => SlowFilter::X8,
            0b10 => SlowFilter::X4,
            _ => SlowFilter::X2,
        }
    }

    #[must_use]
    pub fn fast_filter_threshold(&self) -> FastFilterThreshold {
        match self.fth() {
            0b000 => FastFilterThreshold::SlowFilterOnly,
            0b001 => FastFilterThreshold::Lsb6,
            0b010 => FastFilterThreshold::Lsb7,
            0b011 => FastFilterThreshold::Lsb9,
            0b100 => FastFilterThreshold::Lsb18,
            0b101 => FastFilterThreshold::Lsb21,
            0b110 => FastFilterThreshold::Lsb24,
            _ => FastFilterThreshold::Lsb10,
        }
    }

    #[must_use]
    pub fn watchdog(&self) -> bool {
        self.wd()
    }

    #[must_use]
    pub fn with_power_mode(mut self, mode: PowerMode) -> Self {
        self.set_pm(mode as u8);
        self
    }

    #[must_use]
    pub fn with_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.set_hyst(hysteresis as u8);
        self
    }

    #[must_use]
    pub fn with_output_stage(mut self, stage: OutputStage) -> Self {
        self.set_outs(stage as u8);
        self
    }

    #[must_use]
    pub fn with_pwm_frequency(mut self, frequency: PwmFrequency) -> Self {
        self.set_pwmf(frequency as u8);
        self
    }

    #[must_use]
    pub fn with_slow_filter(mut self, filter: SlowFilter) -> Self {
        self.set_sf(filter as u8);
        self
    }

    #[must_use]
    pub fn with_fast_filter_threshold(mut self, threshold: FastFilterThreshold) -> Self {
        self.set_fth(threshold as u8);
        self
    }

    #[must_use]
    pub fn with_watchdog(mut self, enabled: bool) -> Self {
        self.set_wd(enabled);
        self
    }
}

bitfield::bitfield! {
    /// STATUS
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Status(u8);
    impl Debug;
    u8;
    /// Magnet was detected
    pub md, _: 5;
    /// AGC maximum gain overflow, magnet too weak
    pub ml, _: 4;
    /// AGC minimum gain overflow, magnet too strong
    pub mh, _: 3;
}

impl Status {
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u8:#04x})", self.0);
    }
}
