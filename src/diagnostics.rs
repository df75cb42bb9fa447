//! Magnet health derived from STATUS, AGC and MAGNITUDE

use crate::register::Status;

/// Snapshot of the registers describing the magnetic field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    status: Status,
    agc: u8,
    magnitude: u16,
}

impl Diagnostics {
    #[must_use]
    pub const fn new(status: Status, agc: u8, magnitude: u16) -> Self {
        Self {
            status,
            agc,
            magnitude,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Get the Automatic Gain Control (AGC) value
    ///
    /// Lower values mean a stronger field. In 3.3 V mode the range is
    /// 0-255, in 5 V mode 0-128; mid-range values leave the most headroom
    /// for air gap and temperature drift.
    #[must_use]
    pub const fn agc_value(&self) -> u8 {
        self.agc
    }

    /// CORDIC magnitude of the field
    #[must_use]
    pub const fn magnitude(&self) -> u16 {
        self.magnitude
    }

    /// MD: a magnet was detected
    #[must_use]
    pub fn magnet_detected(&self) -> bool {
        self.status.md()
    }

    /// MH: field too strong, AGC minimum gain overflow
    #[must_use]
    pub fn magnet_too_strong(&self) -> bool {
        self.status.mh()
    }

    /// ML: field too weak, AGC maximum gain overflow
    #[must_use]
    pub fn magnet_too_weak(&self) -> bool {
        self.status.ml()
    }

    /// Check if the magnetic field strength is within acceptable range
    #[must_use]
    pub fn magnetic_field_ok(&self) -> bool {
        !self.magnet_too_strong() && !self.magnet_too_weak()
    }

    /// Check if angle data can be trusted: magnet present and field in range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.magnet_detected() && self.magnetic_field_ok()
    }
}
