//! Byte-order conversion between the I2C wire and the host.
//!
//! Two-byte registers are transmitted high byte first regardless of the host
//! endianness.

/// Reassemble a register value received high byte first
#[inline]
pub fn from_wire(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Split a register value into the order it is transmitted in
#[inline]
pub fn to_wire(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
