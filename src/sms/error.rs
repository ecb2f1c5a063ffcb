//! Failures of SMS PDU encoding and decoding.

use core::fmt;

/// Failure while building an SMS-SUBMIT PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Destination or service centre number is not `+digits` or `digits`
    AddressFormat,
    /// Text needs more septets than one frame carries
    Gsm7TooLong,
    /// Text needs more octets than one frame carries
    Ucs2TooLong,
    /// Part index or part total out of range
    MultipartNumbers,
    /// Character has no mapping in the selected alphabet
    UnsupportedCharacter,
    /// Output buffer cannot hold the PDU
    BufferTooSmall,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::AddressFormat => write!(f, "Invalid phone number"),
            EncodeError::Gsm7TooLong => write!(f, "GSM-7 text too long"),
            EncodeError::Ucs2TooLong => write!(f, "UCS-2 text too long"),
            EncodeError::MultipartNumbers => write!(f, "Invalid part numbers"),
            EncodeError::UnsupportedCharacter => write!(f, "Character not encodable"),
            EncodeError::BufferTooSmall => write!(f, "PDU buffer too small"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EncodeError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            EncodeError::AddressFormat => defmt::write!(f, "Invalid phone number"),
            EncodeError::Gsm7TooLong => defmt::write!(f, "GSM-7 text too long"),
            EncodeError::Ucs2TooLong => defmt::write!(f, "UCS-2 text too long"),
            EncodeError::MultipartNumbers => defmt::write!(f, "Invalid part numbers"),
            EncodeError::UnsupportedCharacter => defmt::write!(f, "Character not encodable"),
            EncodeError::BufferTooSmall => defmt::write!(f, "PDU buffer too small"),
        }
    }
}

/// Failure while reading an SMS-DELIVER PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Odd length or non-hex character
    InvalidHex,
    /// PDU ends before a declared field
    Truncated,
    /// Message type indicator is not SMS-DELIVER
    NotDeliver,
    /// Originating address contains an unknown digit
    AddressFormat,
    /// Data coding scheme is 8-bit data or reserved
    UnsupportedAlphabet,
    /// PDU or decoded text exceeds the buffers
    Overflow,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidHex => write!(f, "Invalid hex in PDU"),
            DecodeError::Truncated => write!(f, "PDU truncated"),
            DecodeError::NotDeliver => write!(f, "Not an SMS-DELIVER"),
            DecodeError::AddressFormat => write!(f, "Invalid originating address"),
            DecodeError::UnsupportedAlphabet => write!(f, "Alphabet not supported"),
            DecodeError::Overflow => write!(f, "PDU too large"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DecodeError::InvalidHex => defmt::write!(f, "Invalid hex in PDU"),
            DecodeError::Truncated => defmt::write!(f, "PDU truncated"),
            DecodeError::NotDeliver => defmt::write!(f, "Not an SMS-DELIVER"),
            DecodeError::AddressFormat => defmt::write!(f, "Invalid originating address"),
            DecodeError::UnsupportedAlphabet => defmt::write!(f, "Alphabet not supported"),
            DecodeError::Overflow => defmt::write!(f, "PDU too large"),
        }
    }
}
