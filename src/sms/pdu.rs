//! SMS-SUBMIT encoding and SMS-DELIVER decoding (3GPP TS 23.040).
//!
//! PDUs travel over the AT link as upper-case hex. An encoded submit carries
//! the service centre field in front of the TPDU, and its reported length
//! counts only the TPDU octets, which is what `AT+CMGS=<len>` expects.
//!
//! # Examples
//!
//! ```
//! use simsms::sms::Alphabet;
//! use simsms::sms::pdu::Submit;
//!
//! let pdu = Submit {
//!     service_centre: "",
//!     destination: "+33607612640",
//!     text: "hello",
//!     alphabet: Alphabet::Gsm7,
//!     concat: None,
//! }
//! .encode()
//! .unwrap();
//!
//! assert_eq!(pdu.hex.as_str(), "0001000B913306672146F0000005E8329BFD06");
//! assert_eq!(pdu.tpdu_len, 18);
//! ```

use core::fmt::{self, Write as _};

use heapless::{String, Vec};

use super::Alphabet;
use super::error::{DecodeError, EncodeError};
use super::gsm7::{self, ESCAPE, Gsm7Char};

/// Most digits accepted in a phone number, excluding the `+`
pub const MAX_NUMBER_DIGITS: usize = 20;

/// Largest PDU handled in either direction, in octets
pub const MAX_PDU_OCTETS: usize = 176;

/// Hex characters needed for the largest PDU
pub const PDU_HEX_CAPACITY: usize = MAX_PDU_OCTETS * 2;

/// Octets of user data in one frame
pub const MAX_USER_DATA: usize = 140;

/// Septets of user data in one frame
pub const MAX_SEPTETS: usize = 160;

/// Bytes of UTF-8 a decoded message may occupy
pub const MAX_TEXT_BYTES: usize = 576;

/// Hex-encoded PDU
pub type PduHex = String<PDU_HEX_CAPACITY>;

/// Decoded message text
pub type SmsText = String<MAX_TEXT_BYTES>;

/// Originating address, numeric or alphanumeric
pub type Address = String<40>;

const TOA_INTERNATIONAL: u8 = 0x91;
const TOA_UNKNOWN: u8 = 0x81;
const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Concatenation information element of a multi-part message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Concat {
    /// Identifier shared by all parts of one message
    pub reference: u16,
    /// Number of parts
    pub total: u8,
    /// Position of this part, starting at 1
    pub index: u8,
}

impl Concat {
    /// User data header octets, including the length octet itself
    pub fn header_octets(&self) -> usize {
        if self.reference > 0xFF { 7 } else { 6 }
    }

    fn write_header(&self, out: &mut [u8]) {
        if self.reference > 0xFF {
            let [hi, lo] = self.reference.to_be_bytes();
            out[..7].copy_from_slice(&[6, 0x08, 4, hi, lo, self.total, self.index]);
        } else {
            out[..6].copy_from_slice(&[5, 0x00, 3, self.reference as u8, self.total, self.index]);
        }
    }
}

/// Septets covered by a user data header of `octets` octets, fill bits
/// included.
pub fn header_septets(octets: usize) -> usize {
    (octets * 8).div_ceil(7)
}

/// One SMS-SUBMIT to encode.
#[derive(Debug, Clone, Copy)]
pub struct Submit<'a> {
    /// Service centre number, empty to use the one stored in the SIM
    pub service_centre: &'a str,
    /// Destination number, `+` followed by digits or digits only
    pub destination: &'a str,
    /// Text of this frame
    pub text: &'a str,
    /// Alphabet for the user data
    pub alphabet: Alphabet,
    /// Concatenation header for multi-part messages
    pub concat: Option<Concat>,
}

/// An encoded SMS-SUBMIT.
#[derive(Debug, Clone)]
pub struct EncodedPdu {
    /// Service centre field followed by the TPDU, as hex
    pub hex: PduHex,
    /// TPDU length in octets, the value for `AT+CMGS`
    pub tpdu_len: usize,
}

impl Submit<'_> {
    /// Encode to hex.
    pub fn encode(&self) -> Result<EncodedPdu, EncodeError> {
        if let Some(concat) = &self.concat {
            if concat.total == 0 || concat.index == 0 || concat.index > concat.total {
                return Err(EncodeError::MultipartNumbers);
            }
        }

        let mut raw: Vec<u8, MAX_PDU_OCTETS> = Vec::new();

        // Service centre: length counts TOA plus digit octets
        if self.service_centre.is_empty() {
            push(&mut raw, 0)?;
        } else {
            let (toa, digits) = parse_number(self.service_centre)?;
            push(&mut raw, (1 + digits.len().div_ceil(2)) as u8)?;
            push(&mut raw, toa)?;
            push_bcd(&mut raw, digits)?;
        }
        let sca_len = raw.len();

        let first_octet = if self.concat.is_some() { 0x41 } else { 0x01 };
        push(&mut raw, first_octet)?;
        push(&mut raw, 0x00)?; // message reference, assigned by the modem

        let (toa, digits) = parse_number(self.destination)?;
        push(&mut raw, digits.len() as u8)?;
        push(&mut raw, toa)?;
        push_bcd(&mut raw, digits)?;

        push(&mut raw, 0x00)?; // protocol identifier
        push(&mut raw, self.alphabet.coding_scheme())?;

        let header_len = self.concat.as_ref().map_or(0, Concat::header_octets);
        let mut user_data = [0u8; MAX_USER_DATA];
        if let Some(concat) = &self.concat {
            concat.write_header(&mut user_data);
        }

        let (udl, used) = match self.alphabet {
            Alphabet::Gsm7 => {
                let skip = header_septets(header_len);
                let mut septets: Vec<u8, MAX_SEPTETS> = Vec::new();
                for c in self.text.chars() {
                    match gsm7::lookup(c).ok_or(EncodeError::UnsupportedCharacter)? {
                        Gsm7Char::Basic(code) => {
                            septets.push(code).map_err(|_| EncodeError::Gsm7TooLong)?
                        }
                        Gsm7Char::Extended(code) => {
                            septets.push(ESCAPE).map_err(|_| EncodeError::Gsm7TooLong)?;
                            septets.push(code).map_err(|_| EncodeError::Gsm7TooLong)?;
                        }
                    }
                }
                if septets.len() + skip > MAX_SEPTETS {
                    return Err(EncodeError::Gsm7TooLong);
                }
                let used = gsm7::pack(&septets, skip * 7, &mut user_data)
                    .ok_or(EncodeError::Gsm7TooLong)?
                    .max(header_len);
                (skip + septets.len(), used)
            }
            Alphabet::Ucs2 => {
                let mut used = header_len;
                for unit in self.text.encode_utf16() {
                    if used + 2 > MAX_USER_DATA {
                        return Err(EncodeError::Ucs2TooLong);
                    }
                    user_data[used..used + 2].copy_from_slice(&unit.to_be_bytes());
                    used += 2;
                }
                (used, used)
            }
        };

        push(&mut raw, udl as u8)?;
        raw.extend_from_slice(&user_data[..used])
            .map_err(|_| EncodeError::BufferTooSmall)?;

        let mut hex = PduHex::new();
        for byte in &raw {
            hex.push(HEX[(byte >> 4) as usize] as char)
                .map_err(|_| EncodeError::BufferTooSmall)?;
            hex.push(HEX[(byte & 0x0F) as usize] as char)
                .map_err(|_| EncodeError::BufferTooSmall)?;
        }

        Ok(EncodedPdu {
            hex,
            tpdu_len: raw.len() - sca_len,
        })
    }
}

fn push(out: &mut Vec<u8, MAX_PDU_OCTETS>, byte: u8) -> Result<(), EncodeError> {
    out.push(byte).map_err(|_| EncodeError::BufferTooSmall)
}

/// Split a number into its type of address and digit string.
fn parse_number(number: &str) -> Result<(u8, &str), EncodeError> {
    let (toa, digits) = match number.strip_prefix('+') {
        Some(rest) => (TOA_INTERNATIONAL, rest),
        None => (TOA_UNKNOWN, number),
    };
    if digits.is_empty()
        || digits.len() > MAX_NUMBER_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(EncodeError::AddressFormat);
    }
    Ok((toa, digits))
}

/// Semi-octet BCD, low nibble first, padded with 0xF.
fn push_bcd(out: &mut Vec<u8, MAX_PDU_OCTETS>, digits: &str) -> Result<(), EncodeError> {
    for pair in digits.as_bytes().chunks(2) {
        let low = pair[0] - b'0';
        let high = pair.get(1).map_or(0x0F, |d| d - b'0');
        push(out, (high << 4) | low)?;
    }
    Ok(())
}

/// Service centre time stamp of a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmsTimestamp {
    /// Two-digit year
    pub year: u8,
    /// Month, 1 to 12
    pub month: u8,
    /// Day of month
    pub day: u8,
    /// Hour
    pub hour: u8,
    /// Minute
    pub minute: u8,
    /// Second
    pub second: u8,
    /// Offset from UTC in quarters of an hour
    pub tz_quarters: i8,
}

impl SmsTimestamp {
    fn from_octets(octets: &[u8]) -> Self {
        let tz = octets[6];
        let quarters = ((tz & 0x07) * 10 + (tz >> 4)) as i8;
        SmsTimestamp {
            year: swapped_bcd(octets[0]),
            month: swapped_bcd(octets[1]),
            day: swapped_bcd(octets[2]),
            hour: swapped_bcd(octets[3]),
            minute: swapped_bcd(octets[4]),
            second: swapped_bcd(octets[5]),
            tz_quarters: if tz & 0x08 != 0 { -quarters } else { quarters },
        }
    }

    /// Render as `YY/MM/DD,hh:mm:ss±zz`.
    pub fn to_text(&self) -> String<24> {
        let mut out = String::new();
        let _ = write!(out, "{}", self);
        out
    }
}

impl fmt::Display for SmsTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_quarters < 0 { '-' } else { '+' };
        write!(
            f,
            "{:02}/{:02}/{:02},{:02}:{:02}:{:02}{}{:02}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            sign,
            self.tz_quarters.unsigned_abs()
        )
    }
}

fn swapped_bcd(octet: u8) -> u8 {
    (octet & 0x0F) * 10 + (octet >> 4)
}

/// A decoded SMS-DELIVER.
#[derive(Debug, Clone)]
pub struct Deliver {
    /// Sender number or alphanumeric name
    pub sender: Address,
    /// Service centre time stamp
    pub timestamp: SmsTimestamp,
    /// Alphabet the message was sent in
    pub alphabet: Alphabet,
    /// Message text
    pub text: SmsText,
    /// Present when this is one part of a longer message
    pub concat: Option<Concat>,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn byte(&mut self) -> Result<u8, DecodeError> {
        let b = *self.data.get(self.pos).ok_or(DecodeError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let slice = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or(DecodeError::Truncated)?;
        self.pos += n;
        Ok(slice)
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

fn hex_value(c: u8) -> Result<u8, DecodeError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(DecodeError::InvalidHex),
    }
}

/// Convert a hex string to octets.
pub fn decode_hex(hex: &str) -> Result<Vec<u8, MAX_PDU_OCTETS>, DecodeError> {
    let bytes = hex.trim().as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex);
    }
    let mut out = Vec::new();
    for pair in bytes.chunks(2) {
        let octet = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
        out.push(octet).map_err(|_| DecodeError::Overflow)?;
    }
    Ok(out)
}

fn alphabet_of(dcs: u8) -> Result<Alphabet, DecodeError> {
    match dcs & 0xF0 {
        // general data coding, compressed text not supported
        0x00..=0x70 if dcs & 0x20 != 0 => Err(DecodeError::UnsupportedAlphabet),
        0x00..=0x70 => match (dcs >> 2) & 0x03 {
            0 => Ok(Alphabet::Gsm7),
            2 => Ok(Alphabet::Ucs2),
            _ => Err(DecodeError::UnsupportedAlphabet),
        },
        // message waiting indication groups
        0xC0 | 0xD0 => Ok(Alphabet::Gsm7),
        0xE0 => Ok(Alphabet::Ucs2),
        0xF0 if dcs & 0x04 == 0 => Ok(Alphabet::Gsm7),
        _ => Err(DecodeError::UnsupportedAlphabet),
    }
}

/// Read GSM-7 septets `from..to` of `data` as text.
fn push_septets<const N: usize>(
    out: &mut String<N>,
    data: &[u8],
    from: usize,
    to: usize,
) -> Result<(), DecodeError> {
    let mut escaped = false;
    for i in from..to {
        let septet = gsm7::septet_at(data, i * 7).ok_or(DecodeError::Truncated)?;
        let c = if escaped {
            escaped = false;
            gsm7::extension_char(septet)
        } else if septet == ESCAPE {
            escaped = true;
            continue;
        } else {
            gsm7::basic_char(septet)
        };
        out.push(c).map_err(|_| DecodeError::Overflow)?;
    }
    Ok(())
}

fn read_address(cursor: &mut Cursor<'_>) -> Result<Address, DecodeError> {
    let digits = cursor.byte()? as usize;
    let toa = cursor.byte()?;
    let octets = cursor.take(digits.div_ceil(2))?;
    let mut address = Address::new();

    match toa & 0x70 {
        0x50 => push_septets(&mut address, octets, 0, digits * 4 / 7)?,
        kind => {
            if kind == 0x10 {
                address.push('+').map_err(|_| DecodeError::Overflow)?;
            }
            for i in 0..digits {
                let nibble = if i % 2 == 0 {
                    octets[i / 2] & 0x0F
                } else {
                    octets[i / 2] >> 4
                };
                let c = match nibble {
                    0..=9 => (b'0' + nibble) as char,
                    0x0A => '*',
                    0x0B => '#',
                    _ => return Err(DecodeError::AddressFormat),
                };
                address.push(c).map_err(|_| DecodeError::Overflow)?;
            }
        }
    }
    Ok(address)
}

fn read_concat(header: &[u8]) -> Option<Concat> {
    let mut i = 0;
    while i + 2 <= header.len() {
        let id = header[i];
        let len = header[i + 1] as usize;
        let body = header.get(i + 2..i + 2 + len)?;
        match (id, len) {
            (0x00, 3) => {
                return Some(Concat {
                    reference: body[0] as u16,
                    total: body[1],
                    index: body[2],
                });
            }
            (0x08, 4) => {
                return Some(Concat {
                    reference: u16::from_be_bytes([body[0], body[1]]),
                    total: body[2],
                    index: body[3],
                });
            }
            _ => {}
        }
        i += 2 + len;
    }
    None
}

impl Deliver {
    /// Decode a hex SMS-DELIVER as reported by `+CMT:`.
    pub fn decode(hex: &str) -> Result<Self, DecodeError> {
        let raw = decode_hex(hex)?;
        let mut cursor = Cursor { data: &raw, pos: 0 };

        let sca_len = cursor.byte()? as usize;
        cursor.take(sca_len)?;

        let first_octet = cursor.byte()?;
        if first_octet & 0x03 != 0x00 {
            return Err(DecodeError::NotDeliver);
        }
        let has_header = first_octet & 0x40 != 0;

        let sender = read_address(&mut cursor)?;
        let _pid = cursor.byte()?;
        let alphabet = alphabet_of(cursor.byte()?)?;
        let timestamp = SmsTimestamp::from_octets(cursor.take(7)?);
        let udl = cursor.byte()? as usize;
        let user_data = cursor.rest();

        let mut text = SmsText::new();
        let mut concat = None;

        match alphabet {
            Alphabet::Gsm7 => {
                if user_data.len() < (udl * 7).div_ceil(8) {
                    return Err(DecodeError::Truncated);
                }
                let mut skip = 0;
                if has_header {
                    let header_len = *user_data.first().ok_or(DecodeError::Truncated)? as usize;
                    let header = user_data
                        .get(1..1 + header_len)
                        .ok_or(DecodeError::Truncated)?;
                    concat = read_concat(header);
                    skip = header_septets(header_len + 1);
                }
                push_septets(&mut text, user_data, skip.min(udl), udl)?;
            }
            Alphabet::Ucs2 => {
                let payload = user_data.get(..udl).ok_or(DecodeError::Truncated)?;
                let mut body = payload;
                if has_header {
                    let header_len = *payload.first().ok_or(DecodeError::Truncated)? as usize;
                    let header = payload
                        .get(1..1 + header_len)
                        .ok_or(DecodeError::Truncated)?;
                    concat = read_concat(header);
                    body = &payload[1 + header_len..];
                }
                let units = body
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                for c in char::decode_utf16(units) {
                    text.push(c.unwrap_or(char::REPLACEMENT_CHARACTER))
                        .map_err(|_| DecodeError::Overflow)?;
                }
            }
        }

        Ok(Deliver {
            sender,
            timestamp,
            alphabet,
            text,
            concat,
        })
    }
}
