//! SMS codec and chunker.
//!
//! Outgoing text is sent in the GSM 03.38 default alphabet whenever every
//! character has a mapping, and in UCS-2 otherwise. Text longer than one frame
//! is split into parts that share a reference number and are reassembled by
//! the recipient's handset.
//!
//! | Alphabet | Single frame | Per part  |
//! |----------|--------------|-----------|
//! | GSM-7    | 160 septets  | 152       |
//! | UCS-2    | 70 chars     | 67        |
//!
//! # Examples
//!
//! ```
//! use simsms::sms::{self, Alphabet};
//!
//! let plan = sms::plan("Hello world");
//! assert_eq!(plan.alphabet, Alphabet::Gsm7);
//! assert_eq!(plan.length, 11);
//! assert_eq!(plan.parts, 1);
//!
//! let plan = sms::plan("Привет");
//! assert_eq!(plan.alphabet, Alphabet::Ucs2);
//! assert_eq!(plan.length, 12);
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod gsm7;
pub mod pdu;

use core::fmt;

use heapless::String;

use error::EncodeError;
use pdu::{Concat, EncodedPdu, Submit};

/// Septets in a single GSM-7 frame
pub const GSM7_SINGLE: usize = 160;
/// Septets per part of a multi-part GSM-7 message
pub const GSM7_PART: usize = 152;
/// Characters in a single UCS-2 frame
pub const UCS2_SINGLE: usize = 70;
/// Characters per part of a multi-part UCS-2 message
pub const UCS2_PART: usize = 67;

/// Largest outgoing message, in UTF-8 bytes
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Outgoing message text
pub type MessageText = String<MAX_MESSAGE_BYTES>;

/// Phone number as given by the host
pub type PhoneNumber = String<24>;

/// Character set of the user data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// GSM 03.38 default alphabet, seven bits per character
    Gsm7,
    /// UCS-2, sixteen bits per character
    Ucs2,
}

impl Alphabet {
    /// TP-DCS value for this alphabet
    pub fn coding_scheme(self) -> u8 {
        match self {
            Alphabet::Gsm7 => 0x00,
            Alphabet::Ucs2 => 0x08,
        }
    }

    /// Units allowed in a single frame and per part
    pub fn frame_limits(self) -> (usize, usize) {
        match self {
            Alphabet::Gsm7 => (GSM7_SINGLE, GSM7_PART),
            Alphabet::Ucs2 => (UCS2_SINGLE, UCS2_PART),
        }
    }

    fn units(self, c: char) -> usize {
        match self {
            Alphabet::Gsm7 => gsm7::septet_len(c).unwrap_or(1),
            Alphabet::Ucs2 => c.len_utf16(),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Gsm7 => write!(f, "GSM-7"),
            Alphabet::Ucs2 => write!(f, "UCS-2"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Alphabet {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Alphabet::Gsm7 => defmt::write!(f, "GSM-7"),
            Alphabet::Ucs2 => defmt::write!(f, "UCS-2"),
        }
    }
}

/// Septets needed to send `text` in GSM-7, or `None` as soon as a character
/// has no mapping.
pub fn gsm7_length(text: &str) -> Option<usize> {
    text.chars().try_fold(0, |len, c| Some(len + gsm7::septet_len(c)?))
}

/// Octets needed to send `text` in UCS-2.
pub fn ucs2_length(text: &str) -> usize {
    text.chars().count() * 2
}

/// How a message will be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Selected alphabet
    pub alphabet: Alphabet,
    /// Septets for GSM-7, octets for UCS-2
    pub length: usize,
    /// Number of frames
    pub parts: usize,
    /// Units per frame
    pub chunk_size: usize,
}

/// Choose the alphabet and split for `text`.
pub fn plan(text: &str) -> Plan {
    let (alphabet, length, units) = match gsm7_length(text) {
        Some(septets) => (Alphabet::Gsm7, septets, septets),
        None => (
            Alphabet::Ucs2,
            ucs2_length(text),
            text.encode_utf16().count(),
        ),
    };

    let (single, part) = alphabet.frame_limits();
    if units <= single {
        return Plan {
            alphabet,
            length,
            parts: 1,
            chunk_size: single,
        };
    }

    let mut parts = 0;
    let mut start = 0;
    while start < text.len() {
        start = chunk_end(text, start, alphabet, part);
        parts += 1;
    }
    Plan {
        alphabet,
        length,
        parts,
        chunk_size: part,
    }
}

/// Byte index where the chunk starting at `start` ends.
///
/// Chunks hold at most `size` units and always end on a character boundary,
/// so escape pairs and surrogate pairs are never split.
pub fn chunk_end(text: &str, start: usize, alphabet: Alphabet, size: usize) -> usize {
    let mut used = 0;
    for (i, c) in text[start..].char_indices() {
        let units = alphabet.units(c);
        if used + units > size {
            return start + i;
        }
        used += units;
    }
    text.len()
}

/// A message being sent one part at a time.
#[derive(Debug, Clone)]
pub struct OutgoingTransfer {
    number: PhoneNumber,
    text: MessageText,
    alphabet: Alphabet,
    chunk_size: usize,
    count: u8,
    index: u8,
    reference: u8,
    offset: usize,
}

impl OutgoingTransfer {
    /// Prepare `text` for `number`. Returns `None` when either exceeds its
    /// buffer or the message needs more than 255 parts.
    pub fn new(number: &str, text: &str, reference: u8) -> Option<Self> {
        let plan = plan(text);
        Some(OutgoingTransfer {
            number: PhoneNumber::try_from(number).ok()?,
            text: MessageText::try_from(text).ok()?,
            alphabet: plan.alphabet,
            chunk_size: plan.chunk_size,
            count: u8::try_from(plan.parts).ok()?,
            index: 0,
            reference,
            offset: 0,
        })
    }

    /// Encode the next part, or `None` once every part has been produced.
    pub fn encode_next(&mut self, service_centre: &str) -> Option<Result<EncodedPdu, EncodeError>> {
        if self.index >= self.count {
            return None;
        }
        let end = chunk_end(&self.text, self.offset, self.alphabet, self.chunk_size);
        let chunk = &self.text[self.offset..end];
        self.offset = end;
        self.index += 1;

        let concat = (self.count > 1).then_some(Concat {
            reference: self.reference as u16,
            total: self.count,
            index: self.index,
        });
        Some(
            Submit {
                service_centre,
                destination: &self.number,
                text: chunk,
                alphabet: self.alphabet,
                concat,
            }
            .encode(),
        )
    }

    /// True once the final part has been produced.
    pub fn is_last(&self) -> bool {
        self.index >= self.count
    }

    /// Destination number
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Full message text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Alphabet used for every part
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Number of parts
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Parts produced so far
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Reference shared by the parts
    pub fn reference(&self) -> u8 {
        self.reference
    }
}
