//! GSM 03.38 default alphabet and septet packing.
//!
//! Characters outside the basic table but inside the extension table are sent
//! as an escape septet followed by the extension code, so they cost two
//! septets.

/// Escape to the extension table
pub const ESCAPE: u8 = 0x1B;

/// Basic character set, indexed by septet value. Index 0x1B is the escape
/// code and never produced by a lookup.
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

/// Extension table entries as (septet after escape, character)
const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Encoding of one character in the default alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gsm7Char {
    /// Single septet from the basic table
    Basic(u8),
    /// Escape septet followed by this extension septet
    Extended(u8),
}

impl Gsm7Char {
    /// Number of septets this character occupies
    pub fn septets(self) -> usize {
        match self {
            Gsm7Char::Basic(_) => 1,
            Gsm7Char::Extended(_) => 2,
        }
    }
}

/// Look up the GSM-7 encoding of `c`, or `None` when it has no mapping.
pub fn lookup(c: char) -> Option<Gsm7Char> {
    match c {
        'A'..='Z' | 'a'..='z' | '0'..='9' => return Some(Gsm7Char::Basic(c as u8)),
        '\u{1B}' => return None,
        _ => {}
    }
    if let Some(code) = BASIC.iter().position(|&b| b == c) {
        return Some(Gsm7Char::Basic(code as u8));
    }
    EXTENSION
        .iter()
        .find(|(_, e)| *e == c)
        .map(|(code, _)| Gsm7Char::Extended(*code))
}

/// Septets needed for `c`, or `None` when it has no mapping.
pub fn septet_len(c: char) -> Option<usize> {
    lookup(c).map(Gsm7Char::septets)
}

/// Character for a basic table septet.
pub fn basic_char(septet: u8) -> char {
    BASIC[(septet & 0x7F) as usize]
}

/// Character for an extension septet. Unknown extension codes fall back to
/// the basic table character, as the standard recommends.
pub fn extension_char(septet: u8) -> char {
    EXTENSION
        .iter()
        .find(|(code, _)| *code == septet)
        .map(|(_, c)| *c)
        .unwrap_or_else(|| basic_char(septet))
}

/// Pack `septets` into `out` starting `bit_offset` bits in.
///
/// Bytes of `out` touched by the packing must be zero on entry except for
/// header bits below `bit_offset`. Returns the number of octets used counting
/// from the start of `out`, or `None` if `out` is too small.
pub fn pack(septets: &[u8], bit_offset: usize, out: &mut [u8]) -> Option<usize> {
    let total_bits = bit_offset + septets.len() * 7;
    let used = total_bits.div_ceil(8);
    if used > out.len() {
        return None;
    }
    for (i, &septet) in septets.iter().enumerate() {
        let bit = bit_offset + i * 7;
        let byte = bit / 8;
        let shift = bit % 8;
        let value = (septet & 0x7F) as u16;
        out[byte] |= (value << shift) as u8;
        if shift > 1 {
            out[byte + 1] |= (value >> (8 - shift)) as u8;
        }
    }
    Some(used)
}

/// Septet starting at `bit` within `data`, or `None` if it runs past the end.
pub fn septet_at(data: &[u8], bit: usize) -> Option<u8> {
    let byte = bit / 8;
    let shift = bit % 8;
    let low = *data.get(byte)? as u16;
    let high = if shift > 1 {
        *data.get(byte + 1)? as u16
    } else {
        0
    };
    Some((((high << 8) | low) >> shift) as u8 & 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_letters_map_to_themselves() {
        assert_eq!(lookup('A'), Some(Gsm7Char::Basic(0x41)));
        assert_eq!(lookup('z'), Some(Gsm7Char::Basic(0x7A)));
        assert_eq!(lookup('7'), Some(Gsm7Char::Basic(0x37)));
    }

    #[test]
    fn relocated_ascii_symbols() {
        assert_eq!(lookup('@'), Some(Gsm7Char::Basic(0x00)));
        assert_eq!(lookup('$'), Some(Gsm7Char::Basic(0x02)));
        assert_eq!(lookup('_'), Some(Gsm7Char::Basic(0x11)));
        assert_eq!(lookup('`'), None);
    }

    #[test]
    fn extension_characters_cost_two_septets() {
        assert_eq!(lookup('€'), Some(Gsm7Char::Extended(0x65)));
        assert_eq!(septet_len('['), Some(2));
        assert_eq!(septet_len('\u{0C}'), Some(2));
        assert_eq!(septet_len('é'), Some(1));
        assert_eq!(septet_len('中'), None);
    }

    #[test]
    fn escape_is_not_a_character() {
        assert_eq!(lookup('\u{1B}'), None);
    }

    #[test]
    fn packs_hello() {
        let septets = [b'h', b'e', b'l', b'l', b'o'];
        let mut out = [0u8; 8];
        let used = pack(&septets, 0, &mut out).unwrap();
        assert_eq!(&out[..used], &[0xE8, 0x32, 0x9B, 0xFD, 0x06]);
        for (i, &s) in septets.iter().enumerate() {
            assert_eq!(septet_at(&out, i * 7), Some(s));
        }
    }

    #[test]
    fn packs_after_header_padding() {
        // 6 header octets then one fill bit: text starts at bit 49
        let mut out = [0u8; 8];
        let used = pack(&[b'A'], 49, &mut out).unwrap();
        assert_eq!(used, 7);
        assert_eq!(out[6], 0x41 << 1);
        assert_eq!(septet_at(&out, 49), Some(b'A'));
    }

    #[test]
    fn pack_rejects_small_buffer() {
        let mut out = [0u8; 2];
        assert_eq!(pack(&[1, 2, 3], 0, &mut out), None);
    }

    #[test]
    fn unknown_extension_falls_back_to_basic() {
        assert_eq!(extension_char(0x65), '€');
        assert_eq!(extension_char(0x41), 'A');
    }
}
