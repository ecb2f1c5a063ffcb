//! Network time push parsing and calendar helpers.
//!
//! SIM7000 modems announce network time with a `*PSUTTZ:` push once
//! `AT+CLTS=1` is set. The documented layout is
//! `*PSUTTZ: <year>,<month>,<day>,<hour>,<min>,<sec>,"<tz>",<dst>` but real
//! firmware mixes separators, e.g. `*PSUTTZ: 25/04/02,09:49:27","+08",1`.
//! The parser is deliberately loose: separators are normalised, quotes are
//! skipped and any other character rejects the push.

use core::fmt::Write as _;
use heapless::String;

/// Marker announcing a network time push
pub const NETWORK_TIME_MARKER: &str = "*PSUTTZ: ";

/// Capacity of the normalised token buffer
const FILTERED_CAPACITY: usize = 35;

/// Number of values carried by a time push
const TOKEN_COUNT: usize = 8;

/// Accepted range of each value, in push order. The year is an offset from
/// 2000 and must stay within four digits once added.
const FIELD_RANGES: [(i32, i32); TOKEN_COUNT] = [
    (0, 7_999),
    (1, 12),
    (1, 31),
    (0, 23),
    (0, 59),
    (0, 59),
    (-48, 56),
    (0, 2),
];

/// Wall clock rendering such as `2025/04/02 09:49:27`
pub type WallClock = String<20>;

/// Reasons a time push could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeParseError {
    /// A character outside digits, signs and separators was found
    IllegalCharacter(u8),
    /// Payload does not fit the normalisation buffer
    TooLong,
    /// Fewer than eight values were present; carries the missing index
    MissingField(u8),
    /// A value lies outside its calendar range; carries its index
    OutOfRange(u8),
}

impl core::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimeParseError::IllegalCharacter(c) => write!(f, "illegal character 0x{:02x}", c),
            TimeParseError::TooLong => f.write_str("payload too long"),
            TimeParseError::MissingField(i) => write!(f, "value {} missing", i),
            TimeParseError::OutOfRange(i) => write!(f, "value {} out of range", i),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TimeParseError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TimeParseError::IllegalCharacter(c) => defmt::write!(f, "IllegalCharacter({=u8:#x})", c),
            TimeParseError::TooLong => defmt::write!(f, "TooLong"),
            TimeParseError::MissingField(i) => defmt::write!(f, "MissingField({=u8})", i),
            TimeParseError::OutOfRange(i) => defmt::write!(f, "OutOfRange({=u8})", i),
        }
    }
}

/// Decoded network time push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkTime {
    /// Four digit year
    pub year: i32,
    /// Month (1-12)
    pub month: i32,
    /// Day of month (1-31)
    pub day: i32,
    /// Hour (0-23)
    pub hour: i32,
    /// Minute (0-59)
    pub minute: i32,
    /// Second (0-59)
    pub second: i32,
    /// Offset to UTC in quarters of an hour
    pub quarters_from_utc: i32,
    /// Daylight saving flag as sent by the network
    pub dst: i32,
}

impl NetworkTime {
    /// Parse the payload following [`NETWORK_TIME_MARKER`].
    pub fn parse(payload: &str) -> Result<Self, TimeParseError> {
        let mut filtered: String<FILTERED_CAPACITY> = String::new();
        for &c in payload.as_bytes() {
            let kept = match c {
                b'/' | b':' => Some(','),
                b'0'..=b'9' | b'+' | b'-' | b',' => Some(c as char),
                b'"' => None,
                _ => return Err(TimeParseError::IllegalCharacter(c)),
            };
            if let Some(kept) = kept {
                filtered.push(kept).map_err(|_| TimeParseError::TooLong)?;
                if filtered.len() >= FILTERED_CAPACITY {
                    return Err(TimeParseError::TooLong);
                }
            }
        }

        let mut values = [0i32; TOKEN_COUNT];
        let mut tokens = filtered.split(',').filter(|t| !t.is_empty());
        for (i, value) in values.iter_mut().enumerate() {
            let token = tokens.next().ok_or(TimeParseError::MissingField(i as u8))?;
            *value = leading_int(token);
            let (low, high) = FIELD_RANGES[i];
            if !(low..=high).contains(&*value) {
                return Err(TimeParseError::OutOfRange(i as u8));
            }
        }

        Ok(Self {
            year: values[0] + 2000,
            month: values[1],
            day: values[2],
            hour: values[3],
            minute: values[4],
            second: values[5],
            quarters_from_utc: values[6],
            dst: values[7],
        })
    }

    /// Seconds since the Unix epoch, taking the fields as UTC.
    pub fn to_unix(&self) -> i64 {
        days_from_civil(self.year as i64, self.month as i64, self.day as i64) * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64
    }
}

/// Parse an optionally signed leading integer, ignoring trailing garbage.
fn leading_int(token: &str) -> i32 {
    let bytes = token.as_bytes();
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let mut value: i32 = 0;
    for &d in digits.iter().take_while(|d| d.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add((d - b'0') as i32);
    }
    if negative { -value } else { value }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
pub fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Calendar date `(year, month, day)` for a day count since 1970-01-01.
pub fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

/// Render `unix_seconds` as `YYYY/MM/DD hh:mm:ss`.
pub fn format_wall_clock(unix_seconds: i64) -> WallClock {
    let days = unix_seconds.div_euclid(86_400);
    let secs = unix_seconds.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    let mut out = WallClock::new();
    // 19 characters for any four digit year
    let _ = write!(
        out,
        "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        secs / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modem_flavoured_push() {
        let time = NetworkTime::parse("25/04/02,09:49:27\",\"+08\",1").unwrap();
        assert_eq!(time.year, 2025);
        assert_eq!(time.month, 4);
        assert_eq!(time.day, 2);
        assert_eq!(time.hour, 9);
        assert_eq!(time.minute, 49);
        assert_eq!(time.second, 27);
        assert_eq!(time.quarters_from_utc, 8);
        assert_eq!(time.dst, 1);
        assert_eq!(time.to_unix(), 1_743_587_367);
    }

    #[test]
    fn parses_documented_push() {
        let time = NetworkTime::parse("2024,1,15,12,0,0,\"-16\",0").unwrap();
        // Two digit years are expected, four digit ones are kept verbatim plus 2000
        assert_eq!(time.year, 4024);
        assert_eq!(time.quarters_from_utc, -16);
    }

    #[test]
    fn rejects_letters() {
        assert_eq!(
            NetworkTime::parse("25/04/02,09:49:27 GMT"),
            Err(TimeParseError::IllegalCharacter(b' '))
        );
    }

    #[test]
    fn rejects_missing_values() {
        assert_eq!(
            NetworkTime::parse("25/04/02,09:49"),
            Err(TimeParseError::MissingField(5))
        );
    }

    #[test]
    fn rejects_huge_year_without_overflow() {
        assert_eq!(
            NetworkTime::parse("9999999999,1,1,1,1,1,1,1"),
            Err(TimeParseError::OutOfRange(0))
        );
        assert_eq!(
            NetworkTime::parse("-9999999999,1,1,1,1,1,1,1"),
            Err(TimeParseError::OutOfRange(0))
        );
    }

    #[test]
    fn rejects_impossible_calendar_fields() {
        assert_eq!(
            NetworkTime::parse("25/13/02,09:49:27,+08,1"),
            Err(TimeParseError::OutOfRange(1))
        );
        assert_eq!(
            NetworkTime::parse("25/04/00,09:49:27,+08,1"),
            Err(TimeParseError::OutOfRange(2))
        );
        assert_eq!(
            NetworkTime::parse("25/04/02,24:00:00,+08,1"),
            Err(TimeParseError::OutOfRange(3))
        );
        assert_eq!(
            NetworkTime::parse("25/04/02,09:60:27,+08,1"),
            Err(TimeParseError::OutOfRange(4))
        );
        assert_eq!(
            NetworkTime::parse("25/04/02,09:49:27,+99,1"),
            Err(TimeParseError::OutOfRange(6))
        );
    }

    #[test]
    fn rejects_oversized_payload() {
        assert_eq!(
            NetworkTime::parse("1111111111,2222222222,3333333333,4444444444"),
            Err(TimeParseError::TooLong)
        );
    }

    #[test]
    fn civil_round_trip_on_known_dates() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2000, 3, 1), 11_017);
        assert_eq!(civil_from_days(11_017), (2000, 3, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
    }

    #[test]
    fn formats_wall_clock() {
        assert_eq!(format_wall_clock(1_743_587_367).as_str(), "2025/04/02 09:49:27");
        assert_eq!(format_wall_clock(0).as_str(), "1970/01/01 00:00:00");
    }
}
