//! Arrival scanner timestamp format.
//!
//! Loft scanners report arrivals as 14 ASCII digits in the `YYYYMMDDHHMMSS`
//! format, always in UTC. Months are 1-indexed on the wire.

use derive_more::{Display, Error, From};
use time::{error::ComponentRange, Date, Month, PrimitiveDateTime, Time};

pub const TIMESTAMP_LENGTH: usize = 14;

/// Errors that may occur while parsing a scanner timestamp.
#[derive(Debug, Display, From, Error, PartialEq, Eq)]
pub enum ScannerTimestampError {
    #[display(fmt = "scanner timestamp must be exactly {TIMESTAMP_LENGTH} digits")]
    InvalidLength,

    #[display(fmt = "scanner timestamp must contain digits only")]
    NonDigit,

    #[display(fmt = "scanner timestamp component is out of range: {_0}")]
    OutOfRange(ComponentRange),
}

/// Parse a scanner timestamp into a UTC date and time.
pub fn parse_timestamp(value: &str) -> Result<PrimitiveDateTime, ScannerTimestampError> {
    if value.len() != TIMESTAMP_LENGTH {
        return Err(ScannerTimestampError::InvalidLength);
    }

    if !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ScannerTimestampError::NonDigit);
    }

    // Every field has at most four digits, thus no overflow is possible.
    let field = |start: usize, end: usize| -> u16 {
        value.as_bytes()[start..end]
            .iter()
            .fold(0, |acc, byte| acc * 10 + u16::from(byte - b'0'))
    };

    let month = Month::try_from(field(4, 6) as u8)?;

    let date = Date::from_calendar_date(i32::from(field(0, 4)), month, field(6, 8) as u8)?;
    let time = Time::from_hms(
        field(8, 10) as u8,
        field(10, 12) as u8,
        field(12, 14) as u8,
    )?;

    Ok(PrimitiveDateTime::new(date, time))
}
