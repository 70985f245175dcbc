//! Field checks shared by the build script and the runtime loader.
//!
//! Only `core` may be used here: `build.rs` pulls this file in with `#[path]`.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Missing,
    Empty,
    TooLong,
    Negative,
    OutOfRange,
    Malformed,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Reason::Missing => "value is missing",
            Reason::Empty => "value must not be empty",
            Reason::TooLong => "value is too long",
            Reason::Negative => "value must not be negative",
            Reason::OutOfRange => "value is out of range",
            Reason::Malformed => "document could not be decoded",
        };
        f.write_str(msg)
    }
}

/// Checks a required string: non-empty and at most `max_len` bytes.
pub fn text(value: &str, max_len: usize) -> Result<&str, Reason> {
    if value.is_empty() {
        return Err(Reason::Empty);
    }
    if value.len() > max_len {
        return Err(Reason::TooLong);
    }
    Ok(value)
}

/// Checks a TCP port, 1..=65535.
pub fn port(value: i64) -> Result<u16, Reason> {
    match u16::try_from(value) {
        Ok(0) | Err(_) => Err(Reason::OutOfRange),
        Ok(port) => Ok(port),
    }
}

/// Checks a millisecond, count or byte value against the 32-bit range of the MCU.
pub fn unsigned(value: i64) -> Result<u32, Reason> {
    if value < 0 {
        return Err(Reason::Negative);
    }
    u32::try_from(value).map_err(|_| Reason::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rejects_empty_and_oversized() {
        assert_eq!(text("", 8), Err(Reason::Empty));
        assert_eq!(text("123456789", 8), Err(Reason::TooLong));
        assert_eq!(text("12345678", 8), Ok("12345678"));
    }

    #[test]
    fn text_limit_counts_bytes() {
        // "ü" is two bytes in UTF-8
        assert_eq!(text("üüü", 5), Err(Reason::TooLong));
        assert_eq!(text("üü", 4), Ok("üü"));
    }

    #[test]
    fn port_bounds() {
        assert_eq!(port(1), Ok(1));
        assert_eq!(port(1883), Ok(1883));
        assert_eq!(port(65535), Ok(65535));
        assert_eq!(port(0), Err(Reason::OutOfRange));
        assert_eq!(port(-1), Err(Reason::OutOfRange));
        assert_eq!(port(65536), Err(Reason::OutOfRange));
        assert_eq!(port(70000), Err(Reason::OutOfRange));
    }

    #[test]
    fn unsigned_bounds() {
        assert_eq!(unsigned(0), Ok(0));
        assert_eq!(unsigned(86_400_000), Ok(86_400_000));
        assert_eq!(unsigned(i64::from(u32::MAX)), Ok(u32::MAX));
        assert_eq!(unsigned(-1), Err(Reason::Negative));
        assert_eq!(unsigned(i64::from(u32::MAX) + 1), Err(Reason::OutOfRange));
    }
}
