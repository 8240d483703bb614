use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SubrelayError};

/// A caption clock value, stored as whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Truncates to whole milliseconds, within a 1e-6 ms tolerance.
    /// Negative and NaN inputs clamp to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Self::ZERO;
        }
        // The epsilon absorbs representation error (1.001 * 1000.0 == 1000.999...)
        Self((seconds * 1000.0 + 1e-6).floor() as u64)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let secs = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

impl FromStr for Timestamp {
    type Err = SubrelayError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let malformed = |reason: &str| SubrelayError::Format(format!("invalid clock '{}': {}", s, reason));

        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() != 3 {
            return Err(malformed("expected HH:MM:SS,mmm"));
        }

        let (secs, millis) = fields[2]
            .split_once([',', '.'])
            .ok_or_else(|| malformed("missing milliseconds"))?;

        let hours = parse_field(fields[0]).ok_or_else(|| malformed("non-numeric hours"))?;
        let minutes = parse_field(fields[1]).ok_or_else(|| malformed("non-numeric minutes"))?;
        let secs = parse_field(secs).ok_or_else(|| malformed("non-numeric seconds"))?;
        let millis = parse_field(millis).ok_or_else(|| malformed("non-numeric milliseconds"))?;

        if minutes >= 60 || secs >= 60 || millis >= 1000 {
            return Err(malformed("field out of range"));
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + secs * 1_000 + millis))
            .map(Self)
            .ok_or_else(|| malformed("field out of range"))
    }
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Format seconds as `HH:MM:SS,mmm`; hours are not wrapped, milliseconds are truncated.
pub fn encode(seconds: f64) -> String {
    Timestamp::from_seconds(seconds).to_string()
}

/// Parse an `HH:MM:SS,mmm` clock back to seconds.
pub fn decode(clock: &str) -> Result<f64> {
    clock.parse::<Timestamp>().map(|t| t.as_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(0.0), "00:00:00,000");
        assert_eq!(encode(65.123), "00:01:05,123");
        assert_eq!(encode(3661.500), "01:01:01,500");
        assert_eq!(encode(2.5), "00:00:02,500");
    }

    #[test]
    fn test_encode_truncates_milliseconds() {
        assert_eq!(encode(1.9999), "00:00:01,999");
        assert_eq!(encode(0.0004), "00:00:00,000");
    }

    #[test]
    fn test_hours_are_not_wrapped() {
        assert_eq!(encode(100.0 * 3600.0 + 1.0), "100:00:01,000");
        assert_eq!(decode("100:00:01,000").unwrap(), 360_001.0);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(encode(-3.0), "00:00:00,000");
        assert_eq!(encode(f64::NAN), "00:00:00,000");
    }

    #[test]
    fn test_decode_accepts_dot_separator() {
        assert_eq!(decode("00:00:02.500").unwrap(), 2.5);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in ["", "00:00", "00:00:01", "aa:00:01,000", "00:0x:01,000", "00:00:01,-10", "00:61:00,000", "1:2:3:4,000"] {
            let err = decode(bad).unwrap_err();
            assert!(matches!(err, SubrelayError::Format(_)), "{bad} should be a format error");
        }
    }

    #[test]
    fn test_decode_rejects_overflowing_hours() {
        for bad in ["5124095576030432:00:00,000", "18446744073709551615:00:00,000", "99999999999999999999:00:00,000"] {
            let err = decode(bad).unwrap_err();
            assert!(matches!(err, SubrelayError::Format(_)), "{bad} should be a format error");
        }
        // Largest hour count that still fits
        let max_hours = u64::MAX / 3_600_000;
        assert!(format!("{}:59:59,999", max_hours).parse::<Timestamp>().is_ok());
    }

    #[test]
    fn test_decode_inverts_encode_within_a_millisecond() {
        let mut seconds = 0.0;
        while seconds < 7300.0 {
            let recovered = decode(&encode(seconds)).unwrap();
            assert!((recovered - seconds).abs() < 0.001, "{seconds} -> {recovered}");
            seconds += 13.377;
        }
    }

    #[test]
    fn test_encode_inverts_decode_exactly() {
        for millis in [0u64, 1, 999, 1_001, 59_999, 3_599_999, 86_400_123] {
            let clock = Timestamp::from_millis(millis).to_string();
            assert_eq!(encode(decode(&clock).unwrap()), clock);
        }
    }
}
