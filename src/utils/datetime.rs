//! Programme timestamp normalisation
//!
//! Sources hand us start/stop times in whatever shape their upstream API
//! uses: XMLTV (`20250101120000 +0000`), ISO 8601 (`2025-01-01T12:00Z`) or
//! unix epoch numbers. Everything is normalised to the XMLTV canonical form
//! `YYYYMMDDHHMMSS ±HHMM`, keeping the offset the source supplied.
//!
//! # Usage
//!
//! ```rust
//! use epg_merger::utils::datetime::XmltvTimestamp;
//!
//! let ts = XmltvTimestamp::parse("2025-01-01T12:00:00Z").unwrap();
//! assert_eq!(ts.as_str(), "20250101120000 +0000");
//! ```

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Canonical XMLTV timestamp layout
pub const XMLTV_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Errors that can occur during timestamp normalisation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateTimeError {
    /// Nothing to parse
    #[error("Empty timestamp")]
    Empty,

    /// Invalid datetime format provided
    #[error("Invalid timestamp format: '{input}' - expected XMLTV (20250101120000 +0000), ISO 8601 or epoch")]
    InvalidFormat { input: String },

    /// Epoch value outside chrono's representable range
    #[error("Timestamp out of range: {input}")]
    OutOfRange { input: String },
}

/// A parsed programme timestamp together with its canonical text form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmltvTimestamp {
    instant: DateTime<FixedOffset>,
    canonical: String,
}

impl XmltvTimestamp {
    /// Parse a timestamp from any of the supported source formats
    ///
    /// Supports:
    /// - XMLTV with offset: "20250101120000 +0100" (also without the space)
    /// - XMLTV without offset or seconds: "20250101120000", "202501011200" (taken as +0000)
    /// - RFC 3339: "2025-01-01T12:00:00Z", "2025-01-01T12:00:00-06:00"
    /// - ISO without seconds: "2025-01-01T12:00Z"
    /// - Unix epoch seconds (10 digits) or milliseconds (13 digits)
    pub fn parse(input: &str) -> Result<Self, DateTimeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DateTimeError::Empty);
        }

        let instant = if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Self::parse_digits(trimmed)?
        } else {
            Self::parse_structured(trimmed)?
        };

        Ok(Self::from_instant(instant))
    }

    /// Build a timestamp from an already-resolved instant
    pub fn from_instant(instant: DateTime<FixedOffset>) -> Self {
        Self {
            canonical: instant.format(XMLTV_FORMAT).to_string(),
            instant,
        }
    }

    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    /// Canonical `YYYYMMDDHHMMSS ±HHMM` text
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn into_string(self) -> String {
        self.canonical
    }

    fn parse_digits(digits: &str) -> Result<DateTime<FixedOffset>, DateTimeError> {
        let out_of_range = || DateTimeError::OutOfRange {
            input: digits.to_string(),
        };

        match digits.len() {
            14 => Self::naive_as_utc(digits, "%Y%m%d%H%M%S"),
            12 => Self::naive_as_utc(digits, "%Y%m%d%H%M"),
            13 => {
                let millis: i64 = digits.parse().map_err(|_| out_of_range())?;
                DateTime::from_timestamp_millis(millis)
                    .map(|dt| dt.fixed_offset())
                    .ok_or_else(out_of_range)
            }
            10 => {
                let secs: i64 = digits.parse().map_err(|_| out_of_range())?;
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.fixed_offset())
                    .ok_or_else(out_of_range)
            }
            _ => Err(DateTimeError::InvalidFormat {
                input: digits.to_string(),
            }),
        }
    }

    fn parse_structured(trimmed: &str) -> Result<DateTime<FixedOffset>, DateTimeError> {
        let offset_formats = [
            "%Y%m%d%H%M%S %z",
            "%Y%m%d%H%M%S%z",
            "%Y%m%d%H%M %z",
            "%Y-%m-%dT%H:%M:%S%z",
            "%Y-%m-%dT%H:%M%z",
        ];

        for format in &offset_formats {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
                return Ok(dt);
            }
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt);
        }

        // Zulu and offset-less ISO variants
        let naive_formats = [
            "%Y-%m-%dT%H:%MZ",
            "%Y-%m-%dT%H:%M:%S%.fZ",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
        ];

        for format in &naive_formats {
            if let Ok(dt) = Self::naive_as_utc(trimmed, format) {
                return Ok(dt);
            }
        }

        Err(DateTimeError::InvalidFormat {
            input: trimmed.to_string(),
        })
    }

    fn naive_as_utc(input: &str, format: &str) -> Result<DateTime<FixedOffset>, DateTimeError> {
        NaiveDateTime::parse_from_str(input, format)
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|_| DateTimeError::InvalidFormat {
                input: input.to_string(),
            })
    }
}

impl fmt::Display for XmltvTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Ord for XmltvTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.canonical.cmp(&other.canonical))
    }
}

impl PartialOrd for XmltvTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
