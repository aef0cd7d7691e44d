//! Range records and the line-level parsing boundary.
//!
//! The trees only need [`RangeRecord`]: a low and a high boundary of equal
//! width. Everything else a BIN file carries (issuer, country, product
//! codes) belongs to the caller's record type.

use std::fmt;

use crate::error::{ParseError, Result};
use crate::range;

/// A numeric card-prefix interval `[low_bin, high_bin]`.
///
/// Both boundaries are decimal digit strings of the same width, with
/// `low_bin <= high_bin`.
pub trait RangeRecord {
    fn low_bin(&self) -> &str;
    fn high_bin(&self) -> &str;
}

impl<T: RangeRecord + ?Sized> RangeRecord for &T {
    fn low_bin(&self) -> &str {
        (**self).low_bin()
    }

    fn high_bin(&self) -> &str {
        (**self).high_bin()
    }
}

/// Minimal owned range record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinRange {
    low_bin: String,
    high_bin: String,
}

impl BinRange {
    /// Build a record, rejecting boundaries that are not an ordered pair of
    /// equal-width digit strings.
    pub fn new(low_bin: impl Into<String>, high_bin: impl Into<String>) -> Result<Self> {
        let low_bin = low_bin.into();
        let high_bin = high_bin.into();
        range::parse_bounds(&low_bin, &high_bin)?;
        Ok(Self { low_bin, high_bin })
    }

    /// Single-value range `[bin, bin]`.
    pub fn point(bin: impl Into<String>) -> Result<Self> {
        let bin = bin.into();
        Self::new(bin.clone(), bin)
    }
}

impl RangeRecord for BinRange {
    fn low_bin(&self) -> &str {
        &self.low_bin
    }

    fn high_bin(&self) -> &str {
        &self.high_bin
    }
}

impl fmt::Display for BinRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low_bin, self.high_bin)
    }
}

/// Kind of a BIN file line, from its leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Header,
    Detail,
    Trailer,
    Other,
}

impl RecordType {
    pub fn from_char(c: char) -> Self {
        match c {
            'H' => RecordType::Header,
            'D' => RecordType::Detail,
            'T' => RecordType::Trailer,
            _ => RecordType::Other,
        }
    }

    /// Classify a line; an empty line is [`RecordType::Other`].
    pub fn of_line(line: &str) -> Self {
        line.chars().next().map_or(RecordType::Other, Self::from_char)
    }
}

/// Turns detail lines into range records.
pub trait RecordParser {
    type Record: RangeRecord;

    fn parse(&self, line: &str) -> std::result::Result<Self::Record, ParseError>;

    fn classify(&self, line: &str) -> RecordType {
        RecordType::of_line(line)
    }
}

const RECORD_TYPE_WIDTH: usize = 1;
const BIN_WIDTH: usize = 16;

/// Parser for the boundary fields of a fixed-width BIN detail record.
///
/// Layout: record type (1 char), low BIN (16), high BIN (16), followed by
/// business fields this parser ignores. Fields are right-padded with spaces;
/// trailing whitespace is stripped. A line may end inside its high BIN field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidthParser;

impl FixedWidthParser {
    fn field<'a>(
        line: &'a str,
        field: &'static str,
        offset: usize,
        width: usize,
    ) -> std::result::Result<&'a str, ParseError> {
        let truncated = ParseError::Truncated {
            field,
            offset,
            expected: width,
        };
        if offset >= line.len() {
            return Err(truncated);
        }
        let end = line.len().min(offset + width);
        let value = line.get(offset..end).ok_or(truncated)?.trim_end();
        if !range::is_valid_key(value) {
            return Err(ParseError::NotNumeric {
                field,
                value: value.to_owned(),
            });
        }
        Ok(value)
    }
}

impl RecordParser for FixedWidthParser {
    type Record = BinRange;

    fn parse(&self, line: &str) -> std::result::Result<BinRange, ParseError> {
        let kind = line.chars().next().ok_or(ParseError::Empty)?;
        if RecordType::from_char(kind) != RecordType::Detail {
            return Err(ParseError::NotDetail(kind));
        }

        let low = Self::field(line, "low BIN", RECORD_TYPE_WIDTH, BIN_WIDTH)?;
        let high = Self::field(line, "high BIN", RECORD_TYPE_WIDTH + BIN_WIDTH, BIN_WIDTH)?;
        if low.len() != high.len() {
            return Err(ParseError::LengthMismatch {
                low: low.to_owned(),
                high: high.to_owned(),
            });
        }
        if low > high {
            return Err(ParseError::Inverted {
                low: low.to_owned(),
                high: high.to_owned(),
            });
        }

        Ok(BinRange {
            low_bin: low.to_owned(),
            high_bin: high.to_owned(),
        })
    }
}
