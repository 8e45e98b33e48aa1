//! Human-readable trip identifiers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::TemplateCode;

/// Error returned when parsing an invalid trip number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid trip number {input:?}: {reason}")]
pub struct InvalidTripNumber {
    input: String,
    reason: &'static str,
}

/// A trip number of the form `{templateCode}-{YYYYMMDD}-{seq}`.
///
/// The sequence is zero-padded to three digits but may grow wider.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use linehaul_server::domain::{TemplateCode, TripNumber};
///
/// let code = TemplateCode::parse("DENSLC1").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// let number = TripNumber::new(&code, date, 7);
/// assert_eq!(number.as_str(), "DENSLC1-20250314-007");
/// assert_eq!(number.sequence(), 7);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripNumber(String);

impl TripNumber {
    /// Build the number for sequence `seq` of `code` on `date`.
    pub fn new(code: &TemplateCode, date: NaiveDate, seq: u32) -> Self {
        Self(format!("{}{:03}", Self::prefix(code, date), seq))
    }

    /// The `{templateCode}-{YYYYMMDD}-` prefix shared by every trip of a
    /// template on one day.
    pub fn prefix(code: &TemplateCode, date: NaiveDate) -> String {
        format!("{}-{}-", code.as_str(), date.format("%Y%m%d"))
    }

    /// Parse an existing trip number, checking only its overall shape.
    pub fn parse(s: &str) -> Result<Self, InvalidTripNumber> {
        let invalid = |reason| InvalidTripNumber {
            input: s.to_string(),
            reason,
        };

        let mut parts = s.rsplitn(3, '-');
        let seq = parts.next().ok_or_else(|| invalid("missing sequence"))?;
        let date = parts.next().ok_or_else(|| invalid("missing date"))?;
        let code = parts.next().ok_or_else(|| invalid("missing template code"))?;

        if seq.len() < 3 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("sequence must be at least 3 digits"));
        }
        if NaiveDate::parse_from_str(date, "%Y%m%d").is_err() || date.len() != 8 {
            return Err(invalid("date must be YYYYMMDD"));
        }
        TemplateCode::parse(code).map_err(|_| invalid("bad template code"))?;

        Ok(Self(s.to_string()))
    }

    /// Returns the trip number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric trailing sequence.
    pub fn sequence(&self) -> u32 {
        parse_sequence(&self.0).unwrap_or(0)
    }
}

/// Parse the trailing `-NNN` sequence of a trip number string.
pub(crate) fn parse_sequence(s: &str) -> Option<u32> {
    s.rsplit('-').next()?.parse().ok()
}

impl fmt::Debug for TripNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripNumber({})", self.0)
    }
}

impl fmt::Display for TripNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TripNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TripNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TripNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}
