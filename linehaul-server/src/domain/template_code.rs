//! Route template (linehaul profile) code type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid template code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid template code: {reason}")]
pub struct InvalidTemplateCode {
    reason: &'static str,
}

const MAX_LEN: usize = 16;

/// Short unique code identifying a route template, e.g. `DENSLC1`.
///
/// Codes are 1 to 16 characters of uppercase ASCII letters, digits and `-`.
/// They appear verbatim at the front of every trip number allocated from
/// the template.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateCode(String);

impl TemplateCode {
    /// Parse a template code.
    pub fn parse(s: &str) -> Result<Self, InvalidTemplateCode> {
        if s.is_empty() || s.len() > MAX_LEN {
            return Err(InvalidTemplateCode {
                reason: "must be 1 to 16 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(InvalidTemplateCode {
                reason: "must be uppercase ASCII letters, digits or '-'",
            });
        }

        Ok(Self(s.to_string()))
    }

    /// Parse after trimming whitespace and upper-casing.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidTemplateCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading run of letters, e.g. `DENSLC` for `DENSLC1`.
    pub fn letter_prefix(&self) -> &str {
        letter_prefix(&self.0)
    }
}

/// The leading run of ASCII letters in `s`.
pub(crate) fn letter_prefix(s: &str) -> &str {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_alphabetic())
        .unwrap_or(s.len());
    &s[..end]
}

impl fmt::Debug for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemplateCode({})", self.0)
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for TemplateCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TemplateCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TemplateCode::parse_normalized(&s).map_err(serde::de::Error::custom)
    }
}
