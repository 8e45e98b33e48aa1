//! Terminal code types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid terminal code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid terminal code: {reason}")]
pub struct InvalidTerminalCode {
    reason: &'static str,
}

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 5;

/// A terminal (location) code such as `DEN` or `SLC`.
///
/// Terminal codes are 2 to 5 uppercase ASCII letters or digits. Any
/// `TerminalCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use linehaul_server::domain::TerminalCode;
///
/// let den = TerminalCode::parse("DEN").unwrap();
/// assert_eq!(den.as_str(), "DEN");
///
/// // Lowercase is rejected unless normalized first
/// assert!(TerminalCode::parse("den").is_err());
/// assert_eq!(TerminalCode::parse_normalized(" den ").unwrap(), den);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalCode {
    bytes: [u8; MAX_LEN],
    len: u8,
}

impl TerminalCode {
    /// Parse a terminal code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidTerminalCode> {
        let bytes = s.as_bytes();

        if bytes.len() < MIN_LEN || bytes.len() > MAX_LEN {
            return Err(InvalidTerminalCode {
                reason: "must be 2 to 5 characters",
            });
        }

        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidTerminalCode {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        let mut buf = [0u8; MAX_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Parse after trimming whitespace and upper-casing.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidTerminalCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored, so this cannot fail.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for TerminalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TerminalCode({})", self.as_str())
    }
}

impl fmt::Display for TerminalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TerminalCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TerminalCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TerminalCode::parse_normalized(&s).map_err(serde::de::Error::custom)
    }
}
