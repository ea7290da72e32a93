//! Station code and station metadata types.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geo::Coordinate;

/// Helsinki central station.
pub const HELSINKI: &str = "HKI";

/// Pasila, the hub just north of Helsinki that loop services pass twice.
pub const PASILA: &str = "PSL";

/// Error returned when parsing an invalid station short code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A Finnish rail station short code, e.g. `HKI`, `PSL` or `KÄP`.
///
/// Codes are 2 to 4 uppercase letters and may contain Finnish letters such
/// as `Ä` and `Ö`, so the code is stored as a string rather than a byte
/// array.
///
/// # Examples
///
/// ```
/// use commuter_server::domain::StationCode;
///
/// let hki = StationCode::parse("HKI").unwrap();
/// assert_eq!(hki.as_str(), "HKI");
///
/// // Accented letters are fine
/// assert!(StationCode::parse("KÄP").is_ok());
///
/// // Lowercase is rejected unless normalized first
/// assert!(StationCode::parse("hki").is_err());
/// assert_eq!(StationCode::parse_normalized(" hki ").unwrap().as_str(), "HKI");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code. The input must already be uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let len = s.chars().count();
        if !(2..=4).contains(&len) {
            return Err(InvalidStationCode {
                reason: "must be 2 to 4 characters",
            });
        }

        if !s.chars().all(|c| c.is_alphabetic() && c.is_uppercase()) {
            return Err(InvalidStationCode {
                reason: "must be uppercase letters",
            });
        }

        Ok(Self(s.to_string()))
    }

    /// Parse a code after trimming whitespace and uppercasing it.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the hubs that loop trains traverse twice.
    pub fn is_loop_hub(&self) -> bool {
        is_loop_hub(self.as_str())
    }
}

/// Whether `code` is Helsinki or Pasila.
pub(crate) fn is_loop_hub(code: &str) -> bool {
    code == HELSINKI || code == PASILA
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        StationCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Borrow<str> for StationCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StationCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A passenger station from the reference data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Display name, e.g. "Helsinki asema".
    pub name: String,
    /// Unique short code.
    pub short_code: StationCode,
    /// Location, when the feed provides one.
    pub location: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(StationCode::parse("HKI").is_ok());
        assert!(StationCode::parse("PSL").is_ok());
        assert!(StationCode::parse("LH").is_ok());
        assert!(StationCode::parse("KÄP").is_ok());
        assert!(StationCode::parse("TKLA").is_ok());
    }

    #[test]
    fn reject_lowercase() {
        assert!(StationCode::parse("hki").is_err());
        assert!(StationCode::parse("Hki").is_err());
        assert!(StationCode::parse("KäP").is_err());
    }

    #[test]
    fn reject_wrong_length() {
        assert!(StationCode::parse("").is_err());
        assert!(StationCode::parse("H").is_err());
        assert!(StationCode::parse("HELSI").is_err());
    }

    #[test]
    fn reject_non_letters() {
        assert!(StationCode::parse("H1I").is_err());
        assert!(StationCode::parse("H-I").is_err());
        assert!(StationCode::parse("H I").is_err());
    }

    #[test]
    fn accented_length_counts_characters() {
        // "KÄP" is 4 bytes but 3 characters
        assert_eq!("KÄP".len(), 4);
        assert!(StationCode::parse("KÄPY").is_ok());
    }

    #[test]
    fn normalized_parsing() {
        let code = StationCode::parse_normalized("  psl\n").unwrap();
        assert_eq!(code.as_str(), "PSL");
        assert_eq!(StationCode::parse_normalized("käp").unwrap().as_str(), "KÄP");
    }

    #[test]
    fn loop_hubs() {
        assert!(StationCode::parse("HKI").unwrap().is_loop_hub());
        assert!(StationCode::parse("PSL").unwrap().is_loop_hub());
        assert!(!StationCode::parse("TKL").unwrap().is_loop_hub());
    }

    #[test]
    fn display_and_debug() {
        let code = StationCode::parse("PSL").unwrap();
        assert_eq!(format!("{}", code), "PSL");
        assert_eq!(format!("{:?}", code), "StationCode(PSL)");
    }

    #[test]
    fn serde_validates() {
        let code: StationCode = serde_json::from_str("\"HKI\"").unwrap();
        assert_eq!(code.as_str(), "HKI");
        assert!(serde_json::from_str::<StationCode>("\"hki\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"HKI\"");
    }
}
