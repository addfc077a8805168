//! Coded character set identifiers and the names the tool reports for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::charset::Charset;

/// Coded Character Set Identifier attached to a z/OS file tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ccsid(pub u16);

impl Ccsid {
    pub const UNTAGGED: Ccsid = Ccsid(0);
    pub const ISO8859_1: Ccsid = Ccsid(819);
    pub const IBM1047: Ccsid = Ccsid(1047);

    /// Name for the three identifiers this tool understands, `None` for anything else.
    pub fn encoding_name(self) -> Option<EncodingName> {
        match self {
            Ccsid::ISO8859_1 => Some(EncodingName::Iso8859_1),
            Ccsid::IBM1047 => Some(EncodingName::Ibm1047),
            Ccsid::UNTAGGED => Some(EncodingName::Untagged),
            _ => None,
        }
    }

    /// Human readable label; unknown identifiers render as `CCSID-<n>`.
    pub fn label(self) -> String {
        match self.encoding_name() {
            Some(name) => name.to_string(),
            None => format!("CCSID-{}", self.0),
        }
    }
}

impl fmt::Display for Ccsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Ccsid {
    fn from(value: u16) -> Self {
        Ccsid(value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingParseError {
    #[error("unsupported encoding '{0}' (expected ISO8859-1, IBM-1047 or untagged)")]
    Unknown(String),
}

/// Display form of the named identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingName {
    #[serde(rename = "ISO8859-1")]
    Iso8859_1,
    #[serde(rename = "IBM-1047")]
    Ibm1047,
    #[serde(rename = "untagged")]
    Untagged,
}

impl EncodingName {
    pub fn ccsid(self) -> Ccsid {
        match self {
            EncodingName::Iso8859_1 => Ccsid::ISO8859_1,
            EncodingName::Ibm1047 => Ccsid::IBM1047,
            EncodingName::Untagged => Ccsid::UNTAGGED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncodingName::Iso8859_1 => "ISO8859-1",
            EncodingName::Ibm1047 => "IBM-1047",
            EncodingName::Untagged => "untagged",
        }
    }

    /// Character set used when transcoding data carrying this tag.
    ///
    /// Untagged data is assumed to already be EBCDIC and is never re-encoded
    /// from ASCII.
    pub fn charset(self) -> Charset {
        match self {
            EncodingName::Iso8859_1 => Charset::Iso8859_1,
            EncodingName::Ibm1047 | EncodingName::Untagged => Charset::Ibm1047,
        }
    }
}

impl fmt::Display for EncodingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingName {
    type Err = EncodingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "ISO8859-1" | "ISO-8859-1" | "ISO8859_1" | "LATIN1" | "819" => {
                Ok(EncodingName::Iso8859_1)
            }
            "IBM-1047" | "IBM1047" | "CP1047" | "1047" => Ok(EncodingName::Ibm1047),
            "UNTAGGED" | "0" => Ok(EncodingName::Untagged),
            _ => Err(EncodingParseError::Unknown(s.to_string())),
        }
    }
}

/// Snapshot of a path's tag as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub ccsid: Ccsid,
    pub text_flag: bool,
    pub encoding_name: String,
}

impl TagInfo {
    pub fn new(ccsid: Ccsid, text_flag: bool) -> Self {
        Self {
            ccsid,
            text_flag,
            encoding_name: ccsid.label(),
        }
    }

    pub fn untagged() -> Self {
        Self::new(Ccsid::UNTAGGED, false)
    }

    /// Named encoding, `None` when the identifier is not one of the three known values.
    pub fn encoding(&self) -> Option<EncodingName> {
        self.ccsid.encoding_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn named_identifiers_map_both_ways() {
        for name in [
            EncodingName::Iso8859_1,
            EncodingName::Ibm1047,
            EncodingName::Untagged,
        ] {
            assert_eq!(name.ccsid().encoding_name(), Some(name));
        }
    }

    #[test]
    fn unknown_identifier_is_not_coerced() {
        let ccsid = Ccsid(1208);
        assert_eq!(ccsid.encoding_name(), None);
        assert_eq!(ccsid.label(), "CCSID-1208");
        let info = TagInfo::new(ccsid, true);
        assert_eq!(info.encoding(), None);
        assert_eq!(info.encoding_name, "CCSID-1208");
    }

    #[test]
    fn untagged_is_treated_as_ebcdic_for_conversion() {
        assert_eq!(EncodingName::Untagged.charset(), Charset::Ibm1047);
        assert_eq!(EncodingName::Iso8859_1.charset(), Charset::Iso8859_1);
    }

    #[test]
    fn parses_display_names_and_aliases() {
        assert_eq!("ISO8859-1".parse(), Ok(EncodingName::Iso8859_1));
        assert_eq!("latin1".parse(), Ok(EncodingName::Iso8859_1));
        assert_eq!("ibm-1047".parse(), Ok(EncodingName::Ibm1047));
        assert_eq!("CP1047".parse(), Ok(EncodingName::Ibm1047));
        assert_eq!("Untagged".parse(), Ok(EncodingName::Untagged));
        assert!("UTF-8".parse::<EncodingName>().is_err());
    }

    #[test]
    fn encoding_name_serializes_as_display_string() {
        let json = serde_json::to_string(&EncodingName::Ibm1047).unwrap();
        assert_eq!(json, "\"IBM-1047\"");
        let info = TagInfo::new(Ccsid::ISO8859_1, true);
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(
            json,
            r#"{"ccsid":819,"text_flag":true,"encoding_name":"ISO8859-1"}"#
        );
    }
}
