//! Byte-level codecs for the z/OS control structures used by the tagging
//! `fcntl` commands.
//!
//! z/OS is big-endian and the layouts below are fixed by the platform
//! headers, so every structure is written field by field into an array of
//! known size instead of relying on `#[repr(C)]` layout.

use thiserror::Error;

/// Version of the layouts implemented here.
pub const LAYOUT_VERSION: u8 = 1;

/// `fcntl` command: set file tag information.
pub const F_SETTAG: i32 = 12;
/// `fcntl` command: control or query file conversion.
pub const F_CONTROL_CVT: i32 = 13;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("{structure} must be {expected} bytes, got {actual}")]
    Length {
        structure: &'static str,
        expected: usize,
        actual: usize,
    },
}

fn check_len(structure: &'static str, bytes: &[u8], expected: usize) -> Result<(), CodecError> {
    if bytes.len() != expected {
        return Err(CodecError::Length {
            structure,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn be_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Commands accepted in [`ConversionControl::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionCommand {
    SetOff,
    SetOn,
    SetAutoOn,
    Query,
    Other(i32),
}

impl ConversionCommand {
    pub fn code(self) -> i32 {
        match self {
            ConversionCommand::SetOff => 0,
            ConversionCommand::SetOn => 1,
            ConversionCommand::SetAutoOn => 2,
            ConversionCommand::Query => 3,
            ConversionCommand::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ConversionCommand::SetOff,
            1 => ConversionCommand::SetOn,
            2 => ConversionCommand::SetAutoOn,
            3 => ConversionCommand::Query,
            other => ConversionCommand::Other(other),
        }
    }
}

/// `struct f_cnvrt`: `int cvtcmd; short pccsid; short fccsid;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionControl {
    pub command: ConversionCommand,
    pub program_ccsid: i16,
    pub file_ccsid: i16,
}

impl ConversionControl {
    pub const SIZE: usize = 8;

    /// Request block for `F_CONTROL_CVT` that only queries the file CCSID.
    pub fn query() -> Self {
        Self {
            command: ConversionCommand::Query,
            program_ccsid: 0,
            file_ccsid: 0,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.command.code().to_be_bytes());
        out[4..6].copy_from_slice(&self.program_ccsid.to_be_bytes());
        out[6..8].copy_from_slice(&self.file_ccsid.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        check_len("f_cnvrt", bytes, Self::SIZE)?;
        Ok(Self {
            command: ConversionCommand::from_code(be_i32(bytes, 0)),
            program_ccsid: be_u16(bytes, 4) as i16,
            file_ccsid: be_u16(bytes, 6) as i16,
        })
    }

    /// File CCSID as the unsigned identifier the tag actually stores.
    pub fn file_ccsid_unsigned(&self) -> u16 {
        self.file_ccsid as u16
    }
}

/// Tag portion of `attrib_t` passed to `F_SETTAG`.
///
/// ```text
/// int            att_filetagchg;
/// int            att_rsvd1;
/// unsigned short att_txtflag;
/// unsigned short att_ccsid;
/// int            att_rsvd2[2];
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagAttributes {
    pub tag_change: bool,
    pub text_flag: bool,
    pub ccsid: u16,
}

impl TagAttributes {
    pub const SIZE: usize = 20;

    pub fn set(ccsid: u16, text_flag: bool) -> Self {
        Self {
            tag_change: true,
            text_flag,
            ccsid,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&i32::from(self.tag_change).to_be_bytes());
        // att_rsvd1 and att_rsvd2 stay zero
        out[8..10].copy_from_slice(&u16::from(self.text_flag).to_be_bytes());
        out[10..12].copy_from_slice(&self.ccsid.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        check_len("attrib_t", bytes, Self::SIZE)?;
        Ok(Self {
            tag_change: be_i32(bytes, 0) != 0,
            text_flag: be_u16(bytes, 8) != 0,
            ccsid: be_u16(bytes, 10),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_block_layout() {
        let bytes = ConversionControl::query().encode();
        assert_eq!(bytes, [0, 0, 0, 3, 0, 0, 0, 0]);
    }

    #[test]
    fn decodes_query_reply() {
        // cvtcmd=3, pccsid=1047, fccsid=819
        let reply = [0, 0, 0, 3, 0x04, 0x17, 0x03, 0x33];
        let decoded = ConversionControl::decode(&reply).unwrap();
        assert_eq!(decoded.command, ConversionCommand::Query);
        assert_eq!(decoded.program_ccsid, 1047);
        assert_eq!(decoded.file_ccsid_unsigned(), 819);
    }

    #[test]
    fn high_ccsid_survives_signed_field() {
        let control = ConversionControl {
            command: ConversionCommand::Query,
            program_ccsid: 0,
            file_ccsid: 65535u16 as i16,
        };
        let decoded = ConversionControl::decode(&control.encode()).unwrap();
        assert_eq!(decoded.file_ccsid_unsigned(), 65535);
    }

    #[test]
    fn settag_layout_matches_platform_header() {
        let bytes = TagAttributes::set(1047, true).encode();
        assert_eq!(
            bytes,
            [
                0, 0, 0, 1, // att_filetagchg
                0, 0, 0, 0, // att_rsvd1
                0, 1, // att_txtflag
                0x04, 0x17, // att_ccsid
                0, 0, 0, 0, 0, 0, 0, 0, // att_rsvd2
            ]
        );
        assert_eq!(
            TagAttributes::decode(&bytes).unwrap(),
            TagAttributes::set(1047, true)
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ConversionControl::decode(&[0; 6]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Length {
                structure: "f_cnvrt",
                expected: 8,
                actual: 6
            }
        );
        assert!(TagAttributes::decode(&[0; 19]).is_err());
    }
}
