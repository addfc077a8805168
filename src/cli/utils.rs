//! Convenience helpers shared across command handlers.

use anyhow::{Context, Result};
use serde::Serialize;
use zos_ccsid::EncodingName;

/// Parse an encoding name or CCSID given on the command line.
pub fn parse_encoding(value: &str) -> Result<EncodingName, String> {
    value.parse::<EncodingName>().map_err(|err| err.to_string())
}

/// Parse a positive chunk size.
pub fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if size == 0 {
        return Err("chunk size must be greater than zero".to_string());
    }
    Ok(size)
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chunk_size_must_be_positive() {
        assert_eq!(parse_chunk_size("4096"), Ok(4096));
        assert!(parse_chunk_size("0").is_err());
        assert!(parse_chunk_size("-1").is_err());
        assert!(parse_chunk_size("lots").is_err());
    }

    #[test]
    fn unknown_encoding_is_reported() {
        assert_eq!(parse_encoding("ibm-1047"), Ok(EncodingName::Ibm1047));
        assert!(parse_encoding("UTF-16").unwrap_err().contains("UTF-16"));
    }
}
