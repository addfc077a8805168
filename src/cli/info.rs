//! Tag inspection (`zos-ccsid --info ...`).

use std::path::Path;

use anyhow::{Result, anyhow};
use serde::Serialize;
use zos_ccsid::{Ccsid, CodePageService, EncodingName, STDIN_PATH, TagInfo};

use crate::cli::Cli;
use crate::cli::utils::print_json;

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    tag: &'a TagInfo,
}

#[derive(Serialize)]
struct StdinReport {
    source: &'static str,
    ccsid: Ccsid,
    encoding: EncodingName,
}

/// Print the tag of the input file, or of standard input with `--stdin`.
pub fn handle(service: &CodePageService, cli: &Cli) -> Result<()> {
    if cli.stdin {
        return stdin(service, cli.json);
    }
    let path = cli
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("Input file required for --info"))?;
    file(service, path, cli.json)
}

fn file(service: &CodePageService, path: &Path, json: bool) -> Result<()> {
    let tag = service
        .tag_info(path)
        .ok_or_else(|| anyhow!("Could not get file tag info for {}", path.display()))?;
    if json {
        return print_json(&FileReport { file: path, tag: &tag });
    }
    println!("File: {}", path.display());
    println!("  CCSID: {}", tag.ccsid);
    println!("  Encoding: {}", tag.encoding_name);
    println!("  Text: {}", tag.text_flag);
    Ok(())
}

fn stdin(service: &CodePageService, json: bool) -> Result<()> {
    let encoding = service.read_tag(STDIN_PATH);
    if json {
        return print_json(&StdinReport {
            source: "stdin",
            ccsid: encoding.ccsid(),
            encoding,
        });
    }
    println!("Source: stdin");
    println!("  CCSID: {}", encoding.ccsid());
    println!("  Encoding: {}", encoding);
    Ok(())
}
