//! Conversion of files, pipes and stdin (`zos-ccsid <input> <output>`).

use std::io;

use anyhow::{Result, anyhow, bail};
use zos_ccsid::{CodePageService, ConversionResult, EncodingName};

use crate::cli::Cli;
use crate::cli::utils::print_json;

/// Run a conversion described by the positional arguments.
pub fn handle(service: &CodePageService, cli: &Cli) -> Result<()> {
    if cli.stdin {
        return from_stdin(service, cli);
    }
    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        bail!("Both input and output files required");
    };
    let result = service.convert_input(input, output, cli.from, cli.to);
    finish(&result, cli.json)?;
    if !cli.json {
        println!(
            "Conversion successful: {} bytes -> {} bytes",
            result.bytes_read, result.bytes_written
        );
    }
    Ok(())
}

fn from_stdin(service: &CodePageService, cli: &Cli) -> Result<()> {
    // The single positional names the output file in this mode.
    let output = cli
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("Output file required with --stdin"))?;
    if cli.output.is_some() {
        bail!("--stdin takes a single output file");
    }
    if cli.to != EncodingName::Ibm1047 {
        bail!("--stdin only converts to {}", EncodingName::Ibm1047);
    }
    let source = cli.from.unwrap_or(EncodingName::Iso8859_1);
    let mut stdin = io::stdin().lock();
    let result = service.convert_reader_to_file(&mut stdin, output, source);
    finish(&result, cli.json)?;
    if !cli.json {
        println!(
            "Converted {} bytes from stdin to {}",
            result.bytes_read,
            output.display()
        );
    }
    Ok(())
}

fn finish(result: &ConversionResult, json: bool) -> Result<()> {
    if json {
        print_json(result)?;
    }
    if !result.success {
        let message = result
            .error_message
            .clone()
            .unwrap_or_else(|| "conversion failed".to_string());
        return Err(anyhow!(message));
    }
    Ok(())
}
