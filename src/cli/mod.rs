//! Command-line interface wiring for the `zos-ccsid` binary.
//!
//! This module owns the clap definitions and hands execution to the
//! `info` and `convert` submodules.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use log::{LevelFilter, debug};
use zos_ccsid::{CodePageService, EncodingName, ServiceConfig};

pub mod common;
pub mod convert;
pub mod info;
pub mod utils;

use common::BackendArg;
use utils::{parse_chunk_size, parse_encoding};

/// Parsed CLI entrypoint for the `zos-ccsid` binary.
#[derive(Parser, Debug)]
#[command(
    name = "zos-ccsid",
    version,
    about = "Detect z/OS file tags and convert ISO8859-1 data to IBM-1047",
    group(ArgGroup::new("transcode").args(["from", "to", "chunk_size"]).multiple(true))
)]
pub struct Cli {
    /// Input file or named pipe (the output file when using --stdin).
    pub input: Option<PathBuf>,
    /// Output file.
    pub output: Option<PathBuf>,
    /// Show the file tag instead of converting.
    #[arg(long, conflicts_with = "transcode")]
    pub info: bool,
    /// Read from standard input.
    #[arg(long)]
    pub stdin: bool,
    /// Trace every tag query and set attempt.
    #[arg(short, long)]
    pub verbose: bool,
    /// Source encoding, overriding the input's tag.
    #[arg(long, value_parser = parse_encoding)]
    pub from: Option<EncodingName>,
    /// Target encoding.
    #[arg(long, value_parser = parse_encoding, default_value = "IBM-1047")]
    pub to: EncodingName,
    /// Tagging mechanism.
    #[arg(long, value_enum, env = "ZOS_CCSID_BACKEND", default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,
    /// Bytes per read when streaming pipes and stdin.
    #[arg(long, value_parser = parse_chunk_size, default_value_t = zos_ccsid::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            verbose: self.verbose,
            backend: self.backend.into(),
            chunk_size: self.chunk_size,
            ..ServiceConfig::default()
        }
    }
}

/// Execute the requested action.
pub fn run(cli: Cli) -> Result<()> {
    let service = CodePageService::new(cli.service_config());
    debug!(
        "tagging backend: {} (requested {}), chunk size {}",
        service.backend_name(),
        service.config().backend,
        service.config().chunk_size
    );
    if cli.info {
        info::handle(&service, &cli)
    } else {
        convert::handle(&service, &cli)
    }
}

/// Install the stderr logger. `RUST_LOG` takes precedence over `--verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}
