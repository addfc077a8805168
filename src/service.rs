//! Code page detection and conversion for files, named pipes and streams.
//!
//! Every conversion runs `detect -> convert | copy -> tag output`. Failures
//! at any step are captured into a [`ConversionResult`] instead of being
//! returned as errors.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::backend::{BackendKind, TagBackend, select_backend};
use crate::charset::{CodePage, Recoder, convert_bytes};
use crate::codepage::{Ccsid, EncodingName, TagInfo};
use crate::tags::{TagReader, TagWriter};

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Special path queried for the tag of the process's standard input.
pub const STDIN_PATH: &str = "/dev/stdin";

/// Settings fixed when a [`CodePageService`] is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Emit per-chunk trace output during stream conversions.
    pub verbose: bool,
    pub backend: BackendKind,
    pub chunk_size: usize,
    pub ls_program: PathBuf,
    pub chtag_program: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            backend: BackendKind::Auto,
            chunk_size: DEFAULT_CHUNK_SIZE,
            ls_program: PathBuf::from("ls"),
            chtag_program: PathBuf::from("chtag"),
        }
    }
}

/// Where conversion input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    File,
    Pipe,
    Stream,
    #[default]
    Unknown,
}

/// Outcome of one conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub input_kind: InputKind,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub encoding_detected: Option<EncodingName>,
    pub target_encoding: Option<EncodingName>,
    pub conversion_needed: bool,
    /// Characters or chunks that could not be converted cleanly.
    pub errors: usize,
    pub chunks_processed: usize,
    pub output_tagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ConversionResult {
    fn failed(input_kind: InputKind, err: &anyhow::Error) -> Self {
        Self {
            success: false,
            input_kind,
            error_message: Some(format!("{err:#}")),
            ..Self::default()
        }
    }
}

/// Detects, converts and tags code pages through one tagging backend.
pub struct CodePageService {
    config: ServiceConfig,
    backend: Box<dyn TagBackend>,
}

impl CodePageService {
    /// Build a service, resolving `config.backend` against the host.
    pub fn new(config: ServiceConfig) -> Self {
        let backend = select_backend(config.backend, &config.ls_program, &config.chtag_program);
        Self { config, backend }
    }

    /// Build a service around an explicit backend.
    pub fn with_backend(config: ServiceConfig, backend: Box<dyn TagBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn reader(&self) -> TagReader<'_> {
        TagReader::new(self.backend.as_ref())
    }

    pub fn writer(&self) -> TagWriter<'_> {
        TagWriter::new(self.backend.as_ref())
    }

    /// Encoding name of `path`; untagged on any failure.
    pub fn read_tag<P: AsRef<Path>>(&self, path: P) -> EncodingName {
        self.reader().read_tag(path.as_ref())
    }

    pub fn tag_info<P: AsRef<Path>>(&self, path: P) -> Option<TagInfo> {
        self.reader().tag_info(path.as_ref())
    }

    /// Identifier of `path` (819, 1047 or 0).
    pub fn ccsid<P: AsRef<Path>>(&self, path: P) -> Ccsid {
        self.read_tag(path).ccsid()
    }

    pub fn is_ascii<P: AsRef<Path>>(&self, path: P) -> bool {
        self.ccsid(path) == Ccsid::ISO8859_1
    }

    pub fn is_ebcdic<P: AsRef<Path>>(&self, path: P) -> bool {
        self.ccsid(path) == Ccsid::IBM1047
    }

    pub fn is_untagged<P: AsRef<Path>>(&self, path: P) -> bool {
        self.ccsid(path) == Ccsid::UNTAGGED
    }

    pub fn write_tag<P: AsRef<Path>>(&self, path: P, ccsid: Ccsid, text_flag: bool) -> bool {
        self.writer().write_tag(path.as_ref(), ccsid, text_flag)
    }

    pub fn convert_bytes(&self, data: &[u8], source: EncodingName, target: EncodingName) -> Vec<u8> {
        convert_bytes(data, source.charset(), target.charset())
    }

    pub fn convert_to_ebcdic(&self, data: &[u8], source: EncodingName) -> Vec<u8> {
        self.convert_bytes(data, source, EncodingName::Ibm1047)
    }

    pub fn convert_to_ascii(&self, data: &[u8], source: EncodingName) -> Vec<u8> {
        self.convert_bytes(data, source, EncodingName::Iso8859_1)
    }

    /// Convert a byte stream to IBM-1047 chunk by chunk using the configured chunk size.
    pub fn convert_stream<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        source: EncodingName,
    ) -> ConversionResult {
        self.convert_stream_chunked(input, output, source, self.config.chunk_size)
    }

    pub fn convert_stream_chunked<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        source: EncodingName,
        chunk_size: usize,
    ) -> ConversionResult {
        self.recode_stream(input, output, source, EncodingName::Ibm1047, chunk_size)
            .unwrap_or_else(|err| {
                warn!("stream conversion failed: {err:#}");
                ConversionResult::failed(InputKind::Stream, &err)
            })
    }

    /// Convert a regular file to IBM-1047 based on its tag and tag the output.
    ///
    /// ISO8859-1 input is transcoded. IBM-1047 and untagged input are copied
    /// byte for byte; untagged data is assumed to already be EBCDIC.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> ConversionResult {
        self.convert_file_with(input, output, None, EncodingName::Ibm1047)
    }

    /// Convert a regular file with an optional explicit source and any target.
    ///
    /// Targets other than IBM-1047 are a plain whole-file transcode and the
    /// output is not tagged.
    pub fn convert_file_with<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        source: Option<EncodingName>,
        target: EncodingName,
    ) -> ConversionResult {
        let (input, output) = (input.as_ref(), output.as_ref());
        let outcome = if target == EncodingName::Ibm1047 {
            self.convert_file_to_ebcdic(input, output, source)
        } else {
            self.transcode_file(input, output, source, target)
        };
        outcome.unwrap_or_else(|err| {
            warn!("conversion of {} failed: {err:#}", input.display());
            ConversionResult::failed(InputKind::File, &err)
        })
    }

    /// Convert a file or a named pipe, picking the strategy from the input's type.
    ///
    /// Pipes carry no reliable tag, so `source` should be given for them; it
    /// defaults to ISO8859-1.
    pub fn convert_input<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        source: Option<EncodingName>,
        target: EncodingName,
    ) -> ConversionResult {
        let (input, output) = (input.as_ref(), output.as_ref());
        let metadata = match fs::metadata(input)
            .with_context(|| format!("failed to stat {}", input.display()))
        {
            Ok(metadata) => metadata,
            Err(err) => return ConversionResult::failed(InputKind::Unknown, &err),
        };
        if !is_fifo(&metadata) {
            let mut result = self.convert_file_with(input, output, source, target);
            result.input_kind = InputKind::File;
            return result;
        }

        let source = source.unwrap_or_else(|| {
            warn!(
                "no source encoding given for pipe {}, assuming ISO8859-1",
                input.display()
            );
            EncodingName::Iso8859_1
        });
        let mut result = self
            .convert_pipe(input, output, source, target)
            .unwrap_or_else(|err| {
                warn!("conversion of pipe {} failed: {err:#}", input.display());
                ConversionResult::failed(InputKind::Pipe, &err)
            });
        result.input_kind = InputKind::Pipe;
        result
    }

    /// Stream `input` (for example stdin) into the file `output` as IBM-1047
    /// and tag the file.
    pub fn convert_reader_to_file<R: Read, Q: AsRef<Path>>(
        &self,
        input: &mut R,
        output: Q,
        source: EncodingName,
    ) -> ConversionResult {
        let output = output.as_ref();
        let mut file = match File::create(output)
            .with_context(|| format!("failed to create {}", output.display()))
        {
            Ok(file) => file,
            Err(err) => return ConversionResult::failed(InputKind::Stream, &err),
        };
        let mut result = self.convert_stream(input, &mut file, source);
        drop(file);
        if result.success {
            result.output_tagged = self.write_tag(output, Ccsid::IBM1047, true);
        }
        result
    }

    fn convert_file_to_ebcdic(
        &self,
        input: &Path,
        output: &Path,
        source: Option<EncodingName>,
    ) -> Result<ConversionResult> {
        let encoding = match source {
            Some(explicit) => explicit,
            None => self.read_tag(input),
        };
        info!("input file: {} (detected {})", input.display(), encoding);

        let mut result = ConversionResult {
            input_kind: InputKind::File,
            encoding_detected: Some(encoding),
            target_encoding: Some(EncodingName::Ibm1047),
            ..ConversionResult::default()
        };

        if encoding == EncodingName::Iso8859_1 {
            info!("converting from ISO8859-1 to IBM-1047");
            let data =
                fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
            let recoded =
                Recoder::new(encoding.charset(), EncodingName::Ibm1047.charset()).recode(&data);
            fs::write(output, &recoded.bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            result.conversion_needed = true;
            result.bytes_read = data.len() as u64;
            result.bytes_written = recoded.bytes.len() as u64;
            result.errors = recoded.substitutions;
        } else {
            info!("input is {encoding}, copying without conversion");
            let copied = copy_file(input, output)?;
            result.bytes_read = copied;
            result.bytes_written = copied;
        }

        if matches!(encoding, EncodingName::Iso8859_1 | EncodingName::Untagged) {
            result.output_tagged = self.write_tag(output, Ccsid::IBM1047, true);
            if result.output_tagged {
                info!("tagged {} as IBM-1047", output.display());
            } else if encoding == EncodingName::Iso8859_1 {
                warn!("could not tag {} as IBM-1047", output.display());
            }
        }

        result.success = true;
        info!(
            "conversion complete: {} bytes read, {} bytes written",
            result.bytes_read, result.bytes_written
        );
        Ok(result)
    }

    fn transcode_file(
        &self,
        input: &Path,
        output: &Path,
        source: Option<EncodingName>,
        target: EncodingName,
    ) -> Result<ConversionResult> {
        let source = match source {
            Some(explicit) => explicit,
            None => self.read_tag(input),
        };
        info!("converting {} from {} to {}", input.display(), source, target);
        let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
        let recoded = Recoder::new(source.charset(), target.charset()).recode(&data);
        fs::write(output, &recoded.bytes)
            .with_context(|| format!("failed to write {}", output.display()))?;
        Ok(ConversionResult {
            success: true,
            input_kind: InputKind::File,
            bytes_read: data.len() as u64,
            bytes_written: recoded.bytes.len() as u64,
            encoding_detected: Some(source),
            target_encoding: Some(target),
            conversion_needed: source.charset() != target.charset(),
            errors: recoded.substitutions,
            ..ConversionResult::default()
        })
    }

    fn convert_pipe(
        &self,
        input: &Path,
        output: &Path,
        source: EncodingName,
        target: EncodingName,
    ) -> Result<ConversionResult> {
        // Opening the read end blocks until a writer connects.
        let mut pipe =
            File::open(input).with_context(|| format!("failed to open pipe {}", input.display()))?;
        let mut file = File::create(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        let mut result =
            self.recode_stream(&mut pipe, &mut file, source, target, self.config.chunk_size)?;
        drop(file);
        if target == EncodingName::Ibm1047 {
            // Tagging may fail here without failing the conversion.
            result.output_tagged = self.write_tag(output, Ccsid::IBM1047, true);
        }
        Ok(result)
    }

    fn recode_stream<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        source: EncodingName,
        target: EncodingName,
        chunk_size: usize,
    ) -> Result<ConversionResult> {
        if chunk_size == 0 {
            return Err(anyhow!("chunk size must be greater than zero"));
        }
        let recoder = Recoder::new(source.charset(), target.charset());
        let passthrough = recoder.source() == recoder.target();
        info!(
            "converting stream from {} to {}",
            recoder.source().name(),
            recoder.target().name()
        );

        let mut result = ConversionResult {
            input_kind: InputKind::Stream,
            encoding_detected: Some(source),
            target_encoding: Some(target),
            conversion_needed: !passthrough,
            ..ConversionResult::default()
        };
        let mut buffer = vec![0u8; chunk_size];
        loop {
            let read = match input.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err).context("failed to read input stream"),
            };
            result.bytes_read += read as u64;
            result.chunks_processed += 1;

            let chunk = &buffer[..read];
            if passthrough {
                output
                    .write_all(chunk)
                    .context("failed to write output stream")?;
                result.bytes_written += read as u64;
            } else {
                let recoded = recoder.recode(chunk);
                if recoded.substitutions > 0 {
                    warn!(
                        "chunk {}: {} characters replaced",
                        result.chunks_processed, recoded.substitutions
                    );
                    result.errors += recoded.substitutions;
                }
                output
                    .write_all(&recoded.bytes)
                    .context("failed to write output stream")?;
                result.bytes_written += recoded.bytes.len() as u64;
            }
            if self.config.verbose {
                debug!("chunk {}: {} bytes", result.chunks_processed, read);
            }
        }
        output.flush().context("failed to flush output stream")?;

        result.success = true;
        info!(
            "stream conversion complete: {} bytes read, {} bytes written, {} chunks processed",
            result.bytes_read, result.bytes_written, result.chunks_processed
        );
        Ok(result)
    }
}

/// Byte-for-byte copy. The input is read in full before the output is
/// opened, so `input` and `output` may name the same file.
fn copy_file(input: &Path, output: &Path) -> Result<u64> {
    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    fs::write(output, &data).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(data.len() as u64)
}

#[cfg(unix)]
fn is_fifo(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    metadata.file_type().is_fifo()
}

#[cfg(not(unix))]
fn is_fifo(_metadata: &fs::Metadata) -> bool {
    false
}
