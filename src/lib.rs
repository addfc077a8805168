//! Core library for z/OS file tag (CCSID) detection, tagging and
//! ISO8859-1 to IBM-1047 conversion.

pub mod backend;
mod charset;
mod codepage;
pub mod control;
mod service;
mod tags;

pub use backend::{BackendKind, TagBackend, TagError, select_backend};
pub use charset::{CodePage, Charset, EncodeError, Recoded, Recoder, convert_bytes, decode_to_string};
pub use codepage::{Ccsid, EncodingName, EncodingParseError, TagInfo};
pub use service::{
    CodePageService, ConversionResult, DEFAULT_CHUNK_SIZE, InputKind, STDIN_PATH, ServiceConfig,
};
pub use tags::{TagReader, TagWriter};
