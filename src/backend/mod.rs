//! Platform mechanisms that query and set file tags.
//!
//! Exactly one [`TagBackend`] is chosen when a service is constructed; call
//! sites never branch on which mechanism is in use.

use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codepage::{Ccsid, TagInfo};
use crate::control::CodecError;

mod chtag;
mod memory;
#[cfg(target_os = "zos")]
mod native;

pub use chtag::{ChtagBackend, parse_ls_tag_line};
pub use memory::{MemoryBackend, SetBehavior};
#[cfg(target_os = "zos")]
pub use native::ControlCallBackend;

#[derive(Debug, Error)]
pub enum TagError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("could not parse tag output: {0}")]
    Parse(String),
    #[error("{operation} control call failed: {source}")]
    ControlCall {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("{0}")]
    Unsupported(String),
}

/// Query/set capability for file tags.
pub trait TagBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read the tag currently attached to `path`.
    fn query(&self, path: &Path) -> Result<TagInfo, TagError>;

    /// Ask the platform to tag `path`. `Ok` does not prove the tag changed.
    fn set(&self, path: &Path, ccsid: Ccsid, text_flag: bool) -> Result<(), TagError>;
}

/// Backend used on hosts without any tagging mechanism.
#[derive(Debug, Clone)]
pub struct UnsupportedBackend {
    reason: String,
}

impl UnsupportedBackend {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TagBackend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn query(&self, _path: &Path) -> Result<TagInfo, TagError> {
        Err(TagError::Unsupported(self.reason.clone()))
    }

    fn set(&self, _path: &Path, _ccsid: Ccsid, _text_flag: bool) -> Result<(), TagError> {
        Err(TagError::Unsupported(self.reason.clone()))
    }
}

/// Which tagging mechanism a service should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Native control calls on z/OS, else `chtag` if found on `PATH`.
    #[default]
    Auto,
    Native,
    Chtag,
    None,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Auto => write!(f, "auto"),
            BackendKind::Native => write!(f, "native"),
            BackendKind::Chtag => write!(f, "chtag"),
            BackendKind::None => write!(f, "none"),
        }
    }
}

/// Resolve `kind` to a concrete backend, probing the host once.
pub fn select_backend(kind: BackendKind, ls: &Path, chtag: &Path) -> Box<dyn TagBackend> {
    match kind {
        BackendKind::Native => native_backend(),
        BackendKind::Chtag => Box::new(ChtagBackend::new(ls, chtag)),
        BackendKind::None => Box::new(UnsupportedBackend::new("file tagging is disabled")),
        BackendKind::Auto => {
            if cfg!(target_os = "zos") {
                native_backend()
            } else if find_program(chtag).is_some() {
                Box::new(ChtagBackend::new(ls, chtag))
            } else {
                Box::new(UnsupportedBackend::new(
                    "no file tagging mechanism available on this host",
                ))
            }
        }
    }
}

#[cfg(target_os = "zos")]
fn native_backend() -> Box<dyn TagBackend> {
    Box::new(ControlCallBackend::new())
}

#[cfg(not(target_os = "zos"))]
fn native_backend() -> Box<dyn TagBackend> {
    Box::new(UnsupportedBackend::new(
        "native file tagging is only available on z/OS",
    ))
}

/// Locate an executable, searching `PATH` when `program` has no directory part.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
