use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{TagBackend, TagError};
use crate::codepage::{Ccsid, TagInfo};

/// How [`MemoryBackend::set`] reacts to a tag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetBehavior {
    /// Record the new tag.
    #[default]
    Apply,
    /// Fail the call and leave the tag alone.
    Refuse,
    /// Report success without changing anything.
    Ignore,
}

/// Tag table kept in process memory.
///
/// Paths that exist on disk but were never tagged read back as untagged;
/// paths that do not exist fail the query like the platform call would.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tags: Mutex<HashMap<PathBuf, TagInfo>>,
    behavior: SetBehavior,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: SetBehavior) -> Self {
        Self {
            tags: Mutex::new(HashMap::new()),
            behavior,
        }
    }

    /// Pre-tag `path` without going through `set`.
    pub fn tag<P: AsRef<Path>>(&self, path: P, ccsid: Ccsid, text_flag: bool) {
        self.lock()
            .insert(path.as_ref().to_path_buf(), TagInfo::new(ccsid, text_flag));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, TagInfo>> {
        self.tags.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TagBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn query(&self, path: &Path) -> Result<TagInfo, TagError> {
        if let Some(info) = self.lock().get(path) {
            return Ok(info.clone());
        }
        if path.exists() {
            return Ok(TagInfo::untagged());
        }
        Err(TagError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )))
    }

    fn set(&self, path: &Path, ccsid: Ccsid, text_flag: bool) -> Result<(), TagError> {
        match self.behavior {
            SetBehavior::Apply => {
                if !path.exists() {
                    return Err(TagError::Io(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{} does not exist", path.display()),
                    )));
                }
                self.tag(path, ccsid, text_flag);
                Ok(())
            }
            SetBehavior::Refuse => Err(TagError::Unsupported(format!(
                "tagging refused for {}",
                path.display()
            ))),
            SetBehavior::Ignore => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn existing_untouched_file_reads_untagged() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let backend = MemoryBackend::new();
        assert_eq!(backend.query(file.path()).unwrap(), TagInfo::untagged());
    }

    #[test]
    fn missing_path_fails() {
        let backend = MemoryBackend::new();
        assert!(backend.query(Path::new("/no/such/path")).is_err());
    }

    #[test]
    fn refuse_and_ignore_keep_previous_tag() {
        let file = tempfile::NamedTempFile::new().unwrap();
        for behavior in [SetBehavior::Refuse, SetBehavior::Ignore] {
            let backend = MemoryBackend::with_behavior(behavior);
            backend.tag(file.path(), Ccsid::ISO8859_1, true);
            let outcome = backend.set(file.path(), Ccsid::IBM1047, true);
            assert_eq!(outcome.is_ok(), behavior == SetBehavior::Ignore);
            assert_eq!(backend.query(file.path()).unwrap().ccsid, Ccsid::ISO8859_1);
        }
    }
}
