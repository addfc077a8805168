//! Reading and verified writing of file tags on top of a [`TagBackend`].

use std::path::Path;

use log::{debug, warn};

use crate::backend::TagBackend;
use crate::codepage::{Ccsid, EncodingName, TagInfo};

/// Read-only view of file tags.
#[derive(Clone, Copy)]
pub struct TagReader<'a> {
    backend: &'a dyn TagBackend,
}

impl<'a> TagReader<'a> {
    pub fn new(backend: &'a dyn TagBackend) -> Self {
        Self { backend }
    }

    /// Encoding of `path`, or [`EncodingName::Untagged`] when the query fails
    /// or the identifier is not one of the named ones.
    pub fn read_tag(&self, path: &Path) -> EncodingName {
        match self.backend.query(path) {
            Ok(info) => {
                let name = info.encoding().unwrap_or(EncodingName::Untagged);
                debug!(
                    "{} tag query for {}: CCSID={}, txtflag={}, encoding={}",
                    self.backend.name(),
                    path.display(),
                    info.ccsid,
                    info.text_flag,
                    name
                );
                name
            }
            Err(err) => {
                debug!(
                    "{} tag query failed for {}: {}",
                    self.backend.name(),
                    path.display(),
                    err
                );
                EncodingName::Untagged
            }
        }
    }

    /// Raw tag of `path`; `None` when the platform query fails.
    pub fn tag_info(&self, path: &Path) -> Option<TagInfo> {
        match self.backend.query(path) {
            Ok(info) => {
                debug!(
                    "got tag info for {}: CCSID={}, text={}",
                    path.display(),
                    info.ccsid,
                    info.text_flag
                );
                Some(info)
            }
            Err(err) => {
                debug!("failed to get tag info for {}: {}", path.display(), err);
                None
            }
        }
    }
}

/// Sets tags and confirms them by reading them back.
#[derive(Clone, Copy)]
pub struct TagWriter<'a> {
    backend: &'a dyn TagBackend,
}

impl<'a> TagWriter<'a> {
    pub fn new(backend: &'a dyn TagBackend) -> Self {
        Self { backend }
    }

    /// Tag `path` with `ccsid`. Returns `true` only if a fresh query reports
    /// the requested identifier afterwards.
    pub fn write_tag(&self, path: &Path, ccsid: Ccsid, text_flag: bool) -> bool {
        debug!(
            "setting tag on {} via {}: CCSID={}, text_flag={}",
            path.display(),
            self.backend.name(),
            ccsid,
            text_flag
        );
        if let Err(err) = self.backend.set(path, ccsid, text_flag) {
            debug!("tag set failed for {}: {}", path.display(), err);
            return false;
        }
        let actual = TagReader::new(self.backend).tag_info(path);
        let verified = actual.as_ref().map(|info| info.ccsid) == Some(ccsid);
        match actual {
            Some(info) if verified => {
                debug!("verified {} is tagged {}", path.display(), info.encoding_name);
            }
            Some(info) => warn!(
                "tag verification failed for {}: expected {}, got {}",
                path.display(),
                ccsid.label(),
                info.encoding_name
            ),
            None => warn!(
                "tag verification failed for {}: tag could not be read back",
                path.display()
            ),
        }
        verified
    }
}
