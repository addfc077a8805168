//! z/OS `fcntl` tagging: `F_CONTROL_CVT` to query, `F_SETTAG` to set.

use std::ffi::{c_int, c_void};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

use log::{debug, warn};

use super::{TagBackend, TagError};
use crate::codepage::{Ccsid, TagInfo};
use crate::control::{
    ConversionControl, F_CONTROL_CVT, F_SETTAG, LAYOUT_VERSION, TagAttributes,
};

unsafe extern "C" {
    fn fcntl(fd: c_int, cmd: c_int, ...) -> c_int;
}

/// Issues the tagging control calls directly against an open descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlCallBackend;

impl ControlCallBackend {
    pub fn new() -> Self {
        debug!("using fcntl tagging, control layout v{}", LAYOUT_VERSION);
        Self
    }
}

fn control(file: &File, cmd: c_int, block: &mut [u8]) -> io::Result<()> {
    // SAFETY: `block` is a live buffer sized for the structure `cmd` expects.
    let rc = unsafe { fcntl(file.as_raw_fd(), cmd, block.as_mut_ptr() as *mut c_void) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl TagBackend for ControlCallBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn query(&self, path: &Path) -> Result<TagInfo, TagError> {
        let file = File::open(path)?;
        let mut block = ConversionControl::query().encode();
        control(&file, F_CONTROL_CVT, &mut block).map_err(|source| TagError::ControlCall {
            operation: "F_CONTROL_CVT",
            source,
        })?;
        let reply = ConversionControl::decode(&block)?;
        let ccsid = Ccsid(reply.file_ccsid_unsigned());
        debug!(
            "F_CONTROL_CVT {}: pccsid={} fccsid={}",
            path.display(),
            reply.program_ccsid,
            ccsid
        );
        // The conversion query does not expose the text flag; a tagged file is
        // reported as text.
        Ok(TagInfo::new(ccsid, ccsid != Ccsid::UNTAGGED))
    }

    fn set(&self, path: &Path, ccsid: Ccsid, text_flag: bool) -> Result<(), TagError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut block = TagAttributes::set(ccsid.0, text_flag).encode();
        // F_SETTAG can fail while still changing the tag, and succeed without
        // changing it. The caller's read-back decides.
        if let Err(err) = control(&file, F_SETTAG, &mut block) {
            warn!("F_SETTAG on {} reported {}", path.display(), err);
        }
        Ok(())
    }
}
