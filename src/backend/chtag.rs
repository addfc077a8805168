//! Tagging through the z/OS UNIX `chtag` and `ls -T` commands.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;

use super::{TagBackend, TagError};
use crate::codepage::{Ccsid, EncodingName, TagInfo};

/// Code set names `ls -T` prints that map to identifiers outside the three named ones.
const EXTRA_CODESETS: &[(&str, u16)] = &[
    ("binary", 65535),
    ("UTF-8", 1208),
    ("IBM-037", 37),
    ("IBM-1140", 1140),
    ("ISO8859-15", 923),
];

/// Runs the tagging utilities as subprocesses.
#[derive(Debug, Clone)]
pub struct ChtagBackend {
    ls_program: PathBuf,
    chtag_program: PathBuf,
}

impl ChtagBackend {
    pub fn new<L: Into<PathBuf>, C: Into<PathBuf>>(ls_program: L, chtag_program: C) -> Self {
        Self {
            ls_program: ls_program.into(),
            chtag_program: chtag_program.into(),
        }
    }

    fn run(&self, program: &Path, args: &[&OsStr]) -> Result<Output, TagError> {
        debug!("running {} {:?}", program.display(), args);
        let output = Command::new(program).args(args).output()?;
        if !output.status.success() {
            return Err(TagError::CommandFailed {
                program: program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl TagBackend for ChtagBackend {
    fn name(&self) -> &'static str {
        "chtag"
    }

    fn query(&self, path: &Path) -> Result<TagInfo, TagError> {
        // -d reports a directory's own tag instead of listing its entries.
        let output = self.run(
            &self.ls_program,
            &[OsStr::new("-dT"), OsStr::new("--"), path.as_os_str()],
        )?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| TagError::Parse("empty ls -dT output".to_string()))?;
        parse_ls_tag_line(line)
    }

    fn set(&self, path: &Path, ccsid: Ccsid, text_flag: bool) -> Result<(), TagError> {
        if ccsid == Ccsid::UNTAGGED {
            self.run(
                &self.chtag_program,
                &[OsStr::new("-r"), OsStr::new("--"), path.as_os_str()],
            )?;
            return Ok(());
        }
        let codeset = match ccsid.encoding_name() {
            Some(name) => name.as_str().to_string(),
            None => ccsid.0.to_string(),
        };
        let mode = if text_flag { "-tc" } else { "-mc" };
        self.run(
            &self.chtag_program,
            &[
                OsStr::new(mode),
                OsStr::new(codeset.as_str()),
                OsStr::new("--"),
                path.as_os_str(),
            ],
        )?;
        Ok(())
    }
}

/// Parse one line of `ls -T` output, e.g. `t IBM-1047    T=on  /tmp/file`.
pub fn parse_ls_tag_line(line: &str) -> Result<TagInfo, TagError> {
    let mut fields = line.split_whitespace();
    let _marker = fields
        .next()
        .ok_or_else(|| TagError::Parse(line.to_string()))?;
    let codeset = fields
        .next()
        .ok_or_else(|| TagError::Parse(line.to_string()))?;
    let text_flag = match fields.next() {
        Some("T=on") => true,
        Some("T=off") => false,
        _ => return Err(TagError::Parse(line.to_string())),
    };
    let ccsid = codeset_to_ccsid(codeset).ok_or_else(|| TagError::Parse(line.to_string()))?;
    Ok(TagInfo::new(ccsid, text_flag))
}

fn codeset_to_ccsid(codeset: &str) -> Option<Ccsid> {
    if let Ok(name) = codeset.parse::<EncodingName>() {
        return Some(name.ccsid());
    }
    if let Some((_, id)) = EXTRA_CODESETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(codeset))
    {
        return Some(Ccsid(*id));
    }
    codeset.parse::<u16>().ok().map(Ccsid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_tagged_text_file() {
        let info = parse_ls_tag_line("t IBM-1047    T=on  /tmp/out.txt").unwrap();
        assert_eq!(info, TagInfo::new(Ccsid::IBM1047, true));
    }

    #[test]
    fn parses_untagged_and_mixed() {
        let info = parse_ls_tag_line("- untagged    T=off /tmp/in.txt").unwrap();
        assert_eq!(info, TagInfo::new(Ccsid::UNTAGGED, false));
        let info = parse_ls_tag_line("m ISO8859-1   T=off /tmp/in.txt").unwrap();
        assert_eq!(info, TagInfo::new(Ccsid::ISO8859_1, false));
    }

    #[test]
    fn keeps_unnamed_codesets_opaque() {
        let info = parse_ls_tag_line("b binary      T=off /bin/sh").unwrap();
        assert_eq!(info.ccsid, Ccsid(65535));
        assert_eq!(info.encoding(), None);
        let info = parse_ls_tag_line("t 1208 T=on /tmp/u8").unwrap();
        assert_eq!(info.encoding_name, "CCSID-1208");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ls_tag_line("total 0").is_err());
        assert!(parse_ls_tag_line("t SOMETHING T=on /x").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn drives_fake_tagging_commands() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        let calls = dir.path().join("calls");
        let target = dir.path().join("-data.txt");
        std::fs::write(&target, b"data").unwrap();

        let chtag = dir.path().join("chtag");
        std::fs::write(
            &chtag,
            format!(
                "#!/bin/sh\necho \"chtag $*\" >> {c}\ncase \"$1\" in\n  -r) echo '- untagged T=off' > {s} ;;\n  -tc) echo \"t $2 T=on\" > {s} ;;\n  -mc) echo \"m $2 T=off\" > {s} ;;\n  *) echo bad flag >&2; exit 2 ;;\nesac\n",
                s = state.display(),
                c = calls.display()
            ),
        )
        .unwrap();
        let ls = dir.path().join("ls");
        std::fs::write(
            &ls,
            format!(
                "#!/bin/sh\necho \"ls $*\" >> {c}\nif [ -f {s} ]; then line=$(cat {s}); else line='- untagged T=off'; fi\necho \"$line $3\"\n",
                s = state.display(),
                c = calls.display()
            ),
        )
        .unwrap();
        for script in [&chtag, &ls] {
            std::fs::set_permissions(script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let backend = ChtagBackend::new(&ls, &chtag);
        assert_eq!(backend.query(&target).unwrap().ccsid, Ccsid::UNTAGGED);

        backend.set(&target, Ccsid::IBM1047, true).unwrap();
        assert_eq!(
            backend.query(&target).unwrap(),
            TagInfo::new(Ccsid::IBM1047, true)
        );

        backend.set(&target, Ccsid::ISO8859_1, false).unwrap();
        assert_eq!(
            backend.query(&target).unwrap(),
            TagInfo::new(Ccsid::ISO8859_1, false)
        );

        backend.set(&target, Ccsid::UNTAGGED, true).unwrap();
        assert_eq!(backend.query(&target).unwrap().ccsid, Ccsid::UNTAGGED);

        let t = target.display();
        let expected = [
            format!("ls -dT -- {t}"),
            format!("chtag -tc IBM-1047 -- {t}"),
            format!("ls -dT -- {t}"),
            format!("chtag -mc ISO8859-1 -- {t}"),
            format!("ls -dT -- {t}"),
            format!("chtag -r -- {t}"),
            format!("ls -dT -- {t}"),
        ];
        let recorded = std::fs::read_to_string(&calls).unwrap();
        assert_eq!(recorded.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let backend = ChtagBackend::new("/nonexistent/ls", "/nonexistent/chtag");
        let err = backend.query(Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, TagError::Io(_)));
    }
}
