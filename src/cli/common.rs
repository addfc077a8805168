//! Shared clap helper types for CLI commands.

use clap::ValueEnum;
use zos_ccsid::BackendKind;

/// Tagging mechanisms selectable with `--backend`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Auto,
    Native,
    Chtag,
    None,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> BackendKind {
        match value {
            BackendArg::Auto => BackendKind::Auto,
            BackendArg::Native => BackendKind::Native,
            BackendArg::Chtag => BackendKind::Chtag,
            BackendArg::None => BackendKind::None,
        }
    }
}
