//! CLI command implementations
//!
//! Each command takes the fully resolved [`ProgramConfig`] (file values with
//! command line overrides applied) and talks to the Linux host.
//!
//! [`ProgramConfig`]: lpcflash_core::ProgramConfig

pub mod locate;
pub mod mode;
pub mod program;
pub mod unmount;

use lpcflash_linux_block::LinuxUnmounter;

/// Unmounter for the `--lazy` flag
fn unmounter(lazy: bool) -> LinuxUnmounter {
    if lazy {
        LinuxUnmounter::lazy()
    } else {
        LinuxUnmounter::new()
    }
}

/// Format a byte count for display
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{} GiB", bytes / (1024 * 1024 * 1024))
    } else if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
