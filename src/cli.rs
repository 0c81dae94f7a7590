//! CLI argument parsing

use clap::{Parser, Subcommand};
use lpcflash_core::config::parse_size;
use lpcflash_core::reset::BootMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lpcflash")]
#[command(author, version, about = "Firmware programmer for LPC11U68 NFC controllers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML format)
    /// Defaults to ./lpcflash.toml, then /etc/lpcflash.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selection shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DeviceArgs {
    /// Device node prefix; nodes are probed as <prefix>a through <prefix>z
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Unmount options shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct MountArgs {
    /// Mount point of the volume the host auto-mounts for the bootloader
    #[arg(long)]
    pub mount_point: Option<PathBuf>,

    /// Detach the mount lazily (MNT_DETACH) if it is busy
    #[arg(long)]
    pub lazy: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a firmware image to the MCU's bootloader device
    Program {
        /// Firmware image file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        device: DeviceArgs,

        /// Largest accepted image (decimal, hex, or with KiB/MiB suffix)
        #[arg(long, value_parser = parse_size)]
        max_size: Option<u64>,

        /// Read the written region back and compare it
        #[arg(long)]
        verify: bool,

        /// Fail unless the gpio-boot-reset driver is loaded
        #[arg(long)]
        require_reset_driver: bool,

        /// Reset the MCU into programming mode first and back to normal mode after
        #[arg(long)]
        reset: bool,

        /// Unmount the auto-mounted volume before writing
        #[arg(long)]
        unmount: bool,

        #[command(flatten)]
        mount: MountArgs,
    },

    /// Show which device node would be programmed
    Locate {
        #[command(flatten)]
        device: DeviceArgs,

        /// List every present node instead of only the first
        #[arg(long)]
        all: bool,
    },

    /// Unmount the volume the host auto-mounted for the bootloader
    Unmount {
        #[command(flatten)]
        mount: MountArgs,
    },

    /// Switch the MCU between programming and normal mode
    Mode {
        /// Boot mode (prog or normal)
        mode: BootMode,

        /// gpio-boot-reset driver directory
        #[arg(long)]
        driver: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_program() {
        let cli = Cli::try_parse_from([
            "lpcflash",
            "-vv",
            "program",
            "-i",
            "fw.bin",
            "--max-size",
            "0x3E800",
            "--reset",
            "--unmount",
            "--lazy",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Program {
                input,
                max_size,
                reset,
                unmount,
                mount,
                verify,
                ..
            } => {
                assert_eq!(input, PathBuf::from("fw.bin"));
                assert_eq!(max_size, Some(256_000));
                assert!(reset && unmount && mount.lazy);
                assert!(!verify);
            }
            _ => panic!("expected program"),
        }
    }

    #[test]
    fn test_parse_mode() {
        let cli = Cli::try_parse_from(["lpcflash", "mode", "prog"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mode {
                mode: BootMode::Program,
                driver: None
            }
        ));
        assert!(Cli::try_parse_from(["lpcflash", "mode", "boot"]).is_err());
    }
}
