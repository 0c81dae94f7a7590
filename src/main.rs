//! lpcflash - Firmware programmer for LPC11U68 NFC controllers
//!
//! The MCU's bootloader enumerates as raw block storage (`/dev/block/sdX` on
//! the target host). Programming copies a firmware image into that device at
//! a fixed offset past the bootloader's header sectors.
//!
//! # Architecture
//!
//! - `lpcflash-core` holds the platform independent pipeline: locate the
//!   device node, load and bound the image, write it, and the optional flash
//!   session around it (reset into programming mode, wait, unmount, reset back)
//! - `lpcflash-linux-block` implements the host traits on Linux
//! - this binary resolves configuration and dispatches the subcommands

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, DeviceArgs, MountArgs};
use commands::program::ProgramOptions;
use lpcflash_core::error::ConfigError;
use lpcflash_core::ProgramConfig;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG still takes precedence over -v
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(cli.verbose)),
    )
    .init();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Program {
            input,
            device,
            max_size,
            verify,
            require_reset_driver,
            reset,
            unmount,
            mount,
        } => {
            apply_device_args(&mut config, &device);
            apply_mount_args(&mut config, &mount);
            if let Some(max_size) = max_size {
                config.device.max_image_size = max_size;
            }
            config.device.verify |= verify;
            config.reset.required |= require_reset_driver;
            config.validate()?;

            let options = ProgramOptions {
                reset,
                unmount,
                lazy: mount.lazy,
            };
            let outcome = commands::program::run(&config, &input, options);
            println!("{}", outcome);
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Locate { device, all } => {
            apply_device_args(&mut config, &device);
            config.validate()?;
            commands::locate::run(&config, all)
        }
        Commands::Unmount { mount } => {
            apply_mount_args(&mut config, &mount);
            commands::unmount::run(&config, mount.lazy)
        }
        Commands::Mode { mode, driver } => {
            if let Some(driver) = driver {
                config.reset.driver = driver;
            }
            commands::mode::run(&config, mode)
        }
    }
}

/// Log filter used when RUST_LOG is unset
fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Load configuration from the given file or the first default location that exists
fn load_config(path: Option<&Path>) -> Result<ProgramConfig, ConfigError> {
    if let Some(path) = path {
        let config = ProgramConfig::from_toml_file(path)?;
        log::debug!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    let default_paths = [
        PathBuf::from("lpcflash.toml"),
        PathBuf::from("/etc/lpcflash.toml"),
    ];

    for candidate in &default_paths {
        if candidate.is_file() {
            let config = ProgramConfig::from_toml_file(candidate)?;
            log::debug!("Loaded configuration from {}", candidate.display());
            return Ok(config);
        }
    }

    log::debug!("No configuration file found, using defaults");
    Ok(ProgramConfig::default())
}

fn apply_device_args(config: &mut ProgramConfig, args: &DeviceArgs) {
    if let Some(prefix) = &args.prefix {
        config.device.prefix = prefix.clone();
    }
}

fn apply_mount_args(config: &mut ProgramConfig, args: &MountArgs) {
    if let Some(point) = &args.mount_point {
        config.mount.point = point.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(verbose: u8, level: Level) -> bool {
        let logger = env_logger::Builder::new()
            .parse_filters(default_log_filter(verbose))
            .build();
        logger.enabled(&Metadata::builder().level(level).target("lpcflash").build())
    }

    #[test]
    fn test_verbosity_raises_log_filter() {
        assert!(enabled(0, Level::Info));
        assert!(!enabled(0, Level::Debug));

        assert!(enabled(1, Level::Debug));
        assert!(!enabled(1, Level::Trace));

        assert!(enabled(2, Level::Trace));
        assert!(enabled(5, Level::Trace));
    }
}
