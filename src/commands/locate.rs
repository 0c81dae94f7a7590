//! Locate command implementation

use super::format_size;
use log::debug;
use lpcflash_core::{DeviceLocator, ProgramConfig};
use lpcflash_linux_block::LinuxBlockHost;

/// Print the device node that would be programmed, or every present node with `all`
pub fn run(config: &ProgramConfig, all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let host = LinuxBlockHost::new();
    let locator = DeviceLocator::new(config.device.prefix.clone());

    let devices = if all {
        locator.locate_all(&host)
    } else {
        locator.locate_path(&host).into_iter().collect()
    };

    if devices.is_empty() {
        return Err(format!("No device found matching {}[a-z]", locator.prefix()).into());
    }

    for device in &devices {
        match host.block_info(device) {
            Ok(info) => {
                let description: Vec<&str> = [info.vendor.as_deref(), info.model.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                println!(
                    "{:<20} {:>10}  {}{}",
                    device.to_string(),
                    format_size(info.size),
                    description.join(" "),
                    if info.removable { " (removable)" } else { "" }
                );
            }
            Err(e) => {
                debug!("No sysfs information for {}: {}", device, e);
                println!("{}", device);
            }
        }
    }

    Ok(())
}
