//! Show or initialize the configuration file.

use fleetdash_common::config::{config_file_path, AppConfig};

pub fn run(init: bool, config: &AppConfig) -> anyhow::Result<()> {
    if init {
        let path = config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let path = config_file_path();
    let source = if path.exists() { "file" } else { "defaults" };
    println!("# {} ({source})", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
