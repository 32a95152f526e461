use std::path::Path;

use crate::config::Config;

pub fn cmd_init(path: Option<&Path>) -> anyhow::Result<()> {
    let default_path = Config::default_config_path();
    let path = path.unwrap_or(&default_path);

    if Config::create_default_if_missing(path)? {
        println!("✓ Config file created at {}", path.display());
        println!("Add your API keys and run again.");
    } else {
        println!("Config file already exists: {}", path.display());
    }

    Ok(())
}
