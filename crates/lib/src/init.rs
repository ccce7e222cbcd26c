//! Initialize the configuration directory: create ~/.mediarelay, a default config and the download directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

/// Ensure the configuration directory has been initialized (config file exists).
pub fn require_initialized(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `mediarelay init` first (config file not found: {})",
            config_path.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with every default spelled out if missing (relay.baseUrl left empty for the operator).
/// - Creates the download directory resolved from that config.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = serde_json::to_string_pretty(&config::Config::default())
            .context("serializing default config")?;
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, leaving it", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let downloads = config::resolve_download_dir(&config, config_path);
    if !downloads.exists() {
        std::fs::create_dir_all(&downloads)
            .with_context(|| format!("creating download directory {}", downloads.display()))?;
        log::info!("created download directory at {}", downloads.display());
    }

    Ok(config_dir.to_path_buf())
}
