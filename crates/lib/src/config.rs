//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.mediarelay/config.json`) and environment.
//! Secrets (provider credentials) and deployment-specific locations can be supplied via env instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messaging provider credentials (Twilio, Infobip).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Downstream relay API that receives uploaded files.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Local download directory.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP webhooks (default 5000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-provider credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersConfig {
    #[serde(default)]
    pub twilio: TwilioConfig,
    #[serde(default)]
    pub infobip: InfobipConfig,
}

/// Twilio account credentials. Media URLs require HTTP Basic auth with SID and token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwilioConfig {
    /// Account SID. Overridden by TWILIO_ACCOUNT_SID env when set.
    pub account_sid: Option<String>,
    /// Auth token. Overridden by TWILIO_AUTH_TOKEN env when set.
    pub auth_token: Option<String>,
}

/// Infobip credentials. Media URLs are fetched with `Authorization: App <apiKey>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfobipConfig {
    /// API key. Overridden by INFOBIP_API_KEY env when set.
    pub api_key: Option<String>,
}

/// Relay API location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Base URL of the relay API (e.g. "https://relay.example.com"). Overridden by MEDIARELAY_RELAY_URL env.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Upload path appended to the base URL (default "/api/upload-resume").
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

fn default_upload_path() -> String {
    "/api/upload-resume".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            upload_path: default_upload_path(),
        }
    }
}

/// Where downloaded media is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Download root. Relative paths are resolved against the config file's parent. Each provider writes into its own subdirectory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

/// Read an env var, trimmed; empty counts as unset.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve Twilio (account SID, auth token): env TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN override config. Both must be present.
pub fn resolve_twilio_credentials(config: &Config) -> Option<(String, String)> {
    let twilio = &config.providers.twilio;
    let sid = env_non_empty("TWILIO_ACCOUNT_SID")
        .or_else(|| config_non_empty(twilio.account_sid.as_ref()))?;
    let token = env_non_empty("TWILIO_AUTH_TOKEN")
        .or_else(|| config_non_empty(twilio.auth_token.as_ref()))?;
    Some((sid, token))
}

/// Resolve the Infobip API key: env INFOBIP_API_KEY overrides config.
pub fn resolve_infobip_api_key(config: &Config) -> Option<String> {
    env_non_empty("INFOBIP_API_KEY")
        .or_else(|| config_non_empty(config.providers.infobip.api_key.as_ref()))
}

/// Resolve the full relay upload URL (base URL + upload path). Env MEDIARELAY_RELAY_URL overrides the configured base URL.
pub fn resolve_relay_upload_url(config: &Config) -> Option<String> {
    let base = env_non_empty("MEDIARELAY_RELAY_URL")
        .or_else(|| config_non_empty(config.relay.base_url.as_ref()))?;
    Some(join_upload_url(&base, &config.relay.upload_path))
}

fn join_upload_url(base: &str, upload_path: &str) -> String {
    let path = upload_path.trim();
    if path.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MEDIARELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".mediarelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the download root: env MEDIARELAY_DOWNLOAD_DIR, then `storage.downloadDir` (relative paths resolved against the config file's parent), else `downloads` next to the config file.
pub fn resolve_download_dir(config: &Config, config_path: &Path) -> PathBuf {
    let configured = env_non_empty("MEDIARELAY_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .or_else(|| config.storage.download_dir.clone())
        .filter(|d| !d.as_os_str().is_empty());
    match configured {
        Some(d) if d.is_absolute() => d,
        Some(d) => config_parent(config_path).join(d),
        None => config_parent(config_path).join("downloads"),
    }
}

/// Load config from the given path (or MEDIARELAY_CONFIG_PATH / default). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 5000);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.relay.upload_path, "/api/upload-resume");
        assert!(config.relay.base_url.is_none());
        assert!(config.providers.twilio.account_sid.is_none());
    }

    #[test]
    fn parses_camel_case_sections() {
        let config: Config = serde_json::from_str(
            r#"{
                "gateway": { "port": 8080 },
                "providers": {
                    "twilio": { "accountSid": "AC1", "authToken": "tok" },
                    "infobip": { "apiKey": "key" }
                },
                "relay": { "baseUrl": "https://relay.test/" },
                "storage": { "downloadDir": "media" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.bind, "127.0.0.1");
        assert_eq!(config.providers.twilio.account_sid.as_deref(), Some("AC1"));
        assert_eq!(config.providers.infobip.api_key.as_deref(), Some("key"));
        assert_eq!(config.storage.download_dir, Some(PathBuf::from("media")));
    }

    #[test]
    fn join_upload_url_normalizes_slashes() {
        assert_eq!(
            join_upload_url("https://relay.test/", "/api/upload-resume"),
            "https://relay.test/api/upload-resume"
        );
        assert_eq!(
            join_upload_url("https://relay.test", "api/upload"),
            "https://relay.test/api/upload"
        );
        assert_eq!(join_upload_url("https://relay.test/", " "), "https://relay.test");
    }

    #[test]
    fn blank_config_values_count_as_unset() {
        assert_eq!(config_non_empty(Some(&"  ".to_string())), None);
        assert_eq!(
            config_non_empty(Some(&" AC1 ".to_string())),
            Some("AC1".to_string())
        );
    }

    #[test]
    fn resolve_download_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.mediarelay/config.json");
        if std::env::var("MEDIARELAY_DOWNLOAD_DIR").is_ok() {
            return;
        }
        assert_eq!(
            resolve_download_dir(&config, path),
            PathBuf::from("/home/user/.mediarelay/downloads")
        );
    }

    #[test]
    fn resolve_download_dir_override_relative() {
        let mut config = Config::default();
        config.storage.download_dir = Some(PathBuf::from("media/in"));
        let path = Path::new("/home/user/.mediarelay/config.json");
        if std::env::var("MEDIARELAY_DOWNLOAD_DIR").is_ok() {
            return;
        }
        assert_eq!(
            resolve_download_dir(&config, path),
            PathBuf::from("/home/user/.mediarelay/media/in")
        );
    }

    #[test]
    fn resolve_download_dir_override_absolute() {
        let mut config = Config::default();
        config.storage.download_dir = Some(PathBuf::from("/srv/media"));
        let path = Path::new("/home/user/.mediarelay/config.json");
        if std::env::var("MEDIARELAY_DOWNLOAD_DIR").is_ok() {
            return;
        }
        assert_eq!(resolve_download_dir(&config, path), PathBuf::from("/srv/media"));
    }

    #[test]
    fn bare_config_file_name_resolves_against_cwd() {
        let config = Config::default();
        if std::env::var("MEDIARELAY_DOWNLOAD_DIR").is_ok() {
            return;
        }
        assert_eq!(
            resolve_download_dir(&config, Path::new("config.json")),
            PathBuf::from("./downloads")
        );
    }
}
