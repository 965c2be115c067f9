use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "HUD_KERNEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hud-kernel.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Who owns `speed` and `rpm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    #[default]
    Host,
    Local,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HudConfigFile {
    pub mqtt: Option<MqttConf>,
    pub http: HttpConf,
    pub bridge: BridgeSettings,
    pub authority: Authority,
    /// JSON file holding the locally cached theme, read once at startup.
    pub legacy_theme_path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_topic() -> String {
    "hud/nui/message".into()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConf {
    pub bind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BridgeSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for HudConfigFile {
    fn default() -> Self {
        Self {
            mqtt: Some(MqttConf { host: "localhost".into(), port: 1883, topic: default_topic() }),
            http: HttpConf::default(),
            bridge: BridgeSettings::default(),
            authority: Authority::Host,
            legacy_theme_path: None,
        }
    }
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self { base_url: "https://nn-hud".into(), timeout_ms: 2000 }
    }
}

pub async fn read_config(path: &Path) -> Result<HudConfigFile, ConfigError> {
    let txt = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if txt.trim().is_empty() {
        return Ok(HudConfigFile::default());
    }
    serde_yaml::from_str(&txt).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the config named by `HUD_KERNEL_CONFIG`, falling back to defaults.
pub async fn load_config() -> HudConfigFile {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let path = Path::new(&path);
    if !path.exists() {
        info!("[kernel] no {}, using default config", path.display());
        return HudConfigFile::default();
    }
    read_config(path).await.unwrap_or_else(|e| {
        warn!("[kernel] {e}, using default config");
        HudConfigFile::default()
    })
}
