//! Server configuration.
//!
//! Loaded from `$TENURE_DIR/config.toml` (default `~/.tenure/config.toml`);
//! every field has a default so a missing file yields a runnable local setup.
//!
//! ```text
//! ~/.tenure/
//! ├── config.toml           # Main configuration
//! └── data/
//!     └── members.json      # Membership record store
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use tenure_core::engine::EngineConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Admin API port.
    pub admin_port: u16,
    /// Membership store file; defaults to `<dir>/data/members.json`.
    pub data_file: Option<PathBuf>,
    /// Base URL of the chat gateway sidecar.
    pub gateway_url: String,
    /// Gateway/notification HTTP timeout.
    pub request_timeout_secs: u64,
    /// Expiry sweep interval.
    pub check_interval_secs: u64,
    /// Retention for records on the default expiry policy.
    pub default_expiry_days: i64,
    /// Group ids to track; empty tracks every group.
    pub target_groups: Vec<String>,
    pub notify: NotifyConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat-network recipient for lifecycle notifications.
    pub chat_recipient: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_ids: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_port: 3000,
            data_file: None,
            gateway_url: "http://127.0.0.1:3001".to_string(),
            request_timeout_secs: 30,
            check_interval_secs: 60,
            default_expiry_days: 30,
            target_groups: Vec::new(),
            notify: NotifyConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    pub fn load() -> anyhow::Result<Self> {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let base_dir = std::env::var("TENURE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".tenure"));

        std::fs::create_dir_all(base_dir.join("data"))?;

        let config_path = base_dir.join("config.toml");
        let mut config = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str(&raw)?
        } else {
            Config::default()
        };
        config.base_dir = base_dir;
        Ok(config)
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join("data").join("members.json"))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            check_interval: std::time::Duration::from_secs(self.check_interval_secs),
            default_expiry: chrono::Duration::days(self.default_expiry_days),
            target_groups: self.target_groups.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable() {
        let config = Config::default();
        assert_eq!(config.admin_port, 3000);
        assert_eq!(config.check_interval_secs, 60);
        assert_eq!(config.default_expiry_days, 30);
        assert!(config.target_groups.is_empty());
        assert!(config.notify.telegram_bot_token.is_none());
    }

    #[test]
    fn engine_config_converts_units() {
        let config = Config::default();
        let engine = config.engine_config();
        assert_eq!(engine.check_interval, std::time::Duration::from_secs(60));
        assert_eq!(engine.default_expiry, chrono::Duration::days(30));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            admin_port = 8080
            target_groups = ["120363424613797548@g.us"]

            [notify]
            telegram_chat_ids = ["6968636030"]
            "#,
        )
        .unwrap();

        assert_eq!(config.admin_port, 8080);
        assert_eq!(config.target_groups.len(), 1);
        assert_eq!(config.notify.telegram_chat_ids.len(), 1);
        assert_eq!(config.default_expiry_days, 30);
    }
}
