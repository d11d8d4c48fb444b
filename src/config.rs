use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_api_key() -> String {
    "YOUR_API_KEY_HERE".to_string()
}

fn default_project_id() -> String {
    "your-project-id".to_string()
}

fn default_storage_bucket() -> String {
    "your-project-id.appspot.com".to_string()
}

fn default_poll_interval() -> u64 {
    3
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SlateConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    /// Seconds between query polls for the live list subscriptions.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            project_id: default_project_id(),
            storage_bucket: default_storage_bucket(),
            poll_interval_secs: default_poll_interval(),
            debug_logging: false,
        }
    }
}

impl SlateConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("slate")
            .join("config.json")
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("slate")
    }

    /// Where the guest-mode marker file lives.
    pub fn guest_flag_path() -> PathBuf {
        Self::data_dir().join("guest_mode")
    }

    /// Load the config file, falling back to defaults when missing or invalid.
    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Invalid config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self).expect("config serializes");
        std::fs::write(&path, text)
    }

    /// True while the config still carries the placeholder keys shipped in the
    /// repo. Sign-in and data access cannot work against the real backend in
    /// this state.
    pub fn is_placeholder(&self) -> bool {
        self.api_key.contains("YOUR_API_KEY")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_placeholder() {
        assert!(SlateConfig::default().is_placeholder());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SlateConfig =
            serde_json::from_str(r#"{"api_key":"AIzaReal","project_id":"slate-prod"}"#).unwrap();
        assert!(!config.is_placeholder());
        assert_eq!(config.project_id, "slate-prod");
        assert_eq!(config.storage_bucket, default_storage_bucket());
        assert_eq!(config.poll_interval_secs, 3);
    }
}
