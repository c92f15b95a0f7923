use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

/// Overrides `backend.base_url` when set.
pub const BACKEND_URL_ENV: &str = "TASK_CHAT_BACKEND_URL";

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_max_items() -> usize {
    5
}

fn default_lang() -> String {
    "en-US".to_string()
}

fn default_max_particles() -> usize {
    150
}

fn default_duration_ms() -> u64 {
    3000
}

fn default_quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction::new("Urgent", "Show my high priority tasks"),
        QuickAction::new("Today", "What tasks are due today?"),
        QuickAction::new("Reminder", "Add a reminder for tomorrow at 9am"),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub celebration: CelebrationConfig,
    #[serde(default = "default_quick_actions")]
    pub quick_actions: Vec<QuickAction>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceConfig {
    /// Program and arguments of the speech recognizer. Voice input is
    /// unavailable when unset.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default = "default_lang")]
    pub lang: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CelebrationConfig {
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

impl CelebrationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuickAction {
    pub label: String,
    pub command: String,
}

impl QuickAction {
    pub fn new(label: &str, command: &str) -> Self {
        QuickAction {
            label: label.to_string(),
            command: command.to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 960,
            height: 720,
            min_width: 600,
            min_height: 400,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_items: default_max_items(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        VoiceConfig {
            command: None,
            lang: default_lang(),
        }
    }
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        CelebrationConfig {
            max_particles: default_max_particles(),
            duration_ms: default_duration_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::default(),
            window: WindowConfig::default(),
            history: HistoryConfig::default(),
            voice: VoiceConfig::default(),
            celebration: CelebrationConfig::default(),
            quick_actions: default_quick_actions(),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it is missing or
    /// broken, then applies environment overrides.
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        let mut config = if config_path.exists() {
            match Self::from_path(&config_path) {
                Ok(config) => {
                    info!(path = %config_path.display(), "loaded config");
                    config
                }
                Err(e) => {
                    warn!("{:#}. Using defaults.", e);
                    Config::default()
                }
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            Config::default()
        };

        config.override_backend_url(std::env::var(BACKEND_URL_ENV).ok());
        config
    }

    /// Replaces the backend URL with a non-blank value of
    /// `TASK_CHAT_BACKEND_URL`.
    pub fn override_backend_url(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|url| !url.trim().is_empty()) {
            self.backend.base_url = url;
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Error parsing {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/task-chat")
        } else {
            PathBuf::from(".")
        }
    }
}
