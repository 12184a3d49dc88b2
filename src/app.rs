use adw::Application;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory on this system")]
    NoConfigDir,
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            name: String::new(),
            phone: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("chatview.toml"))
    }

    pub fn has_identity(&self) -> bool {
        !self.server_url.is_empty() && !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Stored config, or defaults when there is none or it cannot be read.
    pub fn load() -> Self {
        let Some(path) = Self::toml_path() else {
            return Self::new();
        };
        match Self::load_from(&path) {
            Ok(state) => state,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Self::new(),
            Err(err) => {
                log::warn!("ignoring config {}: {err}", path.display());
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::toml_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Forget who we are but keep the server and tuning.
    pub fn forget_identity(&mut self) {
        self.name.clear();
        self.phone.clear();
    }
}

pub fn build_ui(app: &Application) {
    let state = AppState::load();
    if state.has_identity() {
        crate::ui::main_window::show_main_window(app, state);
    } else {
        crate::ui::login::show_login_window(app, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("chatview.toml");
        let state = AppState {
            server_url: "http://localhost:5000".to_string(),
            name: "Alice".to_string(),
            phone: "555-1234".to_string(),
            poll_interval_secs: 5,
        };
        state.save_to(&path).unwrap();
        assert_eq!(AppState::load_from(&path).unwrap(), state);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let state: AppState = toml::from_str(r#"server_url = "http://localhost:5000""#).unwrap();
        assert_eq!(state.poll_interval(), Duration::from_secs(2));
        assert!(!state.has_identity());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let state = AppState {
            poll_interval_secs: 0,
            ..AppState::default()
        };
        assert_eq!(state.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn forgetting_identity_keeps_server() {
        let mut state = AppState {
            server_url: "http://localhost:5000".to_string(),
            name: "Alice".to_string(),
            phone: "555-1234".to_string(),
            poll_interval_secs: 2,
        };
        assert!(state.has_identity());
        state.forget_identity();
        assert!(!state.has_identity());
        assert_eq!(state.server_url, "http://localhost:5000");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatview.toml");
        fs::write(&path, "server_url = [").unwrap();
        assert!(matches!(AppState::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
