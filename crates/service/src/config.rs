//! Service configuration.
//!
//! Stored as JSON at `~/.config/mediastash/config.json` (Linux, honouring
//! `XDG_CONFIG_HOME`) or `%APPDATA%\mediastash\config.json` (Windows).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "mediastash";

fn default_buffer() -> usize {
    256
}

/// Startup configuration for [`MediaStash`](crate::MediaStash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Remote destination, e.g. `owner/repo`.
    #[serde(default)]
    pub destination: String,

    /// JSON key-value store holding settings-resolver state.
    #[serde(default = "default_settings_store_path")]
    pub settings_store_path: PathBuf,

    /// Capacity of the backend progress channel.
    #[serde(default = "default_buffer")]
    pub progress_buffer: usize,

    /// Capacity of the queue event channel.
    #[serde(default = "default_buffer")]
    pub event_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            destination: String::new(),
            settings_store_path: default_settings_store_path(),
            progress_buffer: default_buffer(),
            event_buffer: default_buffer(),
        }
    }
}

impl ServiceConfig {
    /// Loads from the default location. A missing file yields defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads from `path`. Unparseable content is logged and replaced by
    /// defaults; read failures other than "not found" are errors.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<ServiceConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse service config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Saves to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, &json)?;
        set_permissions_0600(path);
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

fn default_settings_store_path() -> PathBuf {
    config_base_dir()
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(APP_DIR)
        .join("settings.json")
}

/// `<config dir>/mediastash/config.json`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join(APP_DIR).join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
            && !xdg.is_empty()
        {
            return Ok(PathBuf::from(xdg));
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ServiceConfig::load_from(&tmp.path().join("none.json")).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.progress_buffer, 256);
        assert!(cfg.settings_store_path.ends_with("mediastash/settings.json"));
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(
            ServiceConfig::load_from(&path).unwrap(),
            ServiceConfig::default()
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"destination":"me/photos"}"#).unwrap();
        let cfg = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(cfg.destination, "me/photos");
        assert_eq!(cfg.event_buffer, 256);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");
        let cfg = ServiceConfig {
            destination: "me/photos".into(),
            settings_store_path: tmp.path().join("s.json"),
            progress_buffer: 8,
            event_buffer: 16,
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(ServiceConfig::load_from(&path).unwrap(), cfg);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
