use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn default_appearance() -> String {
    "System".to_string()
}

fn default_color_theme() -> String {
    "blue".to_string()
}

/// User-facing display settings, round-tripped through `settings.json` in
/// the platform config directory. Loaded once at startup, saved on every
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_appearance")]
    pub appearance: String,
    #[serde(default = "default_color_theme")]
    pub color_theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            appearance: default_appearance(),
            color_theme: default_color_theme(),
        }
    }
}

/// Errors that can occur when writing settings to disk. Reads never error:
/// a missing or unreadable file degrades to defaults.
#[derive(Debug)]
pub enum ConfigError {
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize {
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write settings at {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Serialize { source } => {
                write!(f, "Failed to serialize settings: {}", source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Write { source, .. } => Some(source),
            ConfigError::Serialize { source } => Some(source),
        }
    }
}

impl Settings {
    pub fn load() -> Settings {
        Self::load_from_path(&settings_path())
    }

    pub fn load_from_path(path: &Path) -> Settings {
        if !path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed settings at {}: {}", path.display(), e);
                Settings::default()
            }),
            Err(e) => {
                tracing::warn!("ignoring unreadable settings at {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&settings_path())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Serialize { source })?;

        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;

        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    let proj_dirs = ProjectDirs::from("org", "permacommons", "chatbox")
        .expect("Failed to determine config directory");
    proj_dirs.config_dir().to_path_buf()
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn chat_log_path() -> PathBuf {
    config_dir().join("chat_log.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(&dir.path().join("settings.json"));
        assert_eq!(settings.appearance, "System");
        assert_eq!(settings.color_theme, "blue");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            appearance: "Dark".to_string(),
            color_theme: "green".to_string(),
        };
        settings.save_to_path(&path).unwrap();
        assert_eq!(Settings::load_from_path(&path), settings);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        Settings::default().save_to_path(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_fields_default_individually() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"appearance": "Light"}"#).unwrap();
        let settings = Settings::load_from_path(&path);
        assert_eq!(settings.appearance, "Light");
        assert_eq!(settings.color_theme, "blue");
    }

    #[test]
    fn malformed_file_degrades_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();
        assert_eq!(Settings::load_from_path(&path), Settings::default());
    }
}
