use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const DEFAULT_REFRESH_SECONDS: u64 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// User preferences persisted between sessions.
/// ```json
/// { "theme": "dark", "refreshIntervalSeconds": 15 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub refresh_interval_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            refresh_interval_seconds: DEFAULT_REFRESH_SECONDS,
        }
    }
}

impl Settings {
    /// Realtime poll interval; never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds.max(1))
    }

    /// Bring out-of-range values back into range.
    pub fn sanitized(mut self) -> Self {
        if self.refresh_interval_seconds < 1 {
            warn!(
                "refresh interval of {}s is below the 1s minimum; using 1s",
                self.refresh_interval_seconds
            );
            self.refresh_interval_seconds = 1;
        }
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("settings i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Key-value persistence for [`Settings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, SettingsError>;
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Process-local store; starts at defaults.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Settings>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.inner.write().await = settings.clone().sanitized();
        Ok(())
    }
}

/// Settings kept as a `.json` file. A missing file reads as defaults.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let file = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings at {}; using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let settings: Settings =
            serde_json::from_slice(&file).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(settings.sanitized())
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let bytes = serde_json::to_vec_pretty(&settings.clone().sanitized()).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_dashboard() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.refresh_interval(), Duration::from_secs(10));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "theme": "dark" }"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.refresh_interval_seconds, DEFAULT_REFRESH_SECONDS);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let settings = Settings {
            refresh_interval_seconds: 0,
            ..Default::default()
        };
        assert_eq!(settings.refresh_interval(), Duration::from_secs(1));
        assert_eq!(settings.sanitized().refresh_interval_seconds, 1);
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("settings.json"));

        assert_eq!(store.load().await.unwrap(), Settings::default());

        let wanted = Settings {
            theme: Theme::Dark,
            refresh_interval_seconds: 30,
        };
        store.save(&wanted).await.unwrap();
        assert_eq!(store.load().await.unwrap(), wanted);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("refreshIntervalSeconds"));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ theme: ").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[tokio::test]
    async fn memory_store_sanitizes_on_save() {
        let store = MemoryStore::default();
        store
            .save(&Settings {
                theme: Theme::Dark,
                refresh_interval_seconds: 0,
            })
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().refresh_interval_seconds, 1);
    }
}
