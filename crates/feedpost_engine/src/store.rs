use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use feedpost_core::{Credentials, DeviceIdentity, SessionBlob};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{remove_if_exists, write_atomic, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write: {0}")]
    Write(#[from] PersistError),
    #[error("{path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Operator configuration as saved by the control surface.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub rss_url: String,
    pub username: String,
    pub password: String,
    pub session_cookie: String,
}

impl UserConfig {
    pub fn with_feed(rss_url: &str) -> Self {
        Self {
            rss_url: rss_url.to_string(),
            ..Self::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password, &self.session_cookie)
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("rss_url", &self.rss_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session_cookie", &"<redacted>")
            .finish()
    }
}

/// One file per persisted concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub config: PathBuf,
    pub last_published: PathBuf,
    pub session: PathBuf,
    pub device: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join("config.json"),
            last_published: dir.join("last_post.txt"),
            session: dir.join("session.json"),
            device: dir.join("device.json"),
        }
    }
}

/// File-backed durable state: configuration, last-published marker,
/// platform session and device identity.
#[derive(Debug, Clone)]
pub struct StateStore {
    paths: StorePaths,
}

impl StateStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Saved configuration, or one pointing at `default_rss` when none was
    /// saved yet. A blank saved feed URL also falls back to `default_rss`.
    pub fn load_config(&self, default_rss: &str) -> Result<UserConfig, StoreError> {
        let mut config = self
            .read_json::<UserConfig>(&self.paths.config)?
            .unwrap_or_else(|| UserConfig::with_feed(default_rss));
        if config.rss_url.trim().is_empty() {
            config.rss_url = default_rss.to_string();
        }
        Ok(config)
    }

    pub fn save_config(&self, config: &UserConfig) -> Result<(), StoreError> {
        self.write_json(&self.paths.config, config)?;
        engine_info!("Configuration saved");
        Ok(())
    }

    /// Last-published marker, empty when nothing was published yet.
    pub fn last_published(&self) -> Result<String, StoreError> {
        Ok(read_optional(&self.paths.last_published)?
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }

    pub fn set_last_published(&self, id: &str) -> Result<(), StoreError> {
        write_atomic(&self.paths.last_published, id.trim().as_bytes())?;
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<SessionBlob>, StoreError> {
        self.read_json(&self.paths.session)
    }

    pub fn save_session(&self, session: &SessionBlob) -> Result<(), StoreError> {
        self.write_json(&self.paths.session, session)
    }

    pub fn clear_session(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.paths.session)?;
        Ok(())
    }

    pub fn load_device(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        self.read_json(&self.paths.device)
    }

    pub fn save_device(&self, device: &DeviceIdentity) -> Result<(), StoreError> {
        self.write_json(&self.paths.device, device)
    }

    /// The only way a device identity gets replaced.
    pub fn clear_device(&self) -> Result<(), StoreError> {
        remove_if_exists(&self.paths.device)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        let Some(text) = read_optional(path)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| StoreError::Corrupt {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(value).map_err(|err| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        write_atomic(path, text.as_bytes())?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
