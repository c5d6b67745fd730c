use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::Dhis2Error;

pub const CONFIG_FILE_NAME: &str = "dhis2.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ClientConfig, Dhis2Error> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => Self::default_path().ok_or(Dhis2Error::MissingConfig)?,
        };

        let content = fs::read_to_string(&config_path)
            .map_err(|_| Dhis2Error::ConfigRead(config_path.clone()))?;
        let mut config: Config = serde_json::from_str(&content)
            .map_err(|err| Dhis2Error::ConfigParse(err.to_string()))?;

        if let Ok(username) = std::env::var("DHIS2_USERNAME") {
            if !username.trim().is_empty() {
                config.username = username;
            }
        }
        if let Ok(password) = std::env::var("DHIS2_PASSWORD") {
            if !password.trim().is_empty() {
                config.password = Some(password);
            }
        }

        Self::resolve_config(config)
    }

    /// `dhis2.json` in the working directory, then the per-user config directory.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("org", "dhis2", "dhis2-client")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    pub fn resolve_config(config: Config) -> Result<ClientConfig, Dhis2Error> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|err| Dhis2Error::InvalidConfig(format!("base_url {base_url}: {err}")))?;

        let username = config.username.trim().to_string();
        if username.is_empty() {
            return Err(Dhis2Error::InvalidConfig("username is empty".to_string()));
        }
        let password = config
            .password
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                Dhis2Error::InvalidConfig(
                    "password missing (set it in the config or DHIS2_PASSWORD)".to_string(),
                )
            })?;

        let timeout = match config.timeout_secs {
            Some(0) => {
                return Err(Dhis2Error::InvalidConfig(
                    "timeout_secs must be positive".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(ClientConfig {
            base_url,
            username,
            password,
            timeout,
        })
    }
}
