use std::fs::read_to_string;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "weather.toml";
pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read from '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse toml from '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("both a key file and a cert file are needed for tls, only the {0} file was given")]
    IncompleteTls(&'static str),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub listen_address: SocketAddr,
    pub assets_path: String,
    pub providers: ProviderSettings,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderSettings {
    pub geocoding_url: String,
    pub forecast_url: String,
    /// Unset means the HTTP client's own default, which never times out.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            assets_path: "assets".to_string(),
            providers: ProviderSettings::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            timeout_secs: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    pub fn from_toml_file(path: &Path) -> Result<Settings, ConfigError> {
        let contents = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Settings::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(contents)
    }

    /// An explicitly requested file must exist, the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Settings::from_toml_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Settings::from_toml_file(default_path)
                } else {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
                    Ok(Settings::default())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TlsFiles {
    pub key_file_path: String,
    pub cert_file_path: String,
}

pub fn tls_files(
    key_file_path: Option<String>,
    cert_file_path: Option<String>,
) -> Result<Option<TlsFiles>, ConfigError> {
    match (key_file_path, cert_file_path) {
        (Some(key_file_path), Some(cert_file_path)) => Ok(Some(TlsFiles {
            key_file_path,
            cert_file_path,
        })),
        (Some(_), None) => Err(ConfigError::IncompleteTls("key")),
        (None, Some(_)) => Err(ConfigError::IncompleteTls("cert")),
        (None, None) => Ok(None),
    }
}
