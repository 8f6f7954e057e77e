use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::use_cases::Endpoints;

// Runtime configuration constants.

const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const DEFAULT_SCOPE: &str = "public read_user write_likes";
const DEFAULT_SCHEME: &str = "https";
const DEFAULT_AUTH_HOST: &str = "unsplash.com";
const DEFAULT_API_HOST: &str = "api.unsplash.com";
const DEFAULT_TOKEN_STORE_PATH: &str = "image_feed_token.toml";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    pub token_store_path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Missing(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {}

// Optional TOML file; every key may be overridden from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub scheme: Option<String>,
    pub auth_host: Option<String>,
    pub api_host: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub token_store_path: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }
}

impl Settings {
    // Load from `IMAGE_FEED_CONFIG` (if set) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match env::var("IMAGE_FEED_CONFIG") {
            Ok(path) => FileConfig::load(path)?,
            Err(_) => FileConfig::default(),
        };
        Self::resolve(file, |key| env::var(key).ok())
    }

    // Merge file values with overrides looked up through `var`; overrides win.
    pub fn resolve(
        file: FileConfig,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pick = |key: &str, from_file: Option<String>| var(key).or(from_file);

        let access_key = pick("UNSPLASH_ACCESS_KEY", file.access_key)
            .ok_or(ConfigError::Missing("UNSPLASH_ACCESS_KEY"))?;
        let secret_key = pick("UNSPLASH_SECRET_KEY", file.secret_key)
            .ok_or(ConfigError::Missing("UNSPLASH_SECRET_KEY"))?;

        let timeout_ms = var("REQUEST_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .or(file.request_timeout_ms)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let token_store_path = var("TOKEN_STORE_PATH")
            .map(PathBuf::from)
            .or(file.token_store_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_STORE_PATH));

        Ok(Self {
            endpoints: Endpoints {
                access_key,
                secret_key,
                redirect_uri: pick("UNSPLASH_REDIRECT_URI", file.redirect_uri)
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
                scope: pick("UNSPLASH_SCOPE", file.scope)
                    .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                scheme: pick("UNSPLASH_SCHEME", file.scheme)
                    .unwrap_or_else(|| DEFAULT_SCHEME.to_string()),
                auth_host: pick("UNSPLASH_AUTH_HOST", file.auth_host)
                    .unwrap_or_else(|| DEFAULT_AUTH_HOST.to_string()),
                api_host: pick("UNSPLASH_API_HOST", file.api_host)
                    .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            },
            request_timeout: Duration::from_millis(timeout_ms),
            token_store_path,
        })
    }
}
