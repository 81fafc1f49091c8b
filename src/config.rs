use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL every API path is appended to, without a trailing slash.
    pub api_base_url: String,
    /// File the bearer token is persisted in between runs.
    pub token_path: PathBuf,
    /// Origin used when building shareable meme links.
    pub web_origin: String,
    // None keeps the transport's default behaviour.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://localhost:8000/a".to_string(),
            token_path: PathBuf::from(".meme_arena_token"),
            web_origin: "http://localhost:5173".to_string(),
            request_timeout: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_base_url = lookup("MEME_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidVar(
                "MEME_API_BASE_URL".into(),
                format!("expected an http(s) URL, got '{}'", api_base_url),
            ));
        }

        let token_path = lookup("MEME_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path);

        let web_origin = lookup("MEME_WEB_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string())
            .unwrap_or(defaults.web_origin);

        let request_timeout = match lookup("MEME_REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidVar("MEME_REQUEST_TIMEOUT_MS".into(), e.to_string())
                })?;
                Some(Duration::from_millis(millis))
            }
            None => None,
        };

        Ok(Config {
            api_base_url,
            token_path,
            web_origin,
            request_timeout,
        })
    }
}
