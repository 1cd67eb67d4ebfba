use std::env;
use std::str::FromStr;

use url::Url;

use crate::errors::ConfigError;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        env::var("ANALYTICS_ENV")
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default()
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Loads `.env` into the process environment if one is present.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Reads an optional variable, treating blank values as absent.
pub fn optional_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidEnvVar { key, source: err }),
    }
}

/// Reads a variable that must be present and non-blank.
pub fn required_env(key: &'static str) -> Result<String, ConfigError> {
    optional_env(key)?.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parses a variable into `T`, falling back to `default` when unset or blank.
pub fn parse_env<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key)? {
        Some(value) => T::from_str(&value)
            .map_err(|err| ConfigError::Internal(format!("invalid value for {key}: {err}"))),
        None => Ok(default),
    }
}

/// Parses a boolean flag accepting `1/0`, `true/false`, `yes/no` and `on/off`.
pub fn parse_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional_env(key)? {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Internal(format!(
                "invalid boolean for {key}: {other}"
            ))),
        },
        None => Ok(default),
    }
}

/// Reads an http(s) URL, falling back to `default`, without a trailing slash.
pub fn read_http_url(key: &'static str, default: &str) -> Result<String, ConfigError> {
    match optional_env(key)? {
        Some(value) => sanitize_http_url(key, &value),
        None => sanitize_http_url(key, default),
    }
}

pub fn sanitize_http_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value)
        .map_err(|err| ConfigError::Internal(format!("invalid URL for {key}: {err}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::Internal(format!(
            "URL for {key} must use http or https"
        )));
    }

    Ok(value.trim_end_matches('/').to_string())
}
