use thiserror::Error;

/// Result type used across the analytics crates.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Canonical error representation shared by the aggregator and the relay.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("event is not allowed: {0}")]
    InvalidEventName(String),

    #[error("invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("general error: {0}")]
    General(String),
}

impl AnalyticsError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        AnalyticsError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure was caused by the caller rather than an upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Unauthorized
                | AnalyticsError::InvalidEventName(_)
                | AnalyticsError::InvalidTimeWindow(_)
                | AnalyticsError::MalformedPayload(_)
        )
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {source}")]
    InvalidEnvVar {
        key: &'static str,
        #[source]
        source: std::env::VarError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for AnalyticsError {
    fn from(value: ConfigError) -> Self {
        AnalyticsError::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_names_the_source() {
        let err = AnalyticsError::source_unavailable("world-app", "status 502");
        assert_eq!(err.to_string(), "source world-app unavailable: status 502");
        assert!(!err.is_client_error());
    }

    #[test]
    fn config_errors_convert_to_config_variant() {
        let err: AnalyticsError = ConfigError::MissingEnvVar("POSTHOG_URL".into()).into();
        assert!(matches!(err, AnalyticsError::Config(message) if message.contains("POSTHOG_URL")));
    }
}
