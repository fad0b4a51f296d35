//! Error types for recall-ai

use thiserror::Error;

/// Result type alias using recall-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when calling a completion service
#[derive(Error, Debug)]
pub enum Error {
    /// Network or IO failure while talking to the provider
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an error payload
    #[error("API error: {message}{}", format_api_suffix(.status, .code, .param))]
    Api {
        message: String,
        code: Option<String>,
        param: Option<String>,
        status: Option<u16>,
    },

    /// The provider answered 2xx but the body could not be understood
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// No completion service registered for the provider
    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// Coarse classification used by callers that only care about the failure family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Api,
    Parse,
}

fn format_api_suffix(status: &Option<u16>, code: &Option<String>, param: &Option<String>) -> String {
    let mut parts = Vec::new();
    if let Some(status) = status {
        parts.push(format!("status: {}", status));
    }
    if let Some(code) = code {
        parts.push(format!("code: {}", code));
    }
    if let Some(param) = param {
        parts.push(format!("param: {}", param));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl Error {
    /// Create an API error from just a message
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            code: None,
            param: None,
            status: None,
        }
    }

    /// Map onto the transport / api / parse failure families
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Api { .. }
            | Error::InvalidApiKey
            | Error::UnsupportedProvider(_)
            | Error::ModelNotFound(_) => ErrorKind::Api,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api {
                message,
                code,
                status,
                ..
            } => {
                let msg = message.to_lowercase();
                let code = code.as_deref().unwrap_or_default().to_lowercase();
                matches!(status, Some(429) | Some(500..=599))
                    || code.contains("rate_limit")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: Option<u16>, code: Option<&str>, message: &str) -> Error {
        Error::Api {
            message: message.to_string(),
            code: code.map(str::to_string),
            param: None,
            status,
        }
    }

    #[test]
    fn test_api_display_includes_details() {
        let e = Error::Api {
            message: "Invalid model".into(),
            code: Some("model_not_found".into()),
            param: Some("model".into()),
            status: Some(404),
        };
        assert_eq!(
            e.to_string(),
            "API error: Invalid model (status: 404, code: model_not_found, param: model)"
        );
    }

    #[test]
    fn test_api_display_without_details() {
        assert_eq!(Error::api("boom").to_string(), "API error: boom");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::api("x").kind(), ErrorKind::Api);
        assert_eq!(Error::Parse("x".into()).kind(), ErrorKind::Parse);
        assert_eq!(Error::InvalidApiKey.kind(), ErrorKind::Api);
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json_err).kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_retryable_status_codes() {
        assert!(api_error(Some(429), None, "slow down").is_retryable());
        assert!(api_error(Some(503), None, "unavailable").is_retryable());
        assert!(!api_error(Some(401), None, "bad key").is_retryable());
    }

    #[test]
    fn test_retryable_rate_limit_code() {
        assert!(api_error(None, Some("rate_limit_exceeded"), "x").is_retryable());
    }

    #[test]
    fn test_retryable_message_patterns() {
        assert!(api_error(None, None, "Model is overloaded").is_retryable());
        assert!(api_error(None, None, "Too many requests").is_retryable());
    }

    #[test]
    fn test_not_retryable_non_api() {
        assert!(!Error::InvalidApiKey.is_retryable());
        assert!(!Error::Parse("bad".into()).is_retryable());
        assert!(!Error::UnsupportedProvider("x".into()).is_retryable());
    }
}
