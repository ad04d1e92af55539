//! Code execution forwarding
//!
//! `POST /api/execute` takes `{language, source}`, checks the language against
//! a fixed list and forwards the program to a Piston-compatible execution
//! service. A successful upstream body is relayed untouched.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

const DEFAULT_API_URL: &str = "https://emkc.org/api/v2/piston/execute";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Languages the editor offers. Aliases are not accepted.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "java",
    "c",
    "cpp",
    "go",
    "rust",
    "ruby",
    "php",
    "csharp",
    "bash",
];

/// Errors surfaced to the caller of the execute endpoint
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Execution service rate limit exceeded, try again later")]
    RateLimited,

    #[error("Execution service request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Execution service failed: {0}")]
    Upstream(String),
}

impl ExecuteError {
    pub fn status(&self) -> StatusCode {
        match self {
            ExecuteError::MissingField(_) | ExecuteError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            }
            ExecuteError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ExecuteError::Timeout(_) | ExecuteError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ExecuteError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Body of `POST /api/execute`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    pub language: Option<String>,
    pub source: Option<String>,
}

impl ExecuteRequest {
    /// Check required fields and the language, returning `(language, source)`
    pub fn validate(self) -> Result<(String, String), ExecuteError> {
        let language = self
            .language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or(ExecuteError::MissingField("language"))?;
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .ok_or(ExecuteError::MissingField("source"))?;

        if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
            return Err(ExecuteError::UnsupportedLanguage(language));
        }
        Ok((language, source))
    }
}

#[derive(Debug, Serialize)]
struct PistonRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<PistonFile<'a>>,
}

#[derive(Debug, Serialize)]
struct PistonFile<'a> {
    content: &'a str,
}

/// Configuration for the execution service
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ExecuteConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let api_url = std::env::var("EXECUTE_API_URL")
            .ok()
            .and_then(|url| {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match std::env::var("EXECUTE_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        "Invalid EXECUTE_TIMEOUT_SECS '{}', using {}s",
                        raw,
                        DEFAULT_TIMEOUT_SECS
                    );
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
                }
            },
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Self { api_url, timeout }
    }
}

/// Forwards programs to the execution service
pub struct Executor {
    config: ExecuteConfig,
    client: reqwest::Client,
}

impl Executor {
    pub fn new(config: ExecuteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                reqwest::Client::new()
            });
        Self { config, client }
    }

    /// Run `source` upstream and return the raw response body
    pub async fn execute(&self, language: &str, source: &str) -> Result<Bytes, ExecuteError> {
        let payload = PistonRequest {
            language,
            version: "*",
            files: vec![PistonFile { content: source }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecuteError::Timeout(self.config.timeout)
                } else {
                    ExecuteError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ExecuteError::RateLimited);
        }
        if !status.is_success() {
            return Err(ExecuteError::Upstream(format!("status {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| ExecuteError::Upstream(format!("Failed to read response: {}", e)))
    }
}

/// Forward a program to the execution service.
///
/// POST /api/execute
pub async fn execute_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    let (language, source) = match request.validate() {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!("Rejected execute request: {}", e);
            return e.into_response();
        }
    };

    tracing::info!("Executing {} program ({} bytes)", language, source.len());
    match state.executor.execute(&language, &source).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Execution failed: {}", e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(language: Option<&str>, source: Option<&str>) -> ExecuteRequest {
        ExecuteRequest {
            language: language.map(String::from),
            source: source.map(String::from),
        }
    }

    #[test]
    fn test_validate_accepts_supported_language() {
        let (language, source) = request(Some("python"), Some("print(1)"))
            .validate()
            .unwrap();
        assert_eq!(language, "python");
        assert_eq!(source, "print(1)");
    }

    #[test]
    fn test_validate_missing_fields() {
        let err = request(None, Some("print(1)")).validate().unwrap_err();
        assert!(matches!(err, ExecuteError::MissingField("language")));

        let err = request(Some("python"), Some("   ")).validate().unwrap_err();
        assert!(matches!(err, ExecuteError::MissingField("source")));
    }

    #[test]
    fn test_validate_unsupported_language() {
        let err = request(Some("py"), Some("print(1)")).validate().unwrap_err();
        assert!(matches!(err, ExecuteError::UnsupportedLanguage(ref l) if l == "py"));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ExecuteError::MissingField("source").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExecuteError::UnsupportedLanguage("cobol".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExecuteError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ExecuteError::Upstream("boom".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ExecuteError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_default_config() {
        let config = ExecuteConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    #[serial_test::serial]
    fn test_config_from_env() {
        std::env::set_var("EXECUTE_API_URL", " http://localhost:2000/api/v2/execute ");
        std::env::set_var("EXECUTE_TIMEOUT_SECS", "3");
        let config = ExecuteConfig::from_env();
        assert_eq!(config.api_url, "http://localhost:2000/api/v2/execute");
        assert_eq!(config.timeout, Duration::from_secs(3));

        std::env::set_var("EXECUTE_API_URL", "");
        std::env::set_var("EXECUTE_TIMEOUT_SECS", "soon");
        let config = ExecuteConfig::from_env();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        std::env::set_var("EXECUTE_TIMEOUT_SECS", "0");
        let config = ExecuteConfig::from_env();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        std::env::remove_var("EXECUTE_API_URL");
        std::env::remove_var("EXECUTE_TIMEOUT_SECS");
    }
}
