//! Error types for the sonargate-rs library.
//!
//! Every failure the quality gate step can hit is a variant of
//! [`SonarGateError`]. Variants carry enough context (URL, status code, task id)
//! for the CLI to print an actionable message, and [`SonarGateError::kind`]
//! collapses them into the coarse categories the caller uses to pick an exit path.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main result type for sonargate operations.
pub type Result<T> = std::result::Result<T, SonarGateError>;

/// Coarse error categories used for reporting and exit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout, or non-auth HTTP failure
    Transport,
    /// Both authentication schemes were rejected
    Auth,
    /// Response body could not be decoded
    Decode,
    /// Search returned no analyses
    EmptyResult,
    /// Polling deadline elapsed before the task finished
    GateTimeout,
    /// Remote task reached the ERROR state
    GateFailed,
    /// Local input (descriptor, config, report file) problem
    Local,
}

/// Comprehensive error type for all sonargate operations.
#[derive(Error, Debug)]
pub enum SonarGateError {
    /// Network-level failure: connection refused, DNS, request timeout
    #[error("Transport error calling {url}: {message}")]
    Transport {
        /// Request URL
        url: String,
        /// Error description
        message: String,
        /// Underlying transport error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Basic and Bearer authentication were both rejected
    #[error("Authentication rejected by {url} (HTTP {status}); check the token")]
    Auth {
        /// Request URL
        url: String,
        /// Final status code (401 or 403)
        status: u16,
    },

    /// Non-2xx, non-auth response; may succeed if the caller retries later
    #[error("Upstream error from {url}: HTTP {status}")]
    Upstream {
        /// Request URL
        url: String,
        /// Status code returned
        status: u16,
        /// Truncated response body for diagnostics
        body: Option<String>,
    },

    /// The server answered 2xx with an empty body
    #[error("Received empty response from {url}")]
    EmptyResponse {
        /// Request URL
        url: String,
    },

    /// JSON payload was malformed or lacked required fields
    #[error("Decode error: {message}")]
    Decode {
        /// Error description
        message: String,
        /// Payload being decoded
        data_type: Option<String>,
        /// Underlying decode error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The analysis search succeeded but listed nothing
    #[error("No analyses found for project {project}")]
    EmptyResult {
        /// Project that was searched
        project: String,
    },

    /// The task never reached a terminal state within the deadline
    #[error("Timed out after {}s waiting for task {task_id}", .waited.as_secs())]
    GateTimeout {
        /// Task being waited on
        task_id: String,
        /// Time spent polling
        waited: Duration,
        /// Last status observed, if any poll completed
        last_status: Option<String>,
    },

    /// The remote task finished in the ERROR state
    #[error("Analysis task {task_id} finished with status {status}")]
    GateFailed {
        /// Task that failed
        task_id: String,
        /// Terminal status reported by the server
        status: String,
    },

    /// The scanner descriptor file was missing or malformed
    #[error("Scan descriptor error ({path}): {message}")]
    Descriptor {
        /// Descriptor path
        path: String,
        /// Error description
        message: String,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Report rendering or parsing errors
    #[error("Report error: {message}")]
    Report {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl SonarGateError {
    /// Create a new transport error for a request URL
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new authentication error
    pub fn auth(url: impl Into<String>, status: u16) -> Self {
        Self::Auth {
            url: url.into(),
            status,
        }
    }

    /// Create a new upstream (non-2xx) error, keeping at most 512 bytes of body
    pub fn upstream(url: impl Into<String>, status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = if body.is_empty() {
            None
        } else {
            let mut end = body.len().min(512);
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            Some(body[..end].to_string())
        };
        Self::Upstream {
            url: url.into(),
            status,
            body,
        }
    }

    /// Create a new empty-response error
    pub fn empty_response(url: impl Into<String>) -> Self {
        Self::EmptyResponse { url: url.into() }
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            data_type: None,
            source: None,
        }
    }

    /// Create a decode error for a named payload, keeping the serde error as source
    pub fn decode_json(data_type: impl Into<String>, err: serde_json::Error) -> Self {
        let data_type = data_type.into();
        Self::Decode {
            message: format!("{data_type}: {err}"),
            data_type: Some(data_type),
            source: Some(Box::new(err)),
        }
    }

    /// Create a new empty-result error
    pub fn empty_result(project: impl Into<String>) -> Self {
        Self::EmptyResult {
            project: project.into(),
        }
    }

    /// Create a new descriptor error
    pub fn descriptor(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Report { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Io { message, .. } => {
                *message = format!("{}: {message}", context.into());
            }
            _ => {} // Other variants already carry their own location
        }
        self
    }

    /// Coarse category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::Upstream { .. } | Self::EmptyResponse { .. } => {
                ErrorKind::Transport
            }
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::GateTimeout { .. } => ErrorKind::GateTimeout,
            Self::GateFailed { .. } => ErrorKind::GateFailed,
            Self::Descriptor { .. }
            | Self::Io { .. }
            | Self::Config { .. }
            | Self::Validation { .. }
            | Self::Report { .. } => ErrorKind::Local,
        }
    }

    /// True when the run ended without the server ever producing a verdict
    /// because the analysis task itself did not complete.
    pub fn is_no_verdict(&self) -> bool {
        matches!(self.kind(), ErrorKind::GateTimeout | ErrorKind::GateFailed)
    }
}

// Implement From traits for common error types
impl From<io::Error> for SonarGateError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for SonarGateError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode_json("JSON", err)
    }
}

impl From<serde_yaml::Error> for SonarGateError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config {
            message: format!("YAML parsing failed: {err}"),
            field: None,
        }
    }
}

impl From<url::ParseError> for SonarGateError {
    fn from(err: url::ParseError) -> Self {
        Self::validation(format!("Invalid URL: {err}"))
    }
}

impl From<quick_xml::Error> for SonarGateError {
    fn from(err: quick_xml::Error) -> Self {
        Self::report(format!("XML processing failed: {err}"))
    }
}

impl From<reqwest::Error> for SonarGateError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            err.to_string()
        };
        Self::Transport {
            url,
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SonarGateError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            SonarGateError::transport("http://x", "boom").kind(),
            ErrorKind::Transport
        );
        assert_eq!(SonarGateError::auth("http://x", 401).kind(), ErrorKind::Auth);
        assert_eq!(
            SonarGateError::upstream("http://x", 502, "").kind(),
            ErrorKind::Transport
        );
        assert_eq!(SonarGateError::decode("bad").kind(), ErrorKind::Decode);
        assert_eq!(
            SonarGateError::empty_result("proj").kind(),
            ErrorKind::EmptyResult
        );
        assert_eq!(
            SonarGateError::descriptor("report-task.txt", "missing").kind(),
            ErrorKind::Local
        );
    }

    #[test]
    fn test_no_verdict_distinguishes_timeout_and_failure() {
        let timeout = SonarGateError::GateTimeout {
            task_id: "AX1".to_string(),
            waited: Duration::from_secs(300),
            last_status: Some("IN_PROGRESS".to_string()),
        };
        let failed = SonarGateError::GateFailed {
            task_id: "AX1".to_string(),
            status: "ERROR".to_string(),
        };
        assert!(timeout.is_no_verdict());
        assert!(failed.is_no_verdict());
        assert!(!SonarGateError::auth("http://x", 403).is_no_verdict());
        assert_eq!(
            timeout.to_string(),
            "Timed out after 300s waiting for task AX1"
        );
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let body = "x".repeat(2000);
        let err = SonarGateError::upstream("http://x", 500, &body);
        if let SonarGateError::Upstream { body, status, .. } = err {
            assert_eq!(status, 500);
            assert_eq!(body.map(|b| b.len()), Some(512));
        } else {
            panic!("Expected Upstream error");
        }

        let err = SonarGateError::upstream("http://x", 500, "   ");
        assert!(matches!(err, SonarGateError::Upstream { body: None, .. }));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: SonarGateError = json_err.into();

        if let SonarGateError::Decode { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Decode error");
        }
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: SonarGateError = yaml_err.into();
        assert!(matches!(err, SonarGateError::Config { .. }));
    }

    #[test]
    fn test_result_ext_with_context() {
        let result: std::result::Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));

        let err = result
            .with_context(|| "Reading descriptor".to_string())
            .unwrap_err();
        if let SonarGateError::Io { message, .. } = err {
            assert!(message.starts_with("Reading descriptor"));
        } else {
            panic!("Expected Io error");
        }
    }

    #[test]
    fn test_report_context() {
        let err = SonarGateError::report("bad xml").with_context("junit");
        if let SonarGateError::Report { context, .. } = err {
            assert_eq!(context, Some("junit".to_string()));
        } else {
            panic!("Expected Report error");
        }
    }
}
