//! Validation helper functions for configuration types.

use url::Url;

use crate::core::errors::{Result, SonarGateError};

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(SonarGateError::config_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a string is present and not just whitespace.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SonarGateError::config_field(
            format!("{} is required", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an optional string, when set, is not blank.
pub fn validate_optional_non_empty(value: Option<&str>, field: &str) -> Result<()> {
    match value {
        Some(v) => validate_non_empty(v, field),
        None => Ok(()),
    }
}

/// Validate that a value parses as an absolute http(s) URL.
pub fn validate_http_url(value: &str, field: &str) -> Result<()> {
    validate_non_empty(value, field)?;
    let parsed = Url::parse(value.trim()).map_err(|e| {
        SonarGateError::config_field(format!("{} is not a valid URL: {}", field, e), field)
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SonarGateError::config_field(
            format!("{} must use http or https, got '{}'", field, other),
            field,
        )),
    }
}

/// Validate that an i32 value is within a bounded range (inclusive).
pub fn validate_bounded_i32(value: i32, min: i32, max: i32, field: &str) -> Result<()> {
    if value < min || value > max {
        return Err(SonarGateError::config_field(
            format!("{} must be between {} and {}", field, min, max),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_u64() {
        assert!(validate_positive_u64(1, "gate.timeout_secs").is_ok());
        let err = validate_positive_u64(0, "gate.timeout_secs").unwrap_err();
        assert!(err.to_string().contains("gate.timeout_secs"));
    }

    #[test]
    fn test_non_empty() {
        assert!(validate_non_empty("token", "server.token").is_ok());
        assert!(validate_non_empty("  ", "server.token").is_err());
        assert!(validate_optional_non_empty(None, "project.branch").is_ok());
        assert!(validate_optional_non_empty(Some(""), "project.branch").is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(validate_http_url("https://sonar.example.com", "server.host").is_ok());
        assert!(validate_http_url("http://localhost:9000/", "server.host").is_ok());
        assert!(validate_http_url("ftp://sonar.example.com", "server.host").is_err());
        assert!(validate_http_url("sonar.example.com", "server.host").is_err());
        assert!(validate_http_url("", "server.host").is_err());
    }

    #[test]
    fn test_bounded_i32() {
        assert!(validate_bounded_i32(1, 1, 255, "gate.error_exit_code").is_ok());
        assert!(validate_bounded_i32(0, 1, 255, "gate.error_exit_code").is_err());
        assert!(validate_bounded_i32(256, 1, 255, "gate.error_exit_code").is_err());
    }
}
