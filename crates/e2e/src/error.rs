//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("WebDriver failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error("WebDriver binary not found: {0}. Install chromedriver or geckodriver, or set WEBDRIVER_URL")]
    DriverNotFound(String),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Invalid element state: {0}")]
    InvalidElementState(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether the browser refused direct keystrokes for the element.
    pub fn is_invalid_element_state(&self) -> bool {
        matches!(self, E2eError::InvalidElementState(_))
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        E2eError::AssertionFailed(message.into())
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail with an assertion error unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::assertion(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_maps_false_to_assertion() {
        assert!(ensure(true, "never").is_ok());
        let err = ensure(false, "still on /auth/login").unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: still on /auth/login");
    }

    #[test]
    fn invalid_element_state_is_distinguished() {
        assert!(E2eError::InvalidElementState("readonly".into()).is_invalid_element_state());
        assert!(!E2eError::WebDriver("stale".into()).is_invalid_element_state());
    }
}
