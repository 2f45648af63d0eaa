//! Suite configuration loaded from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// Browser family driven through WebDriver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }

    /// Driver binary looked up on PATH when none is configured
    pub fn default_driver_binary(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chromedriver",
            BrowserKind::Firefox => "geckodriver",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "firefox" | "gecko" => Ok(BrowserKind::Firefox),
            other => Err(E2eError::Config(format!("unsupported browser '{}'", other))),
        }
    }
}

/// Bounded waits used by the resolver and the flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Implicit element wait applied to the WebDriver session
    pub implicit: Duration,

    /// Upper bound for explicit wait-for-condition loops
    pub explicit: Duration,

    /// Page load timeout applied to the WebDriver session
    pub page_load: Duration,

    /// Delay between polls of a waited condition
    pub poll_interval: Duration,

    /// Pause after navigation and after actions whose effect is not observable
    pub settle: Duration,

    /// How long an optional confirm modal gets to appear
    pub modal_window: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit: Duration::from_secs(0),
            explicit: Duration::from_secs(20),
            page_load: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_millis(500),
            modal_window: Duration::from_millis(2000),
        }
    }
}

/// Configuration for one suite run
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Frontend base URL
    pub base_url: String,

    /// Backend API URL, probed for readiness before the run
    pub backend_url: String,

    pub headless: bool,

    pub browser: BrowserKind,

    /// Existing WebDriver endpoint; a driver process is spawned when unset
    pub webdriver_url: Option<String>,

    /// Driver binary to spawn (defaults per browser)
    pub webdriver_binary: Option<PathBuf>,

    pub timeouts: Timeouts,

    pub screenshot_on_failure: bool,

    pub screenshot_dir: PathBuf,

    /// YAML file with the test accounts
    pub fixtures_file: Option<PathBuf>,

    /// Output directory for results
    pub results_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            headless: false,
            browser: BrowserKind::Chrome,
            webdriver_url: None,
            webdriver_binary: None,
            timeouts: Timeouts::default(),
            screenshot_on_failure: true,
            screenshot_dir: PathBuf::from("screenshots"),
            fixtures_file: None,
            results_dir: PathBuf::from("test-results"),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeouts = Timeouts {
            implicit: seconds(&get, "IMPLICIT_WAIT", defaults.timeouts.implicit)?,
            explicit: seconds(&get, "EXPLICIT_WAIT", defaults.timeouts.explicit)?,
            page_load: seconds(&get, "PAGE_LOAD_TIMEOUT", defaults.timeouts.page_load)?,
            poll_interval: millis(&get, "POLL_INTERVAL_MS", defaults.timeouts.poll_interval)?,
            settle: millis(&get, "SETTLE_MS", defaults.timeouts.settle)?,
            modal_window: millis(&get, "MODAL_WINDOW_MS", defaults.timeouts.modal_window)?,
        };

        Ok(Self {
            base_url: get("BASE_URL").unwrap_or(defaults.base_url),
            backend_url: get("BACKEND_URL").unwrap_or(defaults.backend_url),
            headless: get("HEADLESS").map(|v| flag(&v)).unwrap_or(defaults.headless),
            browser: match get("BROWSER") {
                Some(v) => v.parse()?,
                None => defaults.browser,
            },
            webdriver_url: get("WEBDRIVER_URL"),
            webdriver_binary: get("WEBDRIVER_BINARY").map(PathBuf::from),
            timeouts,
            screenshot_on_failure: get("SCREENSHOT_ON_FAILURE")
                .map(|v| flag(&v))
                .unwrap_or(defaults.screenshot_on_failure),
            screenshot_dir: get("SCREENSHOT_DIR").map(PathBuf::from).unwrap_or(defaults.screenshot_dir),
            fixtures_file: get("FIXTURES_FILE").map(PathBuf::from),
            results_dir: get("RESULTS_DIR").map(PathBuf::from).unwrap_or(defaults.results_dir),
        })
    }

    /// `--headed` wins over whatever HEADLESS said
    pub fn with_headed(mut self, headed: bool) -> Self {
        if headed {
            self.headless = false;
        }
        self
    }

    /// Absolute URL for an application path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Driver binary to spawn when no WebDriver URL is configured
    pub fn driver_binary(&self) -> PathBuf {
        self.webdriver_binary
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.browser.default_driver_binary()))
    }
}

fn flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn seconds<F>(get: &F, key: &str, default: Duration) -> E2eResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_number(get, key).map(|n| n.map(Duration::from_secs).unwrap_or(default))
}

fn millis<F>(get: &F, key: &str, default: Duration) -> E2eResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_number(get, key).map(|n| n.map(Duration::from_millis).unwrap_or(default))
}

fn parse_number<F>(get: &F, key: &str) -> E2eResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| E2eError::Config(format!("{}='{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = SuiteConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert!(!config.headless);
        assert_eq!(config.browser, BrowserKind::Chrome);
        assert_eq!(config.timeouts.explicit, Duration::from_secs(20));
        assert_eq!(config.timeouts.page_load, Duration::from_secs(30));
        assert!(config.screenshot_on_failure);
        assert_eq!(config.screenshot_dir, PathBuf::from("screenshots"));
        assert!(config.webdriver_url.is_none());
    }

    #[test]
    fn environment_overrides() {
        let config = SuiteConfig::from_lookup(lookup(&[
            ("BASE_URL", "http://app.test:3000/"),
            ("HEADLESS", "TRUE"),
            ("BROWSER", "firefox"),
            ("EXPLICIT_WAIT", "5"),
            ("SETTLE_MS", "0"),
            ("SCREENSHOT_ON_FAILURE", "false"),
            ("WEBDRIVER_URL", "http://127.0.0.1:4444"),
        ]))
        .unwrap();
        assert!(config.headless);
        assert_eq!(config.browser, BrowserKind::Firefox);
        assert_eq!(config.timeouts.explicit, Duration::from_secs(5));
        assert_eq!(config.timeouts.settle, Duration::ZERO);
        assert!(!config.screenshot_on_failure);
        assert_eq!(config.webdriver_url.as_deref(), Some("http://127.0.0.1:4444"));
        assert_eq!(config.url("/auth/login"), "http://app.test:3000/auth/login");
    }

    #[test]
    fn headed_flag_overrides_headless() {
        let config = SuiteConfig::from_lookup(lookup(&[("HEADLESS", "true")])).unwrap();
        assert!(!config.clone().with_headed(true).headless);
        assert!(config.with_headed(false).headless);
    }

    #[test]
    fn rejects_bad_numbers_and_browsers() {
        assert!(SuiteConfig::from_lookup(lookup(&[("EXPLICIT_WAIT", "soon")])).is_err());
        assert!(SuiteConfig::from_lookup(lookup(&[("BROWSER", "netscape")])).is_err());
    }

    #[test]
    fn driver_binary_follows_browser() {
        let mut config = SuiteConfig::default();
        assert_eq!(config.driver_binary(), PathBuf::from("chromedriver"));
        config.browser = BrowserKind::Firefox;
        assert_eq!(config.driver_binary(), PathBuf::from("geckodriver"));
    }
}
