//! Main test runner that sequences cases over fresh browser sessions

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::driver::{Browser, Launcher};
use crate::error::{E2eError, E2eResult};
use crate::fixtures::Fixtures;
use crate::flows::{Session, StepOutcome};
use crate::screenshot::{capture_failure, ScreenshotRecord};
use crate::state::FlowState;
use crate::suite::{Case, Group};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of running a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub group: Group,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    /// Why the case skipped itself
    pub reason: Option<String>,
    pub screenshot: Option<ScreenshotRecord>,
}

/// Result of running a list of cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs cases one after another, each in its own browser session
pub struct TestRunner<L: Launcher> {
    launcher: L,
    config: SuiteConfig,
    fixtures: Fixtures,
    /// Flow state per group, reset at the start of every run
    states: HashMap<Group, FlowState>,
}

impl<L: Launcher> TestRunner<L> {
    pub fn new(launcher: L, config: SuiteConfig, fixtures: Fixtures) -> Self {
        Self {
            launcher,
            config,
            fixtures,
            states: HashMap::new(),
        }
    }

    pub fn launcher_mut(&mut self) -> &mut L {
        &mut self.launcher
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Flow state a group ended with in the last run
    pub fn state(&self, group: Group) -> Option<&FlowState> {
        self.states.get(&group)
    }

    pub async fn run_all(&mut self) -> TestSuiteResult {
        self.run_cases(&Case::ALL).await
    }

    pub async fn run_group(&mut self, group: Group) -> TestSuiteResult {
        self.run_cases(&Case::in_group(group)).await
    }

    /// Run a specific case by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let case = Case::by_name(name).ok_or_else(|| E2eError::Config(format!("Test not found: {}", name)))?;
        Ok(self.run_cases(&[case]).await)
    }

    /// Run a list of cases in order
    pub async fn run_cases(&mut self, cases: &[Case]) -> TestSuiteResult {
        let start = Instant::now();
        self.states.clear();
        let mut results = Vec::with_capacity(cases.len());
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        info!("Running {} test(s)...", cases.len());

        for case in cases {
            let result = self.run_case(*case).await;
            match result.status {
                TestStatus::Passed => {
                    passed += 1;
                    info!("✓ {} ({} ms)", result.name, result.duration_ms);
                }
                TestStatus::Skipped => {
                    skipped += 1;
                    info!("- {} skipped: {}", result.name, result.reason.as_deref().unwrap_or(""));
                }
                TestStatus::Failed => {
                    failed += 1;
                    error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                }
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!("Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms);

        TestSuiteResult {
            total: cases.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run one case in a fresh session. The session is quit on every path.
    pub async fn run_case(&mut self, case: Case) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", case);

        let browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                return TestResult {
                    name: case.name().to_string(),
                    group: case.group(),
                    status: TestStatus::Failed,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: Some(format!("browser session could not start: {}", e)),
                    reason: None,
                    screenshot: None,
                };
            }
        };

        let state = self.states.entry(case.group()).or_default();
        let outcome = {
            let session = Session::new(&browser, &self.config);
            AssertUnwindSafe(case.run(&session, &self.fixtures, state))
                .catch_unwind()
                .await
        };

        let (status, error, reason) = match outcome {
            Ok(Ok(StepOutcome::Passed)) => (TestStatus::Passed, None, None),
            Ok(Ok(StepOutcome::Skipped(reason))) => (TestStatus::Skipped, None, Some(reason)),
            Ok(Err(e)) => (TestStatus::Failed, Some(e.to_string()), None),
            Err(panic) => (TestStatus::Failed, Some(format!("panicked: {}", panic_message(&*panic))), None),
        };

        let mut screenshot = None;
        if status == TestStatus::Failed && self.config.screenshot_on_failure {
            match capture_failure(&browser, &self.config.screenshot_dir, case.name()).await {
                Ok(record) => screenshot = Some(record),
                Err(e) => warn!("Could not capture screenshot for {}: {}", case, e),
            }
        }

        if let Err(e) = browser.quit().await {
            warn!("Failed to close browser session for {}: {}", case, e);
        }

        TestResult {
            name: case.name().to_string(),
            group: case.group(),
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            error,
            reason,
            screenshot,
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.results_dir)?;

        let path = self.config.results_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TestStatus::Skipped).unwrap(), "\"skipped\"");
    }

    #[test]
    fn panic_payloads_become_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
