//! Business steps of the LocalGuide booking workflow
//!
//! Every step drives one [`Session`] and reports a [`StepOutcome`]. Steps
//! that need identifiers left by earlier steps read them from
//! [`crate::state::FlowState`] and skip when they are missing.

pub mod auth;
pub mod booking;
pub mod no_show;
pub mod trip_offer;
pub mod trip_require;

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::SuiteConfig;
use crate::driver::{Browser, Strategy};
use crate::error::{E2eError, E2eResult};
use crate::input::{self, InputOutcome};
use crate::locator::{Locator, Resolution, Resolver};
use crate::state::BookingStatus;
use crate::wait::wait_until;

/// Buttons that acknowledge a confirmation modal
pub const CONFIRM_TEXTS: &[&str] = &["ยืนยัน", "Confirm", "OK"];

/// Inline validation and API error banners
pub const ERROR_INDICATOR: &str = "div.text-red-700, div.text-red-600, .error-message";

/// Result of a step that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Skipped(String),
}

impl StepOutcome {
    /// Skip with a logged warning
    pub fn skipped(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Skipping: {}", reason);
        StepOutcome::Skipped(reason)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }
}

/// A browser session plus the settings the steps need
pub struct Session<'a, B: Browser> {
    pub browser: &'a B,
    pub config: &'a SuiteConfig,
    pub resolver: Resolver,
}

impl<'a, B: Browser> Session<'a, B> {
    pub fn new(browser: &'a B, config: &'a SuiteConfig) -> Self {
        Self {
            browser,
            config,
            resolver: Resolver::from_timeouts(&config.timeouts),
        }
    }

    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// Navigate to an application path and let the page settle
    pub async fn open(&self, path: &str) -> E2eResult<()> {
        let url = self.url(path);
        debug!("Opening {}", url);
        self.browser.navigate(&url).await?;
        self.pause().await;
        Ok(())
    }

    pub async fn pause(&self) {
        let settle = self.config.timeouts.settle;
        if settle > Duration::ZERO {
            sleep(settle).await;
        }
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        self.browser.current_url().await
    }

    pub async fn page_contains(&self, text: &str) -> E2eResult<bool> {
        Ok(self.browser.page_source().await?.contains(text))
    }

    /// Case-insensitive check for any of `texts`
    pub async fn page_contains_any(&self, texts: &[&str]) -> E2eResult<bool> {
        let source = self.browser.page_source().await?.to_lowercase();
        Ok(texts.iter().any(|t| source.contains(&t.to_lowercase())))
    }

    /// Status code shown on the current booking page, if any
    pub async fn booking_status(&self) -> E2eResult<Option<BookingStatus>> {
        Ok(BookingStatus::detect(&self.browser.page_source().await?))
    }

    pub async fn resolve(&self, locator: &Locator) -> Resolution<B::Element> {
        self.resolver.resolve(self.browser, locator).await
    }

    /// Fill a required field. A rejected value is logged and reported in the
    /// outcome; the caller carries on with the rest of the form.
    pub async fn fill(&self, locator: &Locator, text: &str) -> E2eResult<InputOutcome> {
        let element = self.resolver.require(self.browser, locator).await?;
        let outcome = input::set_value(self.browser, &element, text).await;
        log_rejection(locator, &outcome);
        Ok(outcome)
    }

    /// Fill a field that may not exist on this version of the page
    pub async fn fill_optional(&self, locator: &Locator, text: &str) -> Option<InputOutcome> {
        let element = self.resolve(locator).await.found()?;
        let outcome = input::set_value(self.browser, &element, text).await;
        log_rejection(locator, &outcome);
        Some(outcome)
    }

    /// Fill a field of a modal that may still be opening
    pub async fn fill_within(&self, locator: &Locator, text: &str) -> Option<InputOutcome> {
        let element = self
            .resolver
            .resolve_within(self.browser, locator, self.config.timeouts.modal_window)
            .await
            .found()?;
        let outcome = input::set_value(self.browser, &element, text).await;
        log_rejection(locator, &outcome);
        Some(outcome)
    }

    pub async fn fill_date_optional(&self, locator: &Locator, date: NaiveDate) -> Option<InputOutcome> {
        let element = self.resolve(locator).await.found()?;
        let outcome = input::set_date(self.browser, &element, date).await;
        log_rejection(locator, &outcome);
        Some(outcome)
    }

    pub async fn select_optional(&self, locator: &Locator, index: usize) -> Option<InputOutcome> {
        let element = self.resolve(locator).await.found()?;
        let outcome = input::select_index(self.browser, &element, index).await;
        log_rejection(locator, &outcome);
        Some(outcome)
    }

    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let element = self.resolver.require(self.browser, locator).await?;
        self.browser.click(&element).await
    }

    /// Click when present; `Ok(false)` when the element never resolved
    pub async fn click_optional(&self, locator: &Locator) -> E2eResult<bool> {
        self.resolver.click(self.browser, locator).await
    }

    /// Acknowledge a confirmation modal if one shows up within the modal window.
    ///
    /// Buttons inside a dialog container win; otherwise the label must match
    /// exactly, so the button that opened the modal is never pressed again.
    pub async fn confirm_modal(&self) -> E2eResult<bool> {
        let locator = confirm_locator();
        match self
            .resolver
            .resolve_within(self.browser, &locator, self.config.timeouts.modal_window)
            .await
        {
            Resolution::Found(button) => {
                self.browser.click(&button).await?;
                self.pause().await;
                Ok(true)
            }
            Resolution::NotFound => {
                debug!("No confirmation modal appeared");
                Ok(false)
            }
        }
    }

    /// Wait up to the explicit timeout for the URL to satisfy `predicate`
    pub async fn wait_for_url<F>(&self, predicate: F) -> E2eResult<bool>
    where
        F: Fn(&str) -> bool,
    {
        let browser = self.browser;
        let predicate = &predicate;
        wait_until(self.config.timeouts.explicit, self.config.timeouts.poll_interval, move || async move {
            Ok::<_, E2eError>(predicate(&browser.current_url().await?))
        })
        .await
    }

    /// Whether a visible error banner is on the page
    pub async fn error_shown(&self) -> E2eResult<bool> {
        for element in self.browser.find_all(&Strategy::css(ERROR_INDICATOR)).await? {
            if self.browser.is_displayed(&element).await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Poll up to `window` for an error banner
    pub async fn wait_for_error(&self, window: Duration) -> E2eResult<bool> {
        wait_until(window, self.config.timeouts.poll_interval, || self.error_shown()).await
    }
}

fn confirm_locator() -> Locator {
    let in_dialog = CONFIRM_TEXTS
        .iter()
        .fold(Locator::new("confirm modal"), |l, text| l.or(Strategy::dialog_button(*text)));
    CONFIRM_TEXTS
        .iter()
        .fold(in_dialog, |l, text| l.or(Strategy::button_exact(*text)))
}

fn log_rejection(locator: &Locator, outcome: &InputOutcome) {
    if let InputOutcome::Failed(reason) = outcome {
        warn!("Could not set {}: {}", locator.label(), reason);
    }
}

/// Random suffix used to make created titles unique
pub(crate) fn random_suffix(low: u32, high: u32) -> u32 {
    use rand::Rng;
    rand::thread_rng().gen_range(low..=high)
}
