//! Ordered locator strategies and the resolver that evaluates them

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::Timeouts;
use crate::driver::{Browser, Strategy};
use crate::error::{E2eError, E2eResult};

/// Whether a strategy is looked up once or polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Immediate,
    Await,
}

/// A labelled, ordered list of ways to find one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    label: String,
    entries: Vec<(Strategy, Presence)>,
}

impl Locator {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
        }
    }

    pub fn or(mut self, strategy: Strategy) -> Self {
        self.entries.push((strategy, Presence::Immediate));
        self
    }

    pub fn or_await(mut self, strategy: Strategy) -> Self {
        self.entries.push((strategy, Presence::Await));
        self
    }

    /// A button or link showing any of `texts`, buttons preferred per text
    pub fn clickable(label: impl Into<String>, texts: &[&str]) -> Self {
        Self::new(label).or_texts(texts)
    }

    /// Test id first, then a button or link showing any of `texts`
    pub fn action(test_id: &str, texts: &[&str]) -> Self {
        Self::new(test_id).or(Strategy::test_id(test_id)).or_texts(texts)
    }

    fn or_texts(self, texts: &[&str]) -> Self {
        texts.iter().fold(self, |locator, text| {
            locator
                .or(Strategy::button_text(*text))
                .or(Strategy::link_text(*text))
        })
    }

    /// Test id first, then the given fallbacks
    pub fn field(test_id: &str, fallbacks: &[Strategy]) -> Self {
        fallbacks
            .iter()
            .cloned()
            .fold(Self::new(test_id).or(Strategy::test_id(test_id)), Locator::or)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entries(&self) -> &[(Strategy, Presence)] {
        &self.entries
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Outcome of resolving a [`Locator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<E> {
    Found(E),
    NotFound,
}

impl<E> Resolution<E> {
    pub fn found(self) -> Option<E> {
        match self {
            Resolution::Found(element) => Some(element),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Evaluates locators against a browser with bounded waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Resolver {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_timeouts(timeouts: &Timeouts) -> Self {
        Self::new(timeouts.explicit, timeouts.poll_interval)
    }

    /// Try each strategy in order; the first one that yields an element wins.
    ///
    /// Lookup errors count as a miss for that strategy. Never fails.
    pub async fn resolve<B: Browser>(&self, browser: &B, locator: &Locator) -> Resolution<B::Element> {
        for (strategy, presence) in &locator.entries {
            let window = match presence {
                Presence::Immediate => Duration::ZERO,
                Presence::Await => self.timeout,
            };
            if let Some(element) = self.poll(browser, strategy, window).await {
                debug!("{}: found via {}", locator.label, strategy);
                return Resolution::Found(element);
            }
        }
        debug!("{}: not found", locator.label);
        Resolution::NotFound
    }

    /// Like [`Resolver::resolve`], failing with `ElementNotFound` on a miss
    pub async fn require<B: Browser>(&self, browser: &B, locator: &Locator) -> E2eResult<B::Element> {
        self.resolve(browser, locator)
            .await
            .found()
            .ok_or_else(|| E2eError::ElementNotFound(locator.label.clone()))
    }

    /// Poll every strategy, in order each round, until one appears or
    /// `window` closes
    pub async fn resolve_within<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        window: Duration,
    ) -> Resolution<B::Element> {
        let deadline = Instant::now() + window;
        loop {
            for (strategy, _) in &locator.entries {
                if let Ok(Some(element)) = browser.find(strategy).await {
                    debug!("{}: appeared via {}", locator.label, strategy);
                    return Resolution::Found(element);
                }
            }
            if Instant::now() >= deadline {
                return Resolution::NotFound;
            }
            sleep(self.poll_interval.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }

    /// Click the element if it resolves; `Ok(false)` when it does not
    pub async fn click<B: Browser>(&self, browser: &B, locator: &Locator) -> E2eResult<bool> {
        match self.resolve(browser, locator).await {
            Resolution::Found(element) => {
                browser.click(&element).await?;
                Ok(true)
            }
            Resolution::NotFound => Ok(false),
        }
    }

    async fn poll<B: Browser>(&self, browser: &B, strategy: &Strategy, window: Duration) -> Option<B::Element> {
        let deadline = Instant::now() + window;
        loop {
            match browser.find(strategy).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(e) => {
                    debug!("lookup {} failed: {}", strategy, e);
                    return None;
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.poll_interval.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }
}
