//! Card entry inside the payment processor's hosted iframes

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::driver::{Browser, Strategy};
use crate::error::E2eResult;
use crate::wait::wait_until;

/// Card typed into the hosted fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCard {
    pub number: String,
    /// Keystrokes for MM/YY, the field inserts the separator
    pub expiry: String,
    pub cvc: String,
}

impl Default for TestCard {
    fn default() -> Self {
        Self {
            number: "4242424242424242".to_string(),
            expiry: "1234".to_string(),
            cvc: "123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Number,
    Expiry,
    Cvc,
}

/// Classify a hosted input from its `aria-label` and `placeholder`
pub fn classify_card_input(aria_label: Option<&str>, placeholder: Option<&str>) -> Option<CardField> {
    let aria = aria_label.unwrap_or_default().to_lowercase();
    let placeholder = placeholder.unwrap_or_default().to_lowercase();

    if aria.contains("card") && aria.contains("number") {
        Some(CardField::Number)
    } else if aria.contains("exp") || placeholder.contains("mm / yy") {
        Some(CardField::Expiry)
    } else if aria.contains("cvc") || placeholder.contains("security") {
        Some(CardField::Cvc)
    } else {
        None
    }
}

/// Run `body` inside `frame`, returning to top-level content afterwards.
///
/// The default content is restored whether `body` succeeds, fails or
/// panics; a panic is resumed after the restore.
pub async fn within_frame<'b, B, F, Fut, T>(browser: &'b B, frame: &B::Element, body: F) -> E2eResult<T>
where
    B: Browser,
    F: FnOnce(&'b B) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    if let Err(e) = browser.enter_frame(frame).await {
        let _ = browser.enter_default_frame().await;
        return Err(e);
    }

    let outcome = AssertUnwindSafe(body(browser)).catch_unwind().await;
    let restored = browser.enter_default_frame().await;

    match outcome {
        Ok(result) => {
            let value = result?;
            restored?;
            Ok(value)
        }
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Find the hosted card fields across every iframe and type `card`.
///
/// Waits up to `timeout` for an iframe to exist. Frames whose scan fails
/// are skipped. `Ok(false)` when no frame holds a card-number input.
pub async fn fill_card<B: Browser>(
    browser: &B,
    card: &TestCard,
    timeout: Duration,
    poll_interval: Duration,
) -> E2eResult<bool> {
    let iframe = Strategy::css("iframe");

    let appeared = wait_until(timeout, poll_interval, || async {
        Ok(!browser.find_all(&iframe).await.unwrap_or_default().is_empty())
    })
    .await?;
    if !appeared {
        warn!("No payment iframe appeared within {:?}", timeout);
        return Ok(false);
    }

    let frames = browser.find_all(&iframe).await?;
    debug!("Scanning {} iframe(s) for card fields", frames.len());

    for (index, frame) in frames.iter().enumerate() {
        match within_frame(browser, frame, |b| fill_in_frame(b, card)).await {
            Ok(true) => {
                info!("Card details entered in iframe {}", index);
                return Ok(true);
            }
            Ok(false) => {}
            Err(e) => warn!("Skipping iframe {}: {}", index, e),
        }
    }

    warn!("No card number field found in {} iframe(s)", frames.len());
    Ok(false)
}

async fn fill_in_frame<B: Browser>(browser: &B, card: &TestCard) -> E2eResult<bool> {
    let mut number = None;
    let mut expiry = None;
    let mut cvc = None;

    for input in browser.find_all(&Strategy::css("input")).await? {
        let aria = browser.attribute(&input, "aria-label").await?;
        let placeholder = browser.attribute(&input, "placeholder").await?;
        let slot = match classify_card_input(aria.as_deref(), placeholder.as_deref()) {
            Some(CardField::Number) => &mut number,
            Some(CardField::Expiry) => &mut expiry,
            Some(CardField::Cvc) => &mut cvc,
            None => continue,
        };
        if slot.is_none() {
            *slot = Some(input);
        }
    }

    let Some(number) = number else {
        return Ok(false);
    };
    browser.send_keys(&number, &card.number).await?;
    if let Some(expiry) = expiry {
        browser.send_keys(&expiry, &card.expiry).await?;
    }
    if let Some(cvc) = cvc {
        browser.send_keys(&cvc, &card.cvc).await?;
    }
    Ok(true)
}
