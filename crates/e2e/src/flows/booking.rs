//! Offer acceptance, payment and trip confirmation

use tracing::{info, warn};

use super::auth::login;
use super::{Session, StepOutcome};
use crate::driver::{Browser, Strategy};
use crate::error::{ensure, E2eResult};
use crate::extract::trailing_id;
use crate::fixtures::TestUser;
use crate::locator::Locator;
use crate::payment::{fill_card, TestCard};
use crate::state::{FlowStage, FlowState};

pub const BOOKINGS_PATH: &str = "/trip-bookings";

/// Links to individual bookings on the bookings list
pub const BOOKING_LINKS: &str = "a[href*='/trip-bookings/']";

/// Heading of the offers page
pub const OFFERS_HEADING: &str = "ข้อเสนอที่ได้รับ";

const ACCEPT_TEXTS: &[&str] = &["ยอมรับข้อเสนอ", "เลือกไกด์", "Accept", "เลือกข้อเสนอนี้"];
const PAY_TEXTS: &[&str] = &["ชำระเงิน", "Pay", "Payment"];
const PAID_MARKERS: &[&str] = &["ชำระแล้ว", "paid"];
const ARRIVAL_TEXTS: &[&str] = &["ยืนยันไกด์มาถึงแล้ว", "Confirm Arrival"];
const COMPLETE_TEXTS: &[&str] = &["ยืนยันทริปเสร็จสิ้น", "Confirm Complete"];

pub fn offers_path(trip_require_id: u64) -> String {
    format!("/user/trip-requires/{}/offers", trip_require_id)
}

pub fn booking_path(trip_booking_id: u64) -> String {
    format!("{}/{}", BOOKINGS_PATH, trip_booking_id)
}

/// Open the offers received for the recorded trip request
pub async fn view_offers<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    let Some(require_id) = state.trip_require_id else {
        return Ok(StepOutcome::skipped("no trip request id from an earlier step"));
    };

    login(session, user).await?;
    session.open(&offers_path(require_id)).await?;

    let url = session.current_url().await?;
    ensure(
        session.page_contains(OFFERS_HEADING).await? || url.to_lowercase().contains("offers"),
        format!("offers page for trip request {} did not load", require_id),
    )?;

    let cards = session
        .browser
        .find_all(&Strategy::css("[class*='offer'], [class*='card']"))
        .await?;
    info!("Viewing {} offer card(s) for trip request {}", cards.len(), require_id);
    state.advance(FlowStage::OfferViewed);
    Ok(StepOutcome::Passed)
}

/// Accept an offer; the app creates a booking and redirects to it
pub async fn accept_offer<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    let Some(require_id) = state.trip_require_id else {
        return Ok(StepOutcome::skipped("no trip request id from an earlier step"));
    };

    login(session, user).await?;
    session.open(&offers_path(require_id)).await?;

    if !session.click_optional(&Locator::clickable("accept offer", ACCEPT_TEXTS)).await? {
        return Ok(StepOutcome::skipped(format!(
            "no accept button for trip request {}, it may have no offers yet",
            require_id
        )));
    }
    session.confirm_modal().await?;

    let redirected = session.wait_for_url(|url| url.contains(BOOKINGS_PATH)).await?;
    let url = session.current_url().await?;
    ensure(redirected, format!("accepting an offer did not lead to {}, now at {}", BOOKINGS_PATH, url))?;

    if url.contains(&format!("{}/", BOOKINGS_PATH)) {
        state.trip_booking_id = trailing_id(&url);
    }
    state.advance(FlowStage::BookingCreated);
    match state.trip_booking_id {
        Some(id) => info!("Offer accepted, booking {}", id),
        None => info!("Offer accepted"),
    }
    Ok(StepOutcome::Passed)
}

/// Id of the first booking on the bookings list, skipping payment links
pub async fn discover_booking<B: Browser>(session: &Session<'_, B>) -> E2eResult<Option<u64>> {
    session.open(BOOKINGS_PATH).await?;
    for link in session.browser.find_all(&Strategy::css(BOOKING_LINKS)).await? {
        let href = session.browser.attribute(&link, "href").await?.unwrap_or_default();
        if href.contains("/payment") {
            continue;
        }
        if let Some(id) = trailing_id(&href) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// Click "pay" on the booking page, landing on its payment page.
/// A booking that is already paid passes without clicking.
pub async fn start_payment<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    login(session, user).await?;

    let booking_id = match state.trip_booking_id {
        Some(id) => id,
        None => match discover_booking(session).await? {
            Some(id) => {
                info!("Discovered booking {}", id);
                state.trip_booking_id = Some(id);
                id
            }
            None => return Ok(StepOutcome::skipped("no booking to pay for")),
        },
    };

    session.open(&booking_path(booking_id)).await?;
    if !session.click_optional(&Locator::clickable("pay", PAY_TEXTS)).await? {
        if session.page_contains_any(PAID_MARKERS).await? {
            info!("Booking {} is already paid", booking_id);
            state.advance(FlowStage::PaymentConfirmed);
            return Ok(StepOutcome::Passed);
        }
        return Ok(StepOutcome::skipped(format!("no pay button on booking {}", booking_id)));
    }

    let on_payment = session.wait_for_url(|url| url.contains("/payment")).await?;
    let url = session.current_url().await?;
    ensure(on_payment, format!("pay did not open the payment page, now at {}", url))?;
    state.advance(FlowStage::PaymentSubmitted);
    info!("Payment started for booking {}", booking_id);
    Ok(StepOutcome::Passed)
}

/// Enter the test card in the processor's iframe and submit
pub async fn complete_payment<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    card: &TestCard,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    let Some(booking_id) = state.trip_booking_id else {
        return Ok(StepOutcome::skipped("no booking id from an earlier step"));
    };

    if !session.current_url().await?.contains("/payment") {
        login(session, user).await?;
        session.open(&booking_path(booking_id)).await?;
        session.click_optional(&Locator::clickable("pay", &PAY_TEXTS[..2])).await?;
        session.wait_for_url(|url| url.contains("/payment")).await?;
    }
    if !session.current_url().await?.contains("/payment") {
        return Ok(StepOutcome::skipped(format!("payment page for booking {} is not reachable", booking_id)));
    }

    let timeouts = &session.config.timeouts;
    if !fill_card(session.browser, card, timeouts.explicit, timeouts.poll_interval).await? {
        return Ok(StepOutcome::skipped("card fields not found in any payment iframe"));
    }

    let submit = Locator::action("payment-submit-button", &PAY_TEXTS[..2]);
    if !session.click_optional(&submit).await? {
        warn!("No payment submit button found");
    }
    session.pause().await;

    let returned = session
        .wait_for_url(|url| url.contains(&format!("{}/", BOOKINGS_PATH)) && !url.contains("/payment"))
        .await?;
    if returned {
        state.advance(FlowStage::PaymentConfirmed);
        info!("Payment completed for booking {}", booking_id);
    } else {
        state.advance(FlowStage::PaymentSubmitted);
        warn!("Payment for booking {} submitted but the page did not return to the booking", booking_id);
    }
    Ok(StepOutcome::Passed)
}

/// Traveller confirms the guide showed up
pub async fn confirm_arrival<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    booking_action(
        session,
        user,
        state,
        Locator::action("confirm-guide-arrival-button", ARRIVAL_TEXTS),
        FlowStage::ArrivalConfirmed,
    )
    .await
}

/// Traveller confirms the trip is over
pub async fn confirm_completion<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    booking_action(
        session,
        user,
        state,
        Locator::action("confirm-trip-complete-button", COMPLETE_TEXTS),
        FlowStage::TripCompleted,
    )
    .await
}

async fn booking_action<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
    button: Locator,
    stage: FlowStage,
) -> E2eResult<StepOutcome> {
    let Some(booking_id) = state.trip_booking_id else {
        return Ok(StepOutcome::skipped("no booking id from an earlier step"));
    };

    login(session, user).await?;
    session.open(&booking_path(booking_id)).await?;

    if !session.click_optional(&button).await? {
        let status = session
            .booking_status()
            .await?
            .map(|s| s.as_str())
            .unwrap_or("unknown");
        return Ok(StepOutcome::skipped(format!(
            "{} not offered for booking {} (status {})",
            button.label(),
            booking_id,
            status
        )));
    }
    session.confirm_modal().await?;

    state.advance(stage);
    info!("Booking {}: {} done", booking_id, button.label());
    Ok(StepOutcome::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(offers_path(19), "/user/trip-requires/19/offers");
        assert_eq!(booking_path(21), "/trip-bookings/21");
    }
}
