//! No-show reports and disputes on paid bookings

use tracing::info;

use super::auth::login;
use super::booking::{booking_path, discover_booking, BOOKINGS_PATH};
use super::{Session, StepOutcome};
use crate::driver::{Browser, Strategy};
use crate::error::E2eResult;
use crate::fixtures::TestUser;
use crate::locator::Locator;
use crate::state::{FlowStage, FlowState};

pub const USER_NO_SHOW_REASON: &str = "ลูกค้าไม่มาตามนัดหมาย ติดต่อไม่ได้";
pub const GUIDE_NO_SHOW_REASON: &str = "ไกด์ไม่มาตามนัดหมาย ติดต่อไม่ได้";
pub const DISPUTE_REASON: &str = "ฉันมาถึงตรงเวลา มีหลักฐาน";
pub const DISPUTE_DESCRIPTION: &str = "ฉันมีภาพถ่าย GPS และข้อความที่ส่งหาไกด์ว่ามาถึงแล้ว";

/// Which party is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoShowParty {
    User,
    Guide,
}

impl NoShowParty {
    fn button(&self) -> Locator {
        match self {
            NoShowParty::User => Locator::action(
                "report-user-no-show-button",
                &["รายงานว่าลูกค้าไม่มา", "Report User No-Show"],
            ),
            NoShowParty::Guide => Locator::action(
                "report-guide-no-show-button",
                &["รายงานว่าไกด์ไม่มา", "Report Guide No-Show"],
            ),
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            NoShowParty::User => USER_NO_SHOW_REASON,
            NoShowParty::Guide => GUIDE_NO_SHOW_REASON,
        }
    }

    fn stage(&self) -> FlowStage {
        match self {
            NoShowParty::User => FlowStage::UserNoShowReported,
            NoShowParty::Guide => FlowStage::GuideNoShowReported,
        }
    }
}

fn reason_field() -> Locator {
    Locator::field("no-show-reason-textarea", &[Strategy::css("textarea")])
}

fn report_submit() -> Locator {
    Locator::action("no-show-submit-button", &["ส่งรายงาน", "Submit"])
}

/// Open the booking recorded in `state`, or the first one on the bookings
/// list. Returns the id of the opened booking.
async fn open_booking<B: Browser>(session: &Session<'_, B>, state: &mut FlowState) -> E2eResult<Option<u64>> {
    if let Some(id) = state.trip_booking_id {
        session.open(&booking_path(id)).await?;
        return Ok(Some(id));
    }
    let Some(id) = discover_booking(session).await? else {
        return Ok(None);
    };
    info!("Discovered booking {}", id);
    state.trip_booking_id = Some(id);
    session.open(&booking_path(id)).await?;
    Ok(Some(id))
}

/// Report that `party` did not show up, as the other party (`reporter`).
///
/// Skips when the booking page shows a status that does not accept a
/// report, or when the report button is absent.
pub async fn report_no_show<B: Browser>(
    session: &Session<'_, B>,
    reporter: &TestUser,
    party: NoShowParty,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    login(session, reporter).await?;
    let Some(booking_id) = open_booking(session, state).await? else {
        return Ok(StepOutcome::skipped("no booking to report a no-show against"));
    };

    if let Some(status) = session.booking_status().await? {
        if !status.is_reportable() {
            return Ok(StepOutcome::skipped(format!(
                "booking {} is {}, a no-show can only be reported while paid",
                booking_id,
                status.as_str()
            )));
        }
    }

    let button = party.button();
    if !session.click_optional(&button).await? {
        return Ok(StepOutcome::skipped(format!(
            "{} not shown on booking {}",
            button.label(),
            booking_id
        )));
    }

    if session.fill_within(&reason_field(), party.reason()).await.is_none() {
        return Ok(StepOutcome::skipped("no-show reason field did not appear"));
    }
    session.click(&report_submit()).await?;
    session.pause().await;

    state.advance(party.stage());
    info!("Reported {:?} no-show on booking {}", party, booking_id);
    Ok(StepOutcome::Passed)
}

/// Guide reports the traveller did not show up
pub async fn report_user_no_show<B: Browser>(
    session: &Session<'_, B>,
    guide: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    report_no_show(session, guide, NoShowParty::User, state).await
}

/// Traveller reports the guide did not show up
pub async fn report_guide_no_show<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    report_no_show(session, user, NoShowParty::Guide, state).await
}

/// Traveller disputes a no-show the guide reported against them
pub async fn dispute_no_show<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    login(session, user).await?;

    let booking_id = match state.trip_booking_id {
        Some(id) => id,
        None => {
            session.open(BOOKINGS_PATH).await?;
            if !session.page_contains("no_show").await? {
                return Ok(StepOutcome::skipped("no booking with a no-show report"));
            }
            let Some(id) = discover_booking(session).await? else {
                return Ok(StepOutcome::skipped("no booking with a no-show report"));
            };
            state.trip_booking_id = Some(id);
            id
        }
    };
    session.open(&booking_path(booking_id)).await?;

    if let Some(status) = session.booking_status().await? {
        if !status.is_disputable() {
            return Ok(StepOutcome::skipped(format!(
                "booking {} is {}, nothing to dispute",
                booking_id,
                status.as_str()
            )));
        }
    }

    let button = Locator::action("dispute-no-show-button", &["โต้แย้งการรีพอร์ต", "Dispute"]);
    if !session.click_optional(&button).await? {
        return Ok(StepOutcome::skipped(format!("no dispute button on booking {}", booking_id)));
    }

    let reason = Locator::field("dispute-reason-input", &[Strategy::css("input[type='text']")]);
    if session.fill_within(&reason, DISPUTE_REASON).await.is_none() {
        return Ok(StepOutcome::skipped("dispute form did not appear"));
    }
    let description = Locator::field("dispute-description-textarea", &[Strategy::css("textarea")]);
    session.fill_optional(&description, DISPUTE_DESCRIPTION).await;

    session
        .click(&Locator::action("dispute-submit-button", &["ส่งโต้แย้ง", "Submit Dispute"]))
        .await?;
    session.pause().await;

    state.advance(FlowStage::Disputed);
    info!("Disputed no-show on booking {}", booking_id);
    Ok(StepOutcome::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_party_has_its_own_button_and_stage() {
        assert_eq!(NoShowParty::User.button().label(), "report-user-no-show-button");
        assert_eq!(NoShowParty::Guide.button().label(), "report-guide-no-show-button");
        assert_eq!(NoShowParty::User.stage(), FlowStage::UserNoShowReported);
        assert_eq!(NoShowParty::Guide.stage(), FlowStage::GuideNoShowReported);
    }

    #[test]
    fn reason_field_prefers_test_id() {
        assert_eq!(reason_field().entries()[0].0, Strategy::test_id("no-show-reason-textarea"));
    }
}
