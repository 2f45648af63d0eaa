//! Offers made by guides against trip requests

use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::{login, submit_button};
use super::trip_require::{first_trip_require_id, LIST_PATH as REQUIRE_LIST_PATH};
use super::{random_suffix, Session, StepOutcome};
use crate::driver::{Browser, Strategy};
use crate::error::{ensure, E2eResult};
use crate::extract::{id_after, trailing_id};
use crate::fixtures::TestUser;
use crate::locator::Locator;
use crate::state::{FlowStage, FlowState};

pub const CREATE_PATH: &str = "/guide/trip-offers/create";

/// Shown by the create page when `trip_require_id` does not exist
pub const REQUIRE_NOT_FOUND: &str = "ไม่พบข้อมูลความต้องการทริป";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripOfferDraft {
    pub title: String,
    pub description: String,
    pub total_price: u32,
    pub itinerary: String,
    pub included_services: String,
}

impl TripOfferDraft {
    /// Three-day Chiang Mai package priced at 4000, inside the sample
    /// request's 3000-5000 budget
    pub fn sample() -> Self {
        Self {
            title: format!("แพ็กเกจเชียงใหม่ 3 วัน 2 คืน #{}", random_suffix(100, 999)),
            description: "แพ็กเกจทัวร์เชียงใหม่ครบวงจร รวมที่พัก อาหาร และรถรับส่ง".to_string(),
            total_price: 4000,
            itinerary: "วัน 1: วัดพระธาตุดอยสุเทพ\nวัน 2: ตลาดวโรรส\nวัน 3: บ้านสวนดอก".to_string(),
            included_services: "ที่พัก, อาหาร, รถรับส่ง, ค่าเข้าสถานที่".to_string(),
        }
    }
}

pub fn create_path(trip_require_id: u64) -> String {
    format!("{}?trip_require_id={}", CREATE_PATH, trip_require_id)
}

fn named(name: &str) -> Locator {
    Locator::new(name).or(Strategy::name(name))
}

/// Create an offer as `guide` for the request in `state`, discovering an
/// existing request when none was recorded
pub async fn create_trip_offer<B: Browser>(
    session: &Session<'_, B>,
    guide: &TestUser,
    draft: &TripOfferDraft,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    login(session, guide).await?;
    state.advance(FlowStage::Authenticated);

    let require_id = match state.trip_require_id {
        Some(id) => id,
        None => {
            session.open(REQUIRE_LIST_PATH).await?;
            let Some(id) = first_trip_require_id(session).await? else {
                return Ok(StepOutcome::skipped("no trip request available to make an offer for"));
            };
            info!("Discovered trip request {}", id);
            state.trip_require_id = Some(id);
            id
        }
    };

    session.open(&create_path(require_id)).await?;
    if session.page_contains(REQUIRE_NOT_FOUND).await? {
        return Ok(StepOutcome::skipped(format!("trip request {} does not exist", require_id)));
    }

    session
        .fill(&Locator::new("title").or_await(Strategy::name("title")), &draft.title)
        .await?;
    session.fill(&named("description"), &draft.description).await?;
    session.fill(&named("totalPrice"), &draft.total_price.to_string()).await?;
    session.fill_optional(&named("itinerary"), &draft.itinerary).await;
    session.fill_optional(&named("included_services"), &draft.included_services).await;

    session.click(&submit_button()).await?;
    session.pause().await;

    let left = session.wait_for_url(|url| !url.contains(CREATE_PATH)).await?;
    if !left {
        ensure(
            !session.error_shown().await?,
            format!("offer at {} was rejected for trip request {}", draft.total_price, require_id),
        )?;
    }

    let url = session.current_url().await?;
    if left {
        state.trip_offer_id = id_after(&url, "/trip-offers/").or_else(|| trailing_id(&url));
    }
    state.advance(FlowStage::OfferCreated);
    info!("Guide created offer '{}' for trip request {}", draft.title, require_id);
    Ok(StepOutcome::Passed)
}
