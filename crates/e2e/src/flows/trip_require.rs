//! Trip requests authored by travellers

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::auth::{login, submit_button};
use super::{random_suffix, Session, StepOutcome};
use crate::driver::{Browser, Strategy};
use crate::error::{ensure, E2eResult};
use crate::extract::trailing_id;
use crate::fixtures::TestUser;
use crate::locator::Locator;
use crate::state::{FlowStage, FlowState};

pub const LIST_PATH: &str = "/user/trip-requires";
pub const CREATE_PATH: &str = "/user/trip-requires/create";

/// Links to individual trip requests on a listing page
pub const REQUIRE_LINKS: &str = "a[href*='/user/trip-requires/']";

/// Values entered into the trip request form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequireDraft {
    pub title: String,
    pub description: String,
    /// Option index in the province select
    pub province_index: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub group_size: u32,
    pub min_price: u32,
    pub max_price: u32,
    pub requirements: String,
}

impl TripRequireDraft {
    /// A three-day Chiang Mai request for four people, budget 3000-5000,
    /// starting a week after `today`
    pub fn sample(today: NaiveDate) -> Self {
        Self {
            title: format!("ทริปทดสอบอัตโนมัติ {}", random_suffix(10000, 99999)),
            description: "ต้องการไกด์ท้องถิ่นเพื่อพาเที่ยวจังหวัดเชียงใหม่ ระยะเวลา 3 วัน 2 คืน".to_string(),
            province_index: 1,
            start_date: today + Duration::days(7),
            end_date: today + Duration::days(10),
            days: 3,
            group_size: 4,
            min_price: 3000,
            max_price: 5000,
            requirements: "มีรถรับส่ง, พูดภาษาอังกฤษได้".to_string(),
        }
    }

    pub fn sample_today() -> Self {
        Self::sample(Local::now().date_naive())
    }
}

fn form_field(test_id: &str, name: &str) -> Locator {
    Locator::field(test_id, &[Strategy::name(name)])
}

fn title_field() -> Locator {
    Locator::new("trip-require-title")
        .or(Strategy::test_id("trip-require-title"))
        .or_await(Strategy::name("title"))
}

fn submit() -> Locator {
    Locator::new("trip-require-submit")
        .or(Strategy::test_id("trip-require-submit"))
        .or(Strategy::css("button[type='submit']"))
}

/// Create a trip request as `user` and record its id
pub async fn create_trip_require<B: Browser>(
    session: &Session<'_, B>,
    user: &TestUser,
    draft: &TripRequireDraft,
    state: &mut FlowState,
) -> E2eResult<StepOutcome> {
    login(session, user).await?;
    state.advance(FlowStage::Authenticated);

    session.open(CREATE_PATH).await?;

    session.fill(&title_field(), &draft.title).await?;
    session
        .fill(&form_field("trip-require-description", "description"), &draft.description)
        .await?;
    session
        .select_optional(&form_field("trip-require-province", "province_id"), draft.province_index)
        .await;
    session
        .fill_date_optional(&form_field("trip-require-start-date", "start_date"), draft.start_date)
        .await;
    session
        .fill_date_optional(&form_field("trip-require-end-date", "end_date"), draft.end_date)
        .await;
    session
        .fill(&form_field("trip-require-days", "days"), &draft.days.to_string())
        .await?;
    session
        .fill(&form_field("trip-require-group-size", "group_size"), &draft.group_size.to_string())
        .await?;
    session
        .fill(&form_field("trip-require-min-price", "min_price"), &draft.min_price.to_string())
        .await?;
    session
        .fill(&form_field("trip-require-max-price", "max_price"), &draft.max_price.to_string())
        .await?;
    session
        .fill_optional(&form_field("trip-require-requirements", "requirements"), &draft.requirements)
        .await;

    session.click(&submit()).await?;
    session.pause().await;

    session.wait_for_url(|url| url.contains(LIST_PATH) && !url.contains(CREATE_PATH)).await?;
    let url = session.current_url().await?;
    ensure(
        url.contains(LIST_PATH) && !url.contains(CREATE_PATH),
        format!("expected a redirect to {}, now at {}", LIST_PATH, url),
    )?;

    let mut id = trailing_id(&url);
    if !url.trim_end_matches('/').ends_with(LIST_PATH) {
        session.open(LIST_PATH).await?;
    }
    ensure(
        session.page_contains(&draft.title).await?,
        format!("'{}' is missing from the trip request list", draft.title),
    )?;

    if id.is_none() {
        id = id_of_titled_link(session, &draft.title).await?;
    }
    if id.is_none() {
        id = first_trip_require_id(session).await?;
    }

    state.trip_require_id = id;
    state.advance(FlowStage::RequestCreated);
    match id {
        Some(id) => info!("Created trip request '{}' (id {})", draft.title, id),
        None => warn!("Created trip request '{}' but found no id on the list page", draft.title),
    }
    Ok(StepOutcome::Passed)
}

async fn id_of_titled_link<B: Browser>(session: &Session<'_, B>, title: &str) -> E2eResult<Option<u64>> {
    let Some(link) = session.browser.find(&Strategy::link_text(title)).await? else {
        return Ok(None);
    };
    let href = session.browser.attribute(&link, "href").await?.unwrap_or_default();
    Ok(trailing_id(&href))
}

/// Id of the first trip request linked from the current page
pub async fn first_trip_require_id<B: Browser>(session: &Session<'_, B>) -> E2eResult<Option<u64>> {
    for link in session.browser.find_all(&Strategy::css(REQUIRE_LINKS)).await? {
        let href = session.browser.attribute(&link, "href").await?.unwrap_or_default();
        if href.contains("offers") {
            continue;
        }
        if let Some(id) = trailing_id(&href) {
            debug!("Using trip request {} from {}", id, href);
            return Ok(Some(id));
        }
    }
    Ok(None)
}

/// The create form renders for a logged-in traveller
pub async fn check_create_form<B: Browser>(session: &Session<'_, B>, user: &TestUser) -> E2eResult<()> {
    login(session, user).await?;
    session.open(CREATE_PATH).await?;
    session.resolver.require(session.browser, &title_field()).await?;
    session.resolver.require(session.browser, &submit_button()).await?;
    Ok(())
}
