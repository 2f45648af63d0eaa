//! Catalogue of the suite's cases, in run order

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::driver::Browser;
use crate::error::{E2eError, E2eResult};
use crate::fixtures::Fixtures;
use crate::flows::{auth, booking, no_show, trip_offer, trip_require, Session, StepOutcome};
use crate::payment::TestCard;
use crate::state::FlowState;

/// Cases in one group share a [`FlowState`] for the length of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Auth,
    AuthEdge,
    TripFlow,
    Alternative,
}

impl Group {
    pub const ALL: [Group; 4] = [Group::Auth, Group::AuthEdge, Group::TripFlow, Group::Alternative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Auth => "auth",
            Group::AuthEdge => "auth_edge",
            Group::TripFlow => "trip_flow",
            Group::Alternative => "alternative",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s.trim())
            .ok_or_else(|| {
                E2eError::Config(format!(
                    "unknown group '{}', expected one of auth, auth_edge, trip_flow, alternative",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Case {
    LoginAsUser,
    LoginAsGuide,
    LoginAsAdmin,
    LoginWrongPassword,
    LoginUnknownEmail,
    LoginPageElements,
    Logout,
    RegisterPageAccessible,
    RegisterNewUser,
    PasswordVisibilityToggle,

    LoginEmptyFields,
    LoginInvalidEmailFormat,
    RepeatedFailedLogins,

    TripRequireForm,
    CreateTripRequire,
    CreateTripOffer,
    ViewOffers,
    AcceptOffer,
    StartPayment,
    CompletePayment,
    ConfirmArrival,
    ConfirmCompletion,

    ReportUserNoShow,
    DisputeNoShow,
    ReportGuideNoShow,
}

impl Case {
    pub const ALL: [Case; 25] = [
        Case::LoginAsUser,
        Case::LoginAsGuide,
        Case::LoginAsAdmin,
        Case::LoginWrongPassword,
        Case::LoginUnknownEmail,
        Case::LoginPageElements,
        Case::Logout,
        Case::RegisterPageAccessible,
        Case::RegisterNewUser,
        Case::PasswordVisibilityToggle,
        Case::LoginEmptyFields,
        Case::LoginInvalidEmailFormat,
        Case::RepeatedFailedLogins,
        Case::TripRequireForm,
        Case::CreateTripRequire,
        Case::CreateTripOffer,
        Case::ViewOffers,
        Case::AcceptOffer,
        Case::StartPayment,
        Case::CompletePayment,
        Case::ConfirmArrival,
        Case::ConfirmCompletion,
        Case::ReportUserNoShow,
        Case::DisputeNoShow,
        Case::ReportGuideNoShow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Case::LoginAsUser => "login_as_user",
            Case::LoginAsGuide => "login_as_guide",
            Case::LoginAsAdmin => "login_as_admin",
            Case::LoginWrongPassword => "login_with_wrong_password",
            Case::LoginUnknownEmail => "login_with_unknown_email",
            Case::LoginPageElements => "login_page_elements",
            Case::Logout => "logout",
            Case::RegisterPageAccessible => "register_page_accessible",
            Case::RegisterNewUser => "register_new_user",
            Case::PasswordVisibilityToggle => "password_visibility_toggle",
            Case::LoginEmptyFields => "login_with_empty_fields",
            Case::LoginInvalidEmailFormat => "login_with_invalid_email_format",
            Case::RepeatedFailedLogins => "repeated_failed_logins",
            Case::TripRequireForm => "step_00_trip_require_form",
            Case::CreateTripRequire => "step_01_user_create_trip_require",
            Case::CreateTripOffer => "step_02_guide_create_trip_offer",
            Case::ViewOffers => "step_03_user_view_offers",
            Case::AcceptOffer => "step_04_user_accept_offer",
            Case::StartPayment => "step_05_user_start_payment",
            Case::CompletePayment => "step_06_user_complete_payment",
            Case::ConfirmArrival => "step_07_user_confirm_guide_arrival",
            Case::ConfirmCompletion => "step_08_user_confirm_trip_complete",
            Case::ReportUserNoShow => "guide_report_user_no_show",
            Case::DisputeNoShow => "user_dispute_no_show",
            Case::ReportGuideNoShow => "user_report_guide_no_show",
        }
    }

    pub fn group(&self) -> Group {
        match self {
            Case::LoginAsUser
            | Case::LoginAsGuide
            | Case::LoginAsAdmin
            | Case::LoginWrongPassword
            | Case::LoginUnknownEmail
            | Case::LoginPageElements
            | Case::Logout
            | Case::RegisterPageAccessible
            | Case::RegisterNewUser
            | Case::PasswordVisibilityToggle => Group::Auth,
            Case::LoginEmptyFields | Case::LoginInvalidEmailFormat | Case::RepeatedFailedLogins => Group::AuthEdge,
            Case::TripRequireForm
            | Case::CreateTripRequire
            | Case::CreateTripOffer
            | Case::ViewOffers
            | Case::AcceptOffer
            | Case::StartPayment
            | Case::CompletePayment
            | Case::ConfirmArrival
            | Case::ConfirmCompletion => Group::TripFlow,
            Case::ReportUserNoShow | Case::DisputeNoShow | Case::ReportGuideNoShow => Group::Alternative,
        }
    }

    pub fn by_name(name: &str) -> Option<Case> {
        Case::ALL.iter().copied().find(|c| c.name() == name.trim())
    }

    /// Cases of one group, in run order
    pub fn in_group(group: Group) -> Vec<Case> {
        Case::ALL.iter().copied().filter(|c| c.group() == group).collect()
    }

    /// Drive the case on an open session
    pub async fn run<B: Browser>(
        &self,
        session: &Session<'_, B>,
        fixtures: &Fixtures,
        state: &mut FlowState,
    ) -> E2eResult<StepOutcome> {
        let user = &fixtures.user;
        let guide = &fixtures.guide;
        match self {
            Case::LoginAsUser => passed(auth::login(session, user).await),
            Case::LoginAsGuide => passed(auth::login(session, guide).await),
            Case::LoginAsAdmin => passed(auth::login(session, &fixtures.admin).await),
            Case::LoginWrongPassword => {
                passed(auth::login_expecting_rejection(session, &user.email, "wrongpassword").await)
            }
            Case::LoginUnknownEmail => {
                passed(auth::login_expecting_rejection(session, "nonexistent@test.com", &user.password).await)
            }
            Case::LoginPageElements => passed(auth::check_login_page(session).await),
            Case::Logout => auth::logout(session, user).await,
            Case::RegisterPageAccessible => passed(auth::check_register_page(session).await),
            Case::RegisterNewUser => passed(auth::register(session, &user.password).await.map(|_| ())),
            Case::PasswordVisibilityToggle => auth::toggle_password_visibility(session).await,

            Case::LoginEmptyFields => passed(auth::submit_empty_login(session).await),
            Case::LoginInvalidEmailFormat => {
                passed(auth::login_expecting_rejection(session, "notanemail", &user.password).await)
            }
            Case::RepeatedFailedLogins => passed(auth::repeated_failed_logins(session, &user.email, 3).await),

            Case::TripRequireForm => passed(trip_require::check_create_form(session, user).await),
            Case::CreateTripRequire => {
                let draft = trip_require::TripRequireDraft::sample_today();
                trip_require::create_trip_require(session, user, &draft, state).await
            }
            Case::CreateTripOffer => {
                let draft = trip_offer::TripOfferDraft::sample();
                trip_offer::create_trip_offer(session, guide, &draft, state).await
            }
            Case::ViewOffers => booking::view_offers(session, user, state).await,
            Case::AcceptOffer => booking::accept_offer(session, user, state).await,
            Case::StartPayment => booking::start_payment(session, user, state).await,
            Case::CompletePayment => booking::complete_payment(session, user, &TestCard::default(), state).await,
            Case::ConfirmArrival => booking::confirm_arrival(session, user, state).await,
            Case::ConfirmCompletion => booking::confirm_completion(session, user, state).await,

            Case::ReportUserNoShow => no_show::report_user_no_show(session, guide, state).await,
            Case::DisputeNoShow => no_show::dispute_no_show(session, user, state).await,
            Case::ReportGuideNoShow => no_show::report_guide_no_show(session, user, state).await,
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn passed(result: E2eResult<()>) -> E2eResult<StepOutcome> {
    result.map(|()| StepOutcome::Passed)
}
