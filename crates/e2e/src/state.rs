//! State threaded through one ordered run of a flow group

use serde::{Deserialize, Serialize};

/// How far a flow got. Recorded by the steps, never enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    #[default]
    Anonymous,
    Authenticated,
    RequestCreated,
    OfferCreated,
    OfferViewed,
    BookingCreated,
    PaymentSubmitted,
    PaymentConfirmed,
    ArrivalConfirmed,
    TripCompleted,
    UserNoShowReported,
    GuideNoShowReported,
    Disputed,
}

/// Identifiers produced by earlier steps and consumed by later ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    pub trip_require_id: Option<u64>,
    pub trip_offer_id: Option<u64>,
    pub trip_booking_id: Option<u64>,
    pub stage: FlowStage,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, stage: FlowStage) {
        self.stage = stage;
    }
}

/// Booking lifecycle as the backend names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    Paid,
    TripStarted,
    TripCompleted,
    NoShowReported,
    NoShowDisputed,
    NoShowConfirmed,
    /// Admin settled a disputed no-show by splitting the payment
    NoShowSplit,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    /// Detection order
    const ALL: [BookingStatus; 10] = [
        BookingStatus::NoShowSplit,
        BookingStatus::NoShowConfirmed,
        BookingStatus::NoShowDisputed,
        BookingStatus::NoShowReported,
        BookingStatus::PendingPayment,
        BookingStatus::TripCompleted,
        BookingStatus::TripStarted,
        BookingStatus::Cancelled,
        BookingStatus::Refunded,
        BookingStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Paid => "paid",
            BookingStatus::TripStarted => "trip_started",
            BookingStatus::TripCompleted => "trip_completed",
            BookingStatus::NoShowReported => "no_show_reported",
            BookingStatus::NoShowDisputed => "no_show_disputed",
            BookingStatus::NoShowConfirmed => "no_show_confirmed",
            BookingStatus::NoShowSplit => "no_show_split",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// First status code appearing in a page's source
    pub fn detect(source: &str) -> Option<Self> {
        let source = source.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| contains_word(&source, status.as_str()))
    }

    /// A no-show can only be reported against a paid booking
    pub fn is_reportable(&self) -> bool {
        matches!(self, BookingStatus::Paid)
    }

    pub fn is_disputable(&self) -> bool {
        matches!(self, BookingStatus::NoShowReported)
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.map(is_word).unwrap_or(false) && !after.map(is_word).unwrap_or(false)
    })
}
