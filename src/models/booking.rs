// src/models/booking.rs
// DOCUMENTATION: Booking ledger data structures and lifecycle rules
// PURPOSE: Status machine, date ranges, payment marker and API DTOs

use crate::errors::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a booking
/// DOCUMENTATION: requested -> accepted -> completed, with rejected and
/// cancelled as the other exits. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

/// Something a caller can do to a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Accept,
    Reject,
    Cancel,
    Complete,
    /// System sweep of requests nobody answered before check-in
    Expire,
}

impl BookingStatus {
    /// Statuses that hold the listing's dates
    pub const OPEN: [BookingStatus; 2] = [BookingStatus::Requested, BookingStatus::Accepted];

    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Accepted,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Status reached by applying `action`
    /// DOCUMENTATION: The only place the transition table lives
    pub fn after(self, action: BookingAction) -> Result<BookingStatus, BookingError> {
        use BookingAction::*;
        use BookingStatus::*;

        match (self, action) {
            (Requested, Accept) => Ok(Accepted),
            (Requested, Reject) | (Requested, Expire) => Ok(Rejected),
            (Requested, Cancel) | (Accepted, Cancel) => Ok(Cancelled),
            (Accepted, Complete) => Ok(Completed),
            (from, action) => Err(BookingError::InvalidTransition {
                from: from.to_string(),
                action: action.to_string(),
            }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BookingError::InvalidInput(format!("unknown booking status '{}'", s)))
    }
}

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
            BookingAction::Expire => "expire",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the traveler pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    PayOnArrival,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::PayOnArrival => "pay_on_arrival",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay_on_arrival" => Ok(PaymentMethod::PayOnArrival),
            other => Err(BookingError::InvalidInput(format!(
                "unknown payment method '{}'",
                other
            ))),
        }
    }
}

/// Payment marker carried alongside the booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Void,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Void => "void",
        }
    }

    /// Payment marker once the booking moves to `status`
    /// Money is collected on arrival, so completion means paid.
    pub fn after(self, status: BookingStatus) -> PaymentStatus {
        match status {
            BookingStatus::Rejected | BookingStatus::Cancelled => PaymentStatus::Void,
            BookingStatus::Completed => PaymentStatus::Paid,
            BookingStatus::Requested | BookingStatus::Accepted => self,
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "void" => Ok(PaymentStatus::Void),
            other => Err(BookingError::InvalidInput(format!(
                "unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// Half-open stay `[start, end)`: check-in day included, check-out day not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::ValidationError(
                "end_date must be after start_date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Limits applied to every new booking request
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub max_nights: i64,
    pub horizon_days: i64,
}

impl BookingPolicy {
    /// Check a requested stay against today's date
    pub fn check_range(&self, range: &DateRange, today: NaiveDate) -> Result<(), BookingError> {
        if range.start < today {
            return Err(BookingError::ValidationError(
                "start_date cannot be in the past".to_string(),
            ));
        }

        if (range.start - today).num_days() > self.horizon_days {
            return Err(BookingError::ValidationError(format!(
                "start_date cannot be more than {} days ahead",
                self.horizon_days
            )));
        }

        if range.nights() > self.max_nights {
            return Err(BookingError::ValidationError(format!(
                "a booking cannot exceed {} nights",
                self.max_nights
            )));
        }

        Ok(())
    }
}

/// Total owed for a stay: one price unit per night
pub fn total_price(unit_price: f64, range: &DateRange) -> f64 {
    unit_price * range.nights() as f64
}

/// A booking as stored in the ledger
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: String,
    pub traveler_id: String,
    pub partner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: i64,
    pub guests: i32,
    pub status: BookingStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub total_price: f64,
    pub note: Option<String>,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Values for a fresh booking row
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub listing_id: String,
    pub traveler_id: String,
    pub partner_id: String,
    pub range: DateRange,
    pub guests: i32,
    pub total_price: f64,
    pub note: Option<String>,
}

/// One status change in a booking's history
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingEvent {
    pub id: i64,
    pub booking_id: Uuid,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor_id: String,
    pub actor_role: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for POST /bookings
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 128))]
    pub listing_id: String,

    /// Check-in day
    pub start_date: NaiveDate,

    /// Check-out day (exclusive)
    pub end_date: NaiveDate,

    #[validate(range(min = 1, max = 100))]
    pub guests: i32,

    /// Message from the traveler to the partner
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub note: Option<String>,
}

/// Optional body for accept / reject / cancel / complete
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub note: Option<String>,
}

/// Query string for booking lists
#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Results per page (max 100)
    pub limit: Option<i64>,
}

impl BookingListQuery {
    pub fn status(&self) -> Result<Option<BookingStatus>, BookingError> {
        self.status.as_deref().map(str::parse::<BookingStatus>).transpose()
    }

    /// (page, limit, offset) clamped to sane values
    /// DOCUMENTATION: Huge page numbers saturate to an offset past every row
    pub fn pagination(&self) -> (i64, i64, i64) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

/// Paginated booking list
#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub data: Vec<Booking>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl BookingListResponse {
    pub fn new(data: Vec<Booking>, total_count: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            page,
            limit,
            has_more: total_count > page.saturating_mul(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    #[test]
    fn test_transition_table() {
        use BookingAction::*;
        use BookingStatus::*;

        assert_eq!(Requested.after(Accept).unwrap(), Accepted);
        assert_eq!(Requested.after(Reject).unwrap(), Rejected);
        assert_eq!(Requested.after(Expire).unwrap(), Rejected);
        assert_eq!(Requested.after(Cancel).unwrap(), Cancelled);
        assert_eq!(Accepted.after(Cancel).unwrap(), Cancelled);
        assert_eq!(Accepted.after(Complete).unwrap(), Completed);

        assert!(Requested.after(Complete).is_err());
        assert!(Accepted.after(Accept).is_err());
        assert!(Accepted.after(Reject).is_err());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let actions = [
            BookingAction::Accept,
            BookingAction::Reject,
            BookingAction::Cancel,
            BookingAction::Complete,
            BookingAction::Expire,
        ];
        for status in [
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(status.is_terminal());
            for action in actions {
                assert!(
                    matches!(
                        status.after(action),
                        Err(BookingError::InvalidTransition { .. })
                    ),
                    "{} should not allow {}",
                    status,
                    action
                );
            }
        }
    }

    #[test]
    fn test_status_parsing() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("confirmed".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_payment_follows_status() {
        let unpaid = PaymentStatus::Unpaid;
        assert_eq!(unpaid.after(BookingStatus::Accepted), PaymentStatus::Unpaid);
        assert_eq!(unpaid.after(BookingStatus::Cancelled), PaymentStatus::Void);
        assert_eq!(unpaid.after(BookingStatus::Rejected), PaymentStatus::Void);
        assert_eq!(unpaid.after(BookingStatus::Completed), PaymentStatus::Paid);
    }

    #[test]
    fn test_range_requires_positive_length() {
        assert!(DateRange::new(day(10), day(10)).is_err());
        assert!(DateRange::new(day(11), day(10)).is_err());
        assert_eq!(DateRange::new(day(10), day(13)).unwrap().nights(), 3);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let first = DateRange::new(day(10), day(13)).unwrap();
        let back_to_back = DateRange::new(day(13), day(15)).unwrap();
        let inside = DateRange::new(day(11), day(12)).unwrap();
        let straddling = DateRange::new(day(8), day(11)).unwrap();

        assert!(!first.overlaps(&back_to_back));
        assert!(!back_to_back.overlaps(&first));
        assert!(first.overlaps(&inside));
        assert!(inside.overlaps(&first));
        assert!(first.overlaps(&straddling));
    }

    #[test]
    fn test_policy_limits() {
        let policy = BookingPolicy {
            max_nights: 5,
            horizon_days: 20,
        };
        let today = day(5);

        assert!(policy
            .check_range(&DateRange::new(day(5), day(6)).unwrap(), today)
            .is_ok());
        assert!(policy
            .check_range(&DateRange::new(day(4), day(6)).unwrap(), today)
            .is_err());
        assert!(policy
            .check_range(&DateRange::new(day(6), day(12)).unwrap(), today)
            .is_err());
        assert!(policy
            .check_range(&DateRange::new(day(26), day(27)).unwrap(), today)
            .is_err());
        assert!(policy
            .check_range(&DateRange::new(day(25), day(26)).unwrap(), today)
            .is_ok());
    }

    #[test]
    fn test_total_price_per_night() {
        let range = DateRange::new(day(1), day(4)).unwrap();
        assert_eq!(total_price(120.0, &range), 360.0);
    }

    #[test]
    fn test_create_request_validation() {
        let mut req = CreateBookingRequest {
            listing_id: "lst_1".to_string(),
            start_date: day(1),
            end_date: day(2),
            guests: 2,
            note: None,
        };
        assert!(req.validate().is_ok());

        req.guests = 0;
        assert!(req.validate().is_err());

        req.guests = 2;
        req.listing_id = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_list_query_pagination() {
        let query = BookingListQuery {
            status: Some("accepted".to_string()),
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(query.pagination(), (3, 100, 200));
        assert_eq!(query.status().unwrap(), Some(BookingStatus::Accepted));

        let defaults = BookingListQuery::default();
        assert_eq!(defaults.pagination(), (1, 20, 0));
        assert_eq!(defaults.status().unwrap(), None);
    }

    #[test]
    fn test_huge_page_saturates() {
        let query = BookingListQuery {
            status: None,
            page: Some(i64::MAX),
            limit: Some(100),
        };
        let (page, limit, offset) = query.pagination();
        assert_eq!((page, limit), (i64::MAX, 100));
        assert_eq!(offset, i64::MAX);

        let negative = BookingListQuery {
            status: None,
            page: Some(i64::MIN),
            limit: Some(i64::MIN),
        };
        assert_eq!(negative.pagination(), (1, 1, 0));

        let last = BookingListResponse::new(Vec::new(), 250, i64::MAX, 100);
        assert!(!last.has_more);
        assert!(BookingListResponse::new(Vec::new(), 250, 2, 100).has_more);
        assert!(!BookingListResponse::new(Vec::new(), 250, 3, 100).has_more);
    }
}
