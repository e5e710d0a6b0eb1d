// src/models/listing.rs
// DOCUMENTATION: Listing read model and availability results
// PURPOSE: Partner listings as the ledger sees them

use crate::errors::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Moderation status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
    Inactive,
}

impl FromStr for ListingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            "inactive" => Ok(ListingStatus::Inactive),
            other => Err(BookingError::InvalidInput(format!(
                "unknown listing status '{}'",
                other
            ))),
        }
    }
}

/// Admin approval status of the partner account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for ApprovalStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(BookingError::InvalidInput(format!(
                "unknown approval status '{}'",
                other
            ))),
        }
    }
}

/// A listing joined with its partner's approval status
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub id: String,
    pub partner_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    /// Price per night (or per day for tours and activities)
    pub price: f64,
    /// Maximum guests per booking
    pub capacity: i32,
    pub status: ListingStatus,
    pub available: bool,
    pub partner_status: ApprovalStatus,
    pub rating: f32,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Why travelers cannot book this listing right now, if anything
    pub fn unbookable_reason(&self) -> Option<&'static str> {
        if self.status != ListingStatus::Approved {
            return Some("Listing is not approved");
        }
        if !self.available {
            return Some("Listing is inactive");
        }
        if self.partner_status != ApprovalStatus::Approved {
            return Some("Partner is not approved");
        }
        None
    }

    pub fn ensure_bookable(&self) -> Result<(), BookingError> {
        match self.unbookable_reason() {
            Some(reason) => Err(BookingError::Conflict(reason.to_string())),
            None => Ok(()),
        }
    }

    pub fn ensure_capacity(&self, guests: i32) -> Result<(), BookingError> {
        if guests > self.capacity {
            return Err(BookingError::ValidationError(format!(
                "listing accepts at most {} guests",
                self.capacity
            )));
        }
        Ok(())
    }
}

/// Query string for GET /listings/{id}/availability
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Result of a real-time availability check
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityCheck {
    pub listing_id: String,
    pub available: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub conflicting_bookings: Vec<Uuid>,
    pub reason: Option<String>,
}

impl AvailabilityCheck {
    pub fn unavailable(
        listing_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> Self {
        Self {
            listing_id: listing_id.to_string(),
            available: false,
            start_date,
            end_date,
            conflicting_bookings: Vec::new(),
            reason: Some(reason.to_string()),
        }
    }

    pub fn from_conflicts(
        listing_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        conflicts: Vec<Uuid>,
    ) -> Self {
        let available = conflicts.is_empty();
        let reason = if available {
            None
        } else {
            Some(format!("Conflicts with {} booking(s)", conflicts.len()))
        };

        Self {
            listing_id: listing_id.to_string(),
            available,
            start_date,
            end_date,
            conflicting_bookings: conflicts,
            reason,
        }
    }
}

/// Booking count and revenue for one status
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
    pub revenue: f64,
}

/// Aggregate ledger figures for one listing
#[derive(Debug, Serialize)]
pub struct ListingStats {
    pub listing_id: String,
    pub total_bookings: i64,
    pub by_status: Vec<StatusCount>,
    /// Revenue of accepted and completed bookings
    pub confirmed_revenue: f64,
    pub rating: f32,
    pub review_count: i32,
}

impl ListingStats {
    pub fn new(listing: &Listing, by_status: Vec<StatusCount>) -> Self {
        let total_bookings = by_status.iter().map(|s| s.count).sum();
        let confirmed_revenue = by_status
            .iter()
            .filter(|s| s.status == "accepted" || s.status == "completed")
            .map(|s| s.revenue)
            .sum();

        Self {
            listing_id: listing.id.clone(),
            total_bookings,
            by_status,
            confirmed_revenue,
            rating: listing.rating,
            review_count: listing.review_count,
        }
    }
}

/// Listing used across unit tests
#[cfg(test)]
pub(crate) fn sample_listing() -> Listing {
    Listing {
        id: "lst_ella_cabin".to_string(),
        partner_id: "ptn_hill_stays".to_string(),
        title: "Ella Rock Cabin".to_string(),
        description: "Cabin with a view of Ella Rock".to_string(),
        location: "Ella".to_string(),
        category: "hotel".to_string(),
        price: 85.0,
        capacity: 3,
        status: ListingStatus::Approved,
        available: true,
        partner_status: ApprovalStatus::Approved,
        rating: 4.6,
        review_count: 18,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
