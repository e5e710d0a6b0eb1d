// src/services/listing_service.rs
// DOCUMENTATION: Listing-centric ledger queries
// PURPOSE: Availability, partner booking views and per-listing stats

use crate::db::{BookingFilter, BookingRepository, ListingRepository};
use crate::errors::BookingError;
use crate::models::{
    AvailabilityCheck, BookingListQuery, BookingListResponse, Caller, DateRange, Listing,
    ListingStats,
};
use crate::services::{BookingService, ListingCache};
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct ListingService;

impl ListingService {
    /// Get a listing, served from cache when fresh
    pub async fn get_listing(
        pool: &PgPool,
        cache: &ListingCache,
        listing_id: &str,
    ) -> Result<Listing, BookingError> {
        if let Some(listing) = cache.get(listing_id).await {
            return Ok(listing);
        }

        let listing = ListingRepository::get_by_id(pool, listing_id).await?;
        cache.set(listing.clone()).await;
        Ok(listing)
    }

    /// Real-time availability for a date range
    /// DOCUMENTATION: Reads the listing and bookings straight from the
    /// database every time; a stale answer here turns into a failed booking
    pub async fn check_availability(
        pool: &PgPool,
        listing_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AvailabilityCheck, BookingError> {
        let range = DateRange::new(start_date, end_date)?;

        let listing = match ListingRepository::get_by_id(pool, listing_id).await {
            Ok(listing) => listing,
            Err(BookingError::NotFound(_)) => {
                return Ok(AvailabilityCheck::unavailable(
                    listing_id,
                    start_date,
                    end_date,
                    "Listing not found",
                ))
            }
            Err(e) => return Err(e),
        };

        if let Some(reason) = listing.unbookable_reason() {
            return Ok(AvailabilityCheck::unavailable(
                listing_id, start_date, end_date, reason,
            ));
        }

        let conflicts = BookingRepository::find_overlapping(pool, listing_id, &range).await?;
        log::debug!(
            "Availability for {} {}..{}: {} conflict(s)",
            listing_id,
            start_date,
            end_date,
            conflicts.len()
        );

        Ok(AvailabilityCheck::from_conflicts(
            listing_id, start_date, end_date, conflicts,
        ))
    }

    /// Bookings on one listing, for its partner or admin
    pub async fn listing_bookings(
        pool: &PgPool,
        cache: &ListingCache,
        caller: &Caller,
        listing_id: &str,
        query: &BookingListQuery,
    ) -> Result<BookingListResponse, BookingError> {
        let listing = Self::get_listing(pool, cache, listing_id).await?;
        caller.require_partner(&listing.partner_id)?;

        let filter = BookingFilter {
            listing_id: Some(listing.id),
            status: query.status()?,
            ..Default::default()
        };
        BookingService::list_with_filter(pool, &filter, query).await
    }

    /// Booking counts and revenue for one listing
    pub async fn listing_stats(
        pool: &PgPool,
        cache: &ListingCache,
        caller: &Caller,
        listing_id: &str,
    ) -> Result<ListingStats, BookingError> {
        let listing = Self::get_listing(pool, cache, listing_id).await?;
        caller.require_partner(&listing.partner_id)?;

        let by_status = BookingRepository::status_counts(pool, Some(&listing.id)).await?;
        Ok(ListingStats::new(&listing, by_status))
    }
}
