// src/services/booking_service.rs
// DOCUMENTATION: Booking lifecycle business logic
// PURPOSE: Request, adjudicate and read bookings on top of the repositories

use crate::db::{BookingFilter, BookingRepository, ListingRepository, StatusChange};
use crate::errors::BookingError;
use crate::models::{
    total_price, Booking, BookingAction, BookingEvent, BookingListQuery, BookingListResponse,
    BookingPolicy, BookingStatus, Caller, CreateBookingRequest, DateRange, NewBooking,
    PaymentStatus, Role,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Calendar day the ledger considers "today" (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub struct BookingService;

impl BookingService {
    /// Create a booking request for a traveler
    /// DOCUMENTATION: The listing row stays locked from the availability
    /// check until the insert commits, so two travelers cannot both get
    /// the same dates
    pub async fn request_booking(
        pool: &PgPool,
        policy: &BookingPolicy,
        caller: &Caller,
        req: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        caller.require_role(Role::Traveler)?;

        let range = DateRange::new(req.start_date, req.end_date)?;
        policy.check_range(&range, today())?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| BookingError::from_db("Failed to start booking transaction", e))?;

        let listing = ListingRepository::lock_for_booking(&mut tx, &req.listing_id).await?;
        listing.ensure_bookable()?;
        listing.ensure_capacity(req.guests)?;

        let conflicts =
            BookingRepository::find_overlapping(&mut *tx, &listing.id, &range).await?;
        if !conflicts.is_empty() {
            log::info!(
                "Booking request for {} {}..{} conflicts with {} booking(s)",
                listing.id,
                range.start,
                range.end,
                conflicts.len()
            );
            return Err(BookingError::Conflict(
                "listing is already booked for the requested dates".to_string(),
            ));
        }

        let new = NewBooking {
            id: Uuid::new_v4(),
            listing_id: listing.id.clone(),
            traveler_id: caller.user_id.clone(),
            partner_id: listing.partner_id.clone(),
            range,
            guests: req.guests,
            total_price: total_price(listing.price, &range),
            note: req.note,
        };

        let booking = BookingRepository::insert(&mut tx, &new).await?;
        BookingRepository::insert_event(
            &mut tx,
            booking.id,
            None,
            BookingStatus::Requested,
            &caller.user_id,
            caller.role.as_str(),
            booking.note.as_deref(),
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| BookingError::from_db("Failed to commit booking", e))?;

        log::info!(
            "Booking {} requested by {} for listing {} ({} nights, {} guests)",
            booking.id,
            caller.user_id,
            booking.listing_id,
            booking.nights,
            booking.guests
        );
        Ok(booking)
    }

    /// Apply accept / reject / cancel / complete to a booking
    pub async fn decide(
        pool: &PgPool,
        caller: &Caller,
        id: Uuid,
        action: BookingAction,
        note: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| BookingError::from_db("Failed to start transition transaction", e))?;

        let booking = BookingRepository::get_for_update(&mut tx, id).await?;
        let (to, payment_status) = Self::plan_decision(caller, &booking, action, today())?;

        let change = StatusChange {
            from: booking.status,
            to,
            payment_status,
            actor_id: &caller.user_id,
            actor_role: caller.role.as_str(),
            note: note.as_deref(),
        };
        let updated = BookingRepository::update_status(&mut tx, id, &change).await?;

        tx.commit()
            .await
            .map_err(|e| BookingError::from_db("Failed to commit transition", e))?;

        log::info!(
            "Booking {} {} -> {} by {} ({})",
            id,
            change.from,
            change.to,
            caller.user_id,
            caller.role.as_str()
        );
        Ok(updated)
    }

    /// Target status and payment marker for `action`, or why it is refused
    /// DOCUMENTATION: Bookings the caller cannot see are reported as missing
    pub fn plan_decision(
        caller: &Caller,
        booking: &Booking,
        action: BookingAction,
        today: NaiveDate,
    ) -> Result<(BookingStatus, PaymentStatus), BookingError> {
        if !caller.can_view(booking) {
            return Err(BookingError::NotFound(format!("booking '{}'", booking.id)));
        }

        Self::authorize(caller, booking, action, today)?;
        let to = booking.status.after(action)?;
        Ok((to, booking.payment_status.after(to)))
    }

    /// Who may apply which action, and when
    /// DOCUMENTATION: The owning partner adjudicates; the traveler may only
    /// cancel, and only before the check-in day; admin may do anything a
    /// partner may. Nobody expires a booking by hand.
    pub fn authorize(
        caller: &Caller,
        booking: &Booking,
        action: BookingAction,
        today: NaiveDate,
    ) -> Result<(), BookingError> {
        match action {
            BookingAction::Accept | BookingAction::Reject => {
                caller.require_partner(&booking.partner_id)
            }
            BookingAction::Complete => {
                caller.require_partner(&booking.partner_id)?;
                if booking.start_date > today {
                    return Err(BookingError::Conflict(
                        "a booking cannot be completed before its check-in day".to_string(),
                    ));
                }
                Ok(())
            }
            BookingAction::Cancel => {
                if caller.is_admin() || caller.is_partner(&booking.partner_id) {
                    return Ok(());
                }
                if caller.is_traveler_of(booking) {
                    if booking.start_date <= today {
                        return Err(BookingError::Conflict(
                            "travelers cannot cancel on or after the check-in day".to_string(),
                        ));
                    }
                    return Ok(());
                }
                Err(BookingError::Forbidden(
                    "only the traveler or the owning partner can cancel".to_string(),
                ))
            }
            BookingAction::Expire => Err(BookingError::Forbidden(
                "expiry is applied by the ledger sweep only".to_string(),
            )),
        }
    }

    /// Get a single booking visible to the caller
    pub async fn get_booking(
        pool: &PgPool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        let booking = BookingRepository::get_by_id(pool, id).await?;
        if !caller.can_view(&booking) {
            log::warn!("User {} tried to read booking {}", caller.user_id, id);
            return Err(BookingError::NotFound(format!("booking '{}'", id)));
        }
        Ok(booking)
    }

    /// Status history of a booking visible to the caller
    pub async fn history(
        pool: &PgPool,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        Self::get_booking(pool, caller, id).await?;
        BookingRepository::events(pool, id).await
    }

    /// Bookings scoped to the caller's role
    pub async fn list_bookings(
        pool: &PgPool,
        caller: &Caller,
        query: &BookingListQuery,
    ) -> Result<BookingListResponse, BookingError> {
        let filter = Self::scope_for(caller, query.status()?);
        Self::list_with_filter(pool, &filter, query).await
    }

    /// Filter limiting a list to what the caller may see
    pub fn scope_for(caller: &Caller, status: Option<BookingStatus>) -> BookingFilter {
        match caller.role {
            Role::Traveler => BookingFilter {
                traveler_id: Some(caller.user_id.clone()),
                status,
                ..Default::default()
            },
            Role::Partner => BookingFilter {
                partner_id: caller.partner_id.clone(),
                status,
                ..Default::default()
            },
            Role::Admin => BookingFilter {
                status,
                ..Default::default()
            },
        }
    }

    pub async fn list_with_filter(
        pool: &PgPool,
        filter: &BookingFilter,
        query: &BookingListQuery,
    ) -> Result<BookingListResponse, BookingError> {
        let (page, limit, offset) = query.pagination();
        let (data, total_count) = BookingRepository::list(pool, filter, limit, offset).await?;

        Ok(BookingListResponse::new(data, total_count, page, limit))
    }
}
