// src/handlers/listings.rs
// DOCUMENTATION: Listing-scoped ledger endpoints
// PURPOSE: Availability checks and partner views of a listing's bookings

use crate::errors::BookingError;
use crate::handlers::identity::client_key;
use crate::models::{AvailabilityQuery, BookingListQuery, Caller};
use crate::services::{BookingRateLimiter, ListingCache, ListingService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;

/// GET /listings/{id}/availability?start_date=..&end_date=..
/// Real-time, never cached. Open without identity headers, limited per client.
pub async fn check_availability(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Option<Caller>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<impl Responder, BookingError> {
    limiter.check(&client_key(&http, caller.as_ref()))?;

    let listing_id = path.into_inner();
    let check = ListingService::check_availability(
        pool.get_ref(),
        &listing_id,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(HttpResponse::Ok().json(check))
}

/// GET /listings/{id}/bookings
pub async fn listing_bookings(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ListingCache>>,
    caller: Caller,
    path: web::Path<String>,
    query: web::Query<BookingListQuery>,
) -> Result<impl Responder, BookingError> {
    let result = ListingService::listing_bookings(
        pool.get_ref(),
        cache.get_ref(),
        &caller,
        &path.into_inner(),
        &query,
    )
    .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /listings/{id}/stats
pub async fn listing_stats(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ListingCache>>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<impl Responder, BookingError> {
    let stats =
        ListingService::listing_stats(pool.get_ref(), cache.get_ref(), &caller, &path.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Configuration for listing routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/listings")
            .route("/{id}/availability", web::get().to(check_availability))
            .route("/{id}/bookings", web::get().to(listing_bookings))
            .route("/{id}/stats", web::get().to(listing_stats)),
    );
}
