// src/handlers/admin.rs
// DOCUMENTATION: Admin maintenance handlers
// PURPOSE: Ledger statistics, cache control and on-demand expiry

use crate::config::Config;
use crate::db::BookingRepository;
use crate::errors::BookingError;
use crate::handlers::identity::verify_admin_token;
use crate::models::StatusCount;
use crate::services::{BookingRateLimiter, ExpiryService, ListingCache};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

/// Response for ledger statistics endpoint
#[derive(Debug, Serialize)]
pub struct LedgerStatsResponse {
    /// Bookings across all statuses
    pub total_bookings: i64,
    /// Bookings still holding dates (requested + accepted)
    pub open_bookings: i64,
    pub by_status: Vec<StatusCount>,
    /// Clients currently tracked by the rate limiter
    pub rate_limited_clients: usize,
}

impl LedgerStatsResponse {
    fn new(by_status: Vec<StatusCount>, rate_limited_clients: usize) -> Self {
        let total_bookings = by_status.iter().map(|s| s.count).sum();
        let open_bookings = by_status
            .iter()
            .filter(|s| s.status == "requested" || s.status == "accepted")
            .map(|s| s.count)
            .sum();

        Self {
            total_bookings,
            open_bookings,
            by_status,
            rate_limited_clients,
        }
    }
}

/// GET /admin/stats
/// Ledger-wide booking counts by status
pub async fn ledger_stats(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    req: HttpRequest,
) -> Result<impl Responder, BookingError> {
    verify_admin_token(&req, &config)?;

    let by_status = BookingRepository::status_counts(pool.get_ref(), None).await?;
    Ok(HttpResponse::Ok().json(LedgerStatsResponse::new(
        by_status,
        limiter.tracked_clients(),
    )))
}

/// GET /admin/cache/stats
pub async fn cache_stats(
    cache: web::Data<Arc<ListingCache>>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, BookingError> {
    verify_admin_token(&req, &config)?;
    Ok(HttpResponse::Ok().json(cache.stats().await))
}

/// POST /admin/cache/clear
pub async fn clear_cache(
    cache: web::Data<Arc<ListingCache>>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, BookingError> {
    verify_admin_token(&req, &config)?;

    let cleared = cache.clear().await;
    log::info!("Admin cleared listing cache ({} entries)", cleared);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "cleared": cleared })))
}

/// DELETE /admin/cache/listings/{id}
/// Drop one listing after the read model changed
pub async fn invalidate_listing(
    cache: web::Data<Arc<ListingCache>>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder, BookingError> {
    verify_admin_token(&req, &config)?;

    let listing_id = path.into_inner();
    let removed = cache.invalidate(&listing_id).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "listing_id": listing_id,
        "removed": removed,
    })))
}

/// POST /admin/bookings/expire
/// Run the stale-request sweep now instead of waiting for the next tick
pub async fn expire_bookings(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, BookingError> {
    verify_admin_token(&req, &config)?;

    let report = ExpiryService::run(pool.get_ref()).await?;
    log::info!("Admin expiry sweep: {} expired", report.expired_count);

    Ok(HttpResponse::Ok().json(report))
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(ledger_stats))
            .route("/cache/stats", web::get().to(cache_stats))
            .route("/cache/clear", web::post().to(clear_cache))
            .route("/cache/listings/{id}", web::delete().to(invalidate_listing))
            .route("/bookings/expire", web::post().to(expire_bookings)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::identity::ADMIN_TOKEN_HEADER;
    use crate::models::listing::sample_listing;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};

    fn count(status: &str, count: i64) -> StatusCount {
        StatusCount {
            status: status.to_string(),
            count,
            revenue: 0.0,
        }
    }

    #[test]
    fn test_ledger_stats_totals() {
        let stats = LedgerStatsResponse::new(
            vec![
                count("accepted", 2),
                count("cancelled", 1),
                count("requested", 4),
            ],
            3,
        );
        assert_eq!(stats.total_bookings, 7);
        assert_eq!(stats.open_bookings, 6);
        assert_eq!(stats.rate_limited_clients, 3);
    }

    #[actix_web::test]
    async fn test_cache_routes_require_token() {
        let config = Config {
            admin_token: "s3cret".to_string(),
            ..Config::from_env()
        };
        let cache = Arc::new(ListingCache::new(60));
        cache.set(sample_listing()).await;

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(cache.clone()))
                .configure(super::config),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/admin/cache/clear").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/admin/cache/stats")
            .insert_header((ADMIN_TOKEN_HEADER, "s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["active_entries"], 1);

        let req = actix_test::TestRequest::delete()
            .uri("/admin/cache/listings/lst_unknown")
            .insert_header((ADMIN_TOKEN_HEADER, "s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["removed"], false);

        let req = actix_test::TestRequest::post()
            .uri("/admin/cache/clear")
            .insert_header((ADMIN_TOKEN_HEADER, "s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["cleared"], 1);
        assert_eq!(cache.stats().await.total_entries, 0);
    }
}
