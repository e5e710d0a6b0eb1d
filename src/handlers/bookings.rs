// src/handlers/bookings.rs
// DOCUMENTATION: HTTP handlers for the booking lifecycle
// PURPOSE: Parse requests, call BookingService, return responses

use crate::errors::BookingError;
use crate::handlers::identity::client_key;
use crate::handlers::payload::decision_body;
use crate::models::{BookingAction, BookingListQuery, BookingPolicy, Caller, CreateBookingRequest};
use crate::services::{BookingRateLimiter, BookingService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /bookings
/// Request a booking (travelers only)
pub async fn create_booking(
    pool: web::Data<PgPool>,
    policy: web::Data<BookingPolicy>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    req: web::Json<CreateBookingRequest>,
) -> Result<impl Responder, BookingError> {
    limiter.check(&client_key(&http, Some(&caller)))?;

    if let Err(e) = req.validate() {
        return Err(BookingError::ValidationError(e.to_string()));
    }

    let booking =
        BookingService::request_booking(pool.get_ref(), policy.get_ref(), &caller, req.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(booking))
}

/// GET /bookings
/// Bookings visible to the caller
pub async fn list_bookings(
    pool: web::Data<PgPool>,
    caller: Caller,
    query: web::Query<BookingListQuery>,
) -> Result<impl Responder, BookingError> {
    let result = BookingService::list_bookings(pool.get_ref(), &caller, &query).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /bookings/{id}
pub async fn get_booking(
    pool: web::Data<PgPool>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BookingError> {
    let booking = BookingService::get_booking(pool.get_ref(), &caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// GET /bookings/{id}/events
/// Status history, oldest first
pub async fn booking_events(
    pool: web::Data<PgPool>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<impl Responder, BookingError> {
    let events = BookingService::history(pool.get_ref(), &caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(events))
}

async fn decide(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    id: Uuid,
    body: web::Bytes,
    action: BookingAction,
) -> Result<HttpResponse, BookingError> {
    limiter.check(&client_key(&http, Some(&caller)))?;

    let decision = decision_body(&body)?;

    let booking = BookingService::decide(pool.get_ref(), &caller, id, action, decision.note).await?;
    Ok(HttpResponse::Ok().json(booking))
}

/// POST /bookings/{id}/accept
pub async fn accept_booking(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, BookingError> {
    decide(pool, limiter, http, caller, path.into_inner(), body, BookingAction::Accept).await
}

/// POST /bookings/{id}/reject
pub async fn reject_booking(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, BookingError> {
    decide(pool, limiter, http, caller, path.into_inner(), body, BookingAction::Reject).await
}

/// POST /bookings/{id}/cancel
pub async fn cancel_booking(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, BookingError> {
    decide(pool, limiter, http, caller, path.into_inner(), body, BookingAction::Cancel).await
}

/// POST /bookings/{id}/complete
/// Guest arrived and paid on arrival
pub async fn complete_booking(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<BookingRateLimiter>>,
    http: HttpRequest,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<impl Responder, BookingError> {
    decide(pool, limiter, http, caller, path.into_inner(), body, BookingAction::Complete).await
}

/// Configuration for booking routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_bookings))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}/events", web::get().to(booking_events))
            .route("/{id}/accept", web::post().to(accept_booking))
            .route("/{id}/reject", web::post().to(reject_booking))
            .route("/{id}/cancel", web::post().to(cancel_booking))
            .route("/{id}/complete", web::post().to(complete_booking)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::identity::{USER_ID_HEADER, USER_ROLE_HEADER};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test as actix_test, App};
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://skyconnect@127.0.0.1:1/bookings")
            .unwrap()
    }

    #[actix_web::test]
    async fn test_decision_requests_rejected_before_database() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unreachable_pool()))
                .app_data(web::Data::new(Arc::new(BookingRateLimiter::new(1))))
                .configure(crate::handlers::payload_config)
                .configure(config),
        )
        .await;
        let uri = format!("/bookings/{}/accept", Uuid::new_v4());

        // no identity
        let req = actix_test::TestRequest::post().uri(&uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // id is not a UUID
        let req = actix_test::TestRequest::post()
            .uri("/bookings/42/accept")
            .insert_header((USER_ID_HEADER, "usr_admin"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // malformed note is refused, not dropped
        let req = actix_test::TestRequest::post()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, "usr_admin"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(r#"{"note": 42}"#)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        // the malformed request used up the one decision allowed per minute
        let req = actix_test::TestRequest::post()
            .uri(&uri)
            .insert_header((USER_ID_HEADER, "usr_admin"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .set_payload("not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().get(header::RETRY_AFTER).is_some());
    }
}
