// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Report service status and database reachability

use crate::db::ListingRepository;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

pub async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    let database_ok = ListingRepository::ping(pool.get_ref()).await.is_ok();

    let body = json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "service": "skyconnect-bookings",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "database": if database_ok { "ok" } else { "unreachable" }
        }
    });

    if database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
