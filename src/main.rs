// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, background tasks and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use models::BookingPolicy;
use services::{
    start_cleanup_task, start_expiry_task, start_prune_task, BookingRateLimiter, ListingCache,
};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting skyconnect-bookings service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool (runs migrations)
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Listing cache (availability is never cached)
    let cache = Arc::new(ListingCache::new(config.listing_cache_ttl_secs));
    log::info!(
        "Initialized listing cache (TTL: {}s)",
        config.listing_cache_ttl_secs
    );
    start_cleanup_task(cache.clone(), 300);

    // 6. Rate limiter for booking mutations
    let limiter = Arc::new(BookingRateLimiter::new(config.rate_limit_per_minute));
    log::info!(
        "Rate limit: {} booking actions per minute per caller",
        config.rate_limit_per_minute
    );
    start_prune_task(limiter.clone(), 300);

    // 7. Stale request sweep
    start_expiry_task(pool.clone(), config.expiry_sweep_interval_secs);
    log::info!(
        "Started expiry sweep (interval: {}s)",
        config.expiry_sweep_interval_secs
    );

    let policy = BookingPolicy {
        max_nights: config.max_booking_nights,
        horizon_days: config.booking_horizon_days,
    };

    // 8. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(policy))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Extractor errors use the JSON error body
            .configure(handlers::payload_config)
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::bookings_config)
            .configure(handlers::listings_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
