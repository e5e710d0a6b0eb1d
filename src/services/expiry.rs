// src/services/expiry.rs
// DOCUMENTATION: Sweep of booking requests nobody answered in time
// PURPOSE: Free the dates held by requests whose check-in day has passed

use crate::db::BookingRepository;
use crate::errors::BookingError;
use crate::models::{BookingAction, BookingStatus, PaymentStatus};
use crate::services::today;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Result of one sweep
#[derive(Debug, Serialize)]
pub struct ExpiryReport {
    pub expired_count: usize,
    pub expired_ids: Vec<Uuid>,
}

pub struct ExpiryService;

impl ExpiryService {
    /// Status and payment marker an unanswered request ends in
    pub fn expired_outcome() -> Result<(BookingStatus, PaymentStatus), BookingError> {
        let to = BookingStatus::Requested.after(BookingAction::Expire)?;
        Ok((to, PaymentStatus::Unpaid.after(to)))
    }

    /// Reject all stale requests as of today
    pub async fn run(pool: &PgPool) -> Result<ExpiryReport, BookingError> {
        let (to, payment_status) = Self::expired_outcome()?;
        let expired_ids =
            BookingRepository::expire_stale(pool, today(), to, payment_status).await?;

        if !expired_ids.is_empty() {
            log::info!("Expired {} unanswered booking request(s)", expired_ids.len());
        }

        Ok(ExpiryReport {
            expired_count: expired_ids.len(),
            expired_ids,
        })
    }
}

/// Start background expiry task
/// DOCUMENTATION: Failures are logged and retried on the next tick
pub fn start_expiry_task(pool: PgPool, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            if let Err(e) = ExpiryService::run(&pool).await {
                log::error!("Booking expiry sweep failed: {}", e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_requests_are_rejected_and_void() {
        let (to, payment) = ExpiryService::expired_outcome().unwrap();
        assert_eq!(to, BookingStatus::Rejected);
        assert_eq!(payment, PaymentStatus::Void);
    }
}
