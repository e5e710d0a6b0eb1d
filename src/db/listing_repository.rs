// src/db/listing_repository.rs
// DOCUMENTATION: Read access to the listing read model
// PURPOSE: Listing lookups joined with partner approval status

use crate::errors::BookingError;
use crate::models::Listing;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

const SELECT_LISTING: &str = r#"
    SELECT
        l.id, l.partner_id, l.title, l.description, l.location, l.category,
        l.price, l.capacity, l.status, l.available,
        p.approval_status AS partner_status,
        l.rating, l.review_count, l.created_at, l.updated_at
    FROM listings l
    JOIN partners p ON p.id = l.partner_id
    WHERE l.id = $1
"#;

/// Internal struct for mapping database rows to Listing
/// DOCUMENTATION: Status columns are text and parsed on the way out
#[derive(Debug, FromRow)]
struct ListingRow {
    pub id: String,
    pub partner_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub price: f64,
    pub capacity: i32,
    pub status: String,
    pub available: bool,
    pub partner_status: String,
    pub rating: f32,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRow {
    fn to_listing(self) -> Result<Listing, BookingError> {
        Ok(Listing {
            status: self.status.parse()?,
            partner_status: self.partner_status.parse()?,
            id: self.id,
            partner_id: self.partner_id,
            title: self.title,
            description: self.description,
            location: self.location,
            category: self.category,
            price: self.price,
            capacity: self.capacity,
            available: self.available,
            rating: self.rating,
            review_count: self.review_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct ListingRepository;

impl ListingRepository {
    /// Retrieve listing by ID
    pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Listing, BookingError> {
        let row = sqlx::query_as::<_, ListingRow>(SELECT_LISTING)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| BookingError::from_db("Failed to fetch listing", e))?
            .ok_or_else(|| {
                log::warn!("Listing not found: {}", id);
                BookingError::NotFound(format!("listing '{}'", id))
            })?;

        row.to_listing()
    }

    /// Retrieve listing and lock its row until the transaction ends
    /// DOCUMENTATION: Serialises booking requests on the same listing
    pub async fn lock_for_booking(
        conn: &mut PgConnection,
        id: &str,
    ) -> Result<Listing, BookingError> {
        let sql = format!("{} FOR UPDATE OF l", SELECT_LISTING);

        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| BookingError::from_db("Failed to lock listing", e))?
            .ok_or_else(|| BookingError::NotFound(format!("listing '{}'", id)))?;

        row.to_listing()
    }

    /// Connectivity check for /health
    pub async fn ping(pool: &PgPool) -> Result<(), BookingError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| BookingError::from_db("Health check query failed", e))?;
        Ok(())
    }
}
