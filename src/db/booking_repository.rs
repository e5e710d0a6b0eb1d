// src/db/booking_repository.rs
// DOCUMENTATION: Booking ledger database operations
// PURPOSE: All SQL touching bookings and booking_events

use crate::errors::BookingError;
use crate::models::{
    Booking, BookingEvent, BookingStatus, DateRange, NewBooking, PaymentMethod, PaymentStatus,
    StatusCount,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = r#"
    id, listing_id, traveler_id, partner_id, start_date, end_date, guests,
    status, payment_method, payment_status, total_price, note, decision_note,
    created_at, updated_at
"#;

/// Internal struct for mapping database rows to Booking
#[derive(Debug, FromRow)]
struct BookingRow {
    pub id: Uuid,
    pub listing_id: String,
    pub traveler_id: String,
    pub partner_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub guests: i32,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub total_price: f64,
    pub note: Option<String>,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn to_booking(self) -> Result<Booking, BookingError> {
        Ok(Booking {
            nights: (self.end_date - self.start_date).num_days(),
            status: self.status.parse()?,
            payment_method: self.payment_method.parse()?,
            payment_status: self.payment_status.parse()?,
            id: self.id,
            listing_id: self.listing_id,
            traveler_id: self.traveler_id,
            partner_id: self.partner_id,
            start_date: self.start_date,
            end_date: self.end_date,
            guests: self.guests,
            total_price: self.total_price,
            note: self.note,
            decision_note: self.decision_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn to_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingError> {
    rows.into_iter().map(BookingRow::to_booking).collect()
}

/// Who a booking list is scoped to
/// DOCUMENTATION: None fields are not filtered on
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub traveler_id: Option<String>,
    pub partner_id: Option<String>,
    pub listing_id: Option<String>,
    pub status: Option<BookingStatus>,
}

/// A status change to persist
#[derive(Debug, Clone)]
pub struct StatusChange<'a> {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub payment_status: PaymentStatus,
    pub actor_id: &'a str,
    pub actor_role: &'a str,
    pub note: Option<&'a str>,
}

pub struct BookingRepository;

impl BookingRepository {
    /// Insert a new booking in `requested` status
    /// DOCUMENTATION: Must run inside the transaction that locked the listing
    pub async fn insert(conn: &mut PgConnection, new: &NewBooking) -> Result<Booking, BookingError> {
        let sql = format!(
            r#"
            INSERT INTO bookings (
                id, listing_id, traveler_id, partner_id, start_date, end_date,
                guests, status, payment_method, payment_status, total_price, note,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW())
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );

        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(new.id) // $1
            .bind(&new.listing_id) // $2
            .bind(&new.traveler_id) // $3
            .bind(&new.partner_id) // $4
            .bind(new.range.start) // $5
            .bind(new.range.end) // $6
            .bind(new.guests) // $7
            .bind(BookingStatus::Requested.as_str()) // $8
            .bind(PaymentMethod::PayOnArrival.as_str()) // $9
            .bind(PaymentStatus::Unpaid.as_str()) // $10
            .bind(new.total_price) // $11
            .bind(&new.note) // $12
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| BookingError::from_db("Failed to insert booking", e))?;

        row.to_booking()
    }

    /// Retrieve booking by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Booking, BookingError> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);

        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| BookingError::from_db("Failed to fetch booking", e))?
            .ok_or_else(|| BookingError::NotFound(format!("booking '{}'", id)))?
            .to_booking()
    }

    /// Retrieve booking by ID and lock it for a status change
    pub async fn get_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Booking, BookingError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
            BOOKING_COLUMNS
        );

        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| BookingError::from_db("Failed to lock booking", e))?
            .ok_or_else(|| BookingError::NotFound(format!("booking '{}'", id)))?
            .to_booking()
    }

    /// IDs of open bookings on `listing_id` overlapping `range`
    /// DOCUMENTATION: Works on the pool for availability checks and on a
    /// transaction for booking requests
    pub async fn find_overlapping<'e, E>(
        executor: E,
        listing_id: &str,
        range: &DateRange,
    ) -> Result<Vec<Uuid>, BookingError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let open: Vec<&str> = BookingStatus::OPEN.iter().map(|s| s.as_str()).collect();

        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM bookings
            WHERE listing_id = $1
              AND status = ANY($2)
              AND start_date < $4
              AND end_date > $3
            ORDER BY start_date
            "#,
        )
        .bind(listing_id)
        .bind(&open)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(executor)
        .await
        .map_err(|e| BookingError::from_db("Failed to check overlapping bookings", e))?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Compare-and-set the status of a booking
    /// DOCUMENTATION: Only succeeds while the row still has `change.from`,
    /// so two concurrent decisions cannot both apply
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        change: &StatusChange<'_>,
    ) -> Result<Booking, BookingError> {
        let sql = format!(
            r#"
            UPDATE bookings
            SET status = $1,
                payment_status = $2,
                decision_note = COALESCE($3, decision_note),
                updated_at = NOW()
            WHERE id = $4 AND status = $5
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );

        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(change.to.as_str())
            .bind(change.payment_status.as_str())
            .bind(change.note)
            .bind(id)
            .bind(change.from.as_str())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| BookingError::from_db("Failed to update booking status", e))?
            .ok_or_else(|| {
                log::warn!("Booking {} changed status concurrently", id);
                BookingError::Conflict(format!("booking '{}' was modified concurrently", id))
            })?;

        Self::insert_event(
            conn,
            id,
            Some(change.from),
            change.to,
            change.actor_id,
            change.actor_role,
            change.note,
        )
        .await?;

        row.to_booking()
    }

    /// Append a history event
    pub async fn insert_event(
        conn: &mut PgConnection,
        booking_id: Uuid,
        from: Option<BookingStatus>,
        to: BookingStatus,
        actor_id: &str,
        actor_role: &str,
        note: Option<&str>,
    ) -> Result<(), BookingError> {
        sqlx::query(
            r#"
            INSERT INTO booking_events (booking_id, from_status, to_status, actor_id, actor_role, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking_id)
        .bind(from.map(|s| s.as_str()))
        .bind(to.as_str())
        .bind(actor_id)
        .bind(actor_role)
        .bind(note)
        .execute(&mut *conn)
        .await
        .map_err(|e| BookingError::from_db("Failed to record booking event", e))?;

        Ok(())
    }

    /// History of a booking, oldest first
    pub async fn events(pool: &PgPool, booking_id: Uuid) -> Result<Vec<BookingEvent>, BookingError> {
        sqlx::query_as::<_, BookingEvent>(
            r#"
            SELECT id, booking_id, from_status, to_status, actor_id, actor_role, note, created_at
            FROM booking_events
            WHERE booking_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
        .map_err(|e| BookingError::from_db("Failed to fetch booking events", e))
    }

    /// Filtered, paginated booking list, newest first
    /// Returns tuple: (results, total_count)
    pub async fn list(
        pool: &PgPool,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64), BookingError> {
        let where_clause = r#"
            WHERE ($1::text IS NULL OR traveler_id = $1)
              AND ($2::text IS NULL OR partner_id = $2)
              AND ($3::text IS NULL OR listing_id = $3)
              AND ($4::text IS NULL OR status = $4)
        "#;
        let status = filter.status.map(|s| s.as_str());

        let count_sql = format!("SELECT COUNT(*) FROM bookings {}", where_clause);
        let total: (i64,) = sqlx::query_as(&count_sql)
            .bind(&filter.traveler_id)
            .bind(&filter.partner_id)
            .bind(&filter.listing_id)
            .bind(status)
            .fetch_one(pool)
            .await
            .map_err(|e| BookingError::from_db("Booking count query error", e))?;

        let sql = format!(
            "SELECT {} FROM bookings {} ORDER BY created_at DESC LIMIT $5 OFFSET $6",
            BOOKING_COLUMNS, where_clause
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(&filter.traveler_id)
            .bind(&filter.partner_id)
            .bind(&filter.listing_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
            .map_err(|e| BookingError::from_db("Booking list query error", e))?;

        log::debug!("Booking list: {} rows of {} total", rows.len(), total.0);

        Ok((to_bookings(rows)?, total.0))
    }

    /// Booking counts and revenue grouped by status
    /// DOCUMENTATION: Scoped to one listing, or ledger-wide when None
    pub async fn status_counts(
        pool: &PgPool,
        listing_id: Option<&str>,
    ) -> Result<Vec<StatusCount>, BookingError> {
        sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status,
                   COUNT(*) AS count,
                   COALESCE(SUM(total_price), 0)::float8 AS revenue
            FROM bookings
            WHERE ($1::text IS NULL OR listing_id = $1)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(listing_id)
        .fetch_all(pool)
        .await
        .map_err(|e| BookingError::from_db("Booking stats query error", e))
    }

    /// Move every request whose check-in day passed without an answer to `to`
    /// DOCUMENTATION: Returns the IDs that were expired
    pub async fn expire_stale(
        pool: &PgPool,
        today: NaiveDate,
        to: BookingStatus,
        payment_status: PaymentStatus,
    ) -> Result<Vec<Uuid>, BookingError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| BookingError::from_db("Failed to start expiry transaction", e))?;

        let expired: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = $1,
                payment_status = $2,
                decision_note = 'expired',
                updated_at = NOW()
            WHERE status = $3 AND start_date < $4
            RETURNING id
            "#,
        )
        .bind(to.as_str())
        .bind(payment_status.as_str())
        .bind(BookingStatus::Requested.as_str())
        .bind(today)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| BookingError::from_db("Failed to expire stale requests", e))?;

        let ids: Vec<Uuid> = expired.into_iter().map(|(id,)| id).collect();

        if !ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO booking_events (booking_id, from_status, to_status, actor_id, actor_role, note)
                SELECT id, $2, $3, 'system', 'system', 'expired'
                FROM UNNEST($1::uuid[]) AS id
                "#,
            )
            .bind(&ids)
            .bind(BookingStatus::Requested.as_str())
            .bind(to.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| BookingError::from_db("Failed to record expiry events", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| BookingError::from_db("Failed to commit expiry", e))?;

        Ok(ids)
    }
}
