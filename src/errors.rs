// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the booking ledger

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use thiserror::Error;

/// SQLSTATE raised by PostgreSQL when an exclusion constraint rejects a row
const EXCLUSION_VIOLATION: &str = "23P01";

/// Application-specific error types
/// DOCUMENTATION: Every failure the ledger can report
/// Each variant maps to an HTTP status code and a JSON error body
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Cannot {action} a booking that is {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    InternalError,

    #[error("Rate limit exceeded, retry in {retry_after}s")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl BookingError {
    /// Convert a sqlx error into a ledger error
    /// DOCUMENTATION: Exclusion violations on the bookings table mean
    /// another request won the same dates, everything else is a database failure
    pub fn from_db(context: &str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
                log::warn!("{}: overlapping booking rejected by constraint", context);
                return BookingError::Conflict(
                    "listing is already booked for the requested dates".to_string(),
                );
            }
        }
        log::error!("{}: {}", context, err);
        BookingError::DatabaseError(err.to_string())
    }

    fn error_code(&self) -> &'static str {
        match self {
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            BookingError::DatabaseError(_) => "DATABASE_ERROR",
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::ValidationError(_) => "VALIDATION_ERROR",
            BookingError::Unauthorized => "UNAUTHORIZED",
            BookingError::Forbidden(_) => "FORBIDDEN",
            BookingError::InternalError => "INTERNAL_ERROR",
            BookingError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            BookingError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Convert BookingError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for BookingError {
    fn error_response(&self) -> HttpResponse {
        // Database details stay in the logs
        let message = match self {
            BookingError::DatabaseError(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        let mut response = HttpResponse::build(self.status_code());
        if let BookingError::RateLimitExceeded { retry_after } = self {
            response.insert_header((header::RETRY_AFTER, retry_after.to_string()));
        }
        response.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
            BookingError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BookingError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BookingError::Unauthorized => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            BookingError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BookingError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BookingError::InvalidTransition {
                from: "cancelled".into(),
                action: "accept".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BookingError::RateLimitExceeded { retry_after: 1 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            BookingError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_transition_message() {
        let err = BookingError::InvalidTransition {
            from: "cancelled".into(),
            action: "accept".into(),
        };
        assert_eq!(err.to_string(), "Cannot accept a booking that is cancelled");
    }

    #[actix_rt::test]
    async fn test_database_details_are_hidden() {
        let err = BookingError::DatabaseError("relation \"bookings\" does not exist".into());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "DATABASE_ERROR");
        assert_eq!(json["error"]["message"], "Database error");
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = BookingError::RateLimitExceeded { retry_after: 12 }.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap().to_str().unwrap(),
            "12"
        );

        let other = BookingError::Conflict("taken".into()).error_response();
        assert!(other.headers().get(header::RETRY_AFTER).is_none());
    }

    /// Postgres-style error carrying only a SQLSTATE
    #[derive(Debug)]
    struct SqlState(&'static str);

    impl std::fmt::Display for SqlState {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "sqlstate {}", self.0)
        }
    }

    impl std::error::Error for SqlState {}

    impl sqlx::error::DatabaseError for SqlState {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn test_exclusion_violation_is_conflict() {
        let err = BookingError::from_db(
            "insert booking",
            sqlx::Error::Database(Box::new(SqlState("23P01"))),
        );
        assert!(matches!(err, BookingError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        // unique violation is not an overlap
        let err = BookingError::from_db(
            "insert booking",
            sqlx::Error::Database(Box::new(SqlState("23505"))),
        );
        assert!(matches!(err, BookingError::DatabaseError(_)));
    }

    #[test]
    fn test_non_database_sqlx_error_maps_to_database_error() {
        let err = BookingError::from_db("test", sqlx::Error::RowNotFound);
        assert!(matches!(err, BookingError::DatabaseError(_)));
    }
}
