// src/handlers/payload.rs
// DOCUMENTATION: Request body, query and path parsing
// PURPOSE: Extractor failures answer with the same JSON error body as the ledger

use crate::errors::BookingError;
use crate::models::DecisionRequest;
use actix_web::{error, web, HttpRequest};
use validator::Validate;

fn rejected(kind: &str, req: &HttpRequest, detail: String) -> error::Error {
    log::debug!("Rejected {} for {} {}: {}", kind, req.method(), req.path(), detail);
    BookingError::ValidationError(detail).into()
}

/// Register extractor error handlers for the whole app
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, req| rejected("JSON body", req, err.to_string())),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, req| rejected("query string", req, err.to_string())),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, req| rejected("path", req, err.to_string())),
    );
}

/// Decision bodies are optional, but a body that is present must parse
pub fn decision_body(body: &[u8]) -> Result<DecisionRequest, BookingError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DecisionRequest::default());
    }

    let decision: DecisionRequest = serde_json::from_slice(body)
        .map_err(|e| BookingError::ValidationError(format!("invalid decision body: {}", e)))?;

    decision
        .validate()
        .map_err(|e| BookingError::ValidationError(e.to_string()))?;

    Ok(decision)
}
