// src/handlers/identity.rs
// DOCUMENTATION: Caller identity and admin token checks
// PURPOSE: Turn gateway headers into a Caller for every handler

use crate::config::Config;
use crate::errors::BookingError;
use crate::models::{Caller, Role};
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const PARTNER_ID_HEADER: &str = "X-Partner-Id";
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the caller from the headers the gateway sets after verifying
/// the identity token. A missing role means traveler.
pub fn caller_from_request(req: &HttpRequest) -> Result<Caller, BookingError> {
    let user_id = header(req, USER_ID_HEADER).ok_or_else(|| {
        log::warn!("Request to {} without {}", req.path(), USER_ID_HEADER);
        BookingError::Unauthorized
    })?;

    let role = match header(req, USER_ROLE_HEADER) {
        Some(role) => role.parse::<Role>()?,
        None => Role::Traveler,
    };

    let partner_id = header(req, PARTNER_ID_HEADER).map(str::to_string);

    Caller::new(user_id.to_string(), role, partner_id).map_err(|e| {
        log::warn!("Partner without partner id: user {}", user_id);
        e
    })
}

impl FromRequest for Caller {
    type Error = BookingError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from_request(req))
    }
}

/// Key for rate limiting: the user when known, else the client address
pub fn client_key(req: &HttpRequest, caller: Option<&Caller>) -> String {
    match caller {
        Some(caller) => format!("user:{}", caller.user_id),
        None => {
            let info = req.connection_info();
            format!("ip:{}", info.realip_remote_addr().unwrap_or("unknown"))
        }
    }
}

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
pub fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), BookingError> {
    let token = header(req, ADMIN_TOKEN_HEADER).ok_or_else(|| {
        log::warn!("Admin request without token");
        BookingError::Unauthorized
    })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(BookingError::Forbidden("invalid admin token".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    async fn whoami(caller: Caller) -> HttpResponse {
        HttpResponse::Ok().json(caller)
    }

    #[actix_web::test]
    async fn test_defaults_to_traveler() {
        let req = test::TestRequest::default()
            .insert_header((USER_ID_HEADER, "trv_amaya"))
            .to_http_request();
        let caller = caller_from_request(&req).unwrap();
        assert_eq!(caller.role, Role::Traveler);
        assert_eq!(caller.user_id, "trv_amaya");
    }

    #[actix_web::test]
    async fn test_missing_user_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();
        assert!(matches!(
            caller_from_request(&req),
            Err(BookingError::Unauthorized)
        ));
    }

    #[actix_web::test]
    async fn test_partner_without_partner_id_is_forbidden() {
        let req = test::TestRequest::default()
            .insert_header((USER_ID_HEADER, "usr_1"))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .to_http_request();
        assert!(matches!(
            caller_from_request(&req),
            Err(BookingError::Forbidden(_))
        ));
    }

    #[actix_web::test]
    async fn test_extractor_in_app() {
        let app = test::init_service(App::new().route("/whoami", web::get().to(whoami))).await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((USER_ID_HEADER, "usr_1"))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .insert_header((PARTNER_ID_HEADER, "ptn_hill_stays"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["role"], "partner");
        assert_eq!(body["partner_id"], "ptn_hill_stays");

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_admin_token() {
        let config = Config {
            admin_token: "s3cret".to_string(),
            ..Config::from_env()
        };

        let ok = test::TestRequest::default()
            .insert_header((ADMIN_TOKEN_HEADER, "s3cret"))
            .to_http_request();
        assert!(verify_admin_token(&ok, &config).is_ok());

        let wrong = test::TestRequest::default()
            .insert_header((ADMIN_TOKEN_HEADER, "guess"))
            .to_http_request();
        assert!(matches!(
            verify_admin_token(&wrong, &config),
            Err(BookingError::Forbidden(_))
        ));

        let missing = test::TestRequest::default().to_http_request();
        assert!(matches!(
            verify_admin_token(&missing, &config),
            Err(BookingError::Unauthorized)
        ));
    }

    #[actix_web::test]
    async fn test_client_key_prefers_user() {
        let req = test::TestRequest::default()
            .peer_addr("10.0.0.7:5555".parse().unwrap())
            .to_http_request();
        let caller = Caller::new("trv_amaya".into(), Role::Traveler, None).unwrap();

        assert_eq!(client_key(&req, Some(&caller)), "user:trv_amaya");
        assert_eq!(client_key(&req, None), "ip:10.0.0.7");
    }
}
