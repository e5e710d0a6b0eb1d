// src/models/caller.rs
// DOCUMENTATION: Identity of whoever is calling the API
// PURPOSE: Roles forwarded by the gateway after token verification

use crate::errors::BookingError;
use crate::models::Booking;
use serde::Serialize;
use std::str::FromStr;

/// Marketplace role of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Traveler,
    Partner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Traveler => "traveler",
            Role::Partner => "partner",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "traveler" => Ok(Role::Traveler),
            "partner" => Ok(Role::Partner),
            "admin" => Ok(Role::Admin),
            other => Err(BookingError::Forbidden(format!("unknown role '{}'", other))),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    /// Set for partner accounts
    pub partner_id: Option<String>,
}

impl Caller {
    pub fn new(user_id: String, role: Role, partner_id: Option<String>) -> Result<Self, BookingError> {
        if role == Role::Partner && partner_id.is_none() {
            return Err(BookingError::Forbidden(
                "Partner account not fully configured".to_string(),
            ));
        }
        Ok(Self {
            user_id,
            role,
            partner_id,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True for the partner that owns `partner_id`
    pub fn is_partner(&self, partner_id: &str) -> bool {
        self.role == Role::Partner && self.partner_id.as_deref() == Some(partner_id)
    }

    pub fn is_traveler_of(&self, booking: &Booking) -> bool {
        self.role == Role::Traveler && self.user_id == booking.traveler_id
    }

    pub fn can_view(&self, booking: &Booking) -> bool {
        self.is_admin() || self.is_partner(&booking.partner_id) || self.is_traveler_of(booking)
    }

    /// Partner owning `partner_id`, or admin
    pub fn require_partner(&self, partner_id: &str) -> Result<(), BookingError> {
        if self.is_admin() || self.is_partner(partner_id) {
            Ok(())
        } else {
            log::warn!(
                "Access denied: user {} with role '{}' is not partner {}",
                self.user_id,
                self.role.as_str(),
                partner_id
            );
            Err(BookingError::Forbidden(
                "only the owning partner can do this".to_string(),
            ))
        }
    }

    pub fn require_role(&self, role: Role) -> Result<(), BookingError> {
        if self.role == role {
            Ok(())
        } else {
            Err(BookingError::Forbidden(format!(
                "Access denied. Required role: {}",
                role.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Partner".parse::<Role>().unwrap(), Role::Partner);
        assert_eq!(" traveler ".parse::<Role>().unwrap(), Role::Traveler);
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(BookingError::Forbidden(_))
        ));
    }

    #[test]
    fn test_partner_needs_partner_id() {
        assert!(Caller::new("u1".into(), Role::Partner, None).is_err());
        assert!(Caller::new("u1".into(), Role::Partner, Some("p1".into())).is_ok());
        assert!(Caller::new("u1".into(), Role::Traveler, None).is_ok());
    }

    #[test]
    fn test_partner_ownership() {
        let partner = Caller::new("u1".into(), Role::Partner, Some("p1".into())).unwrap();
        assert!(partner.require_partner("p1").is_ok());
        assert!(partner.require_partner("p2").is_err());

        let admin = Caller::new("root".into(), Role::Admin, None).unwrap();
        assert!(admin.require_partner("p2").is_ok());

        // a traveler with a stray partner id is still not a partner
        let traveler = Caller::new("u2".into(), Role::Traveler, Some("p1".into())).unwrap();
        assert!(traveler.require_partner("p1").is_err());
    }
}
