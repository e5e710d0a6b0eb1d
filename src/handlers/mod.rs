// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod admin;
pub mod bookings;
pub mod health;
pub mod identity;
pub mod listings;
pub mod payload;

pub use admin::config as admin_config;
pub use bookings::config as bookings_config;
pub use health::config as health_config;
pub use listings::config as listings_config;
pub use payload::config as payload_config;
