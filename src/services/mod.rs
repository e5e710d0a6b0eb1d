// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod booking_service;
pub mod cache;
pub mod expiry;
pub mod listing_service;
pub mod rate_limit;

pub use booking_service::*;
pub use cache::*;
pub use expiry::*;
pub use listing_service::*;
pub use rate_limit::*;
