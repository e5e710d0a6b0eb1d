// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod booking_repository;
pub mod listing_repository;

pub use booking_repository::*;
pub use listing_repository::*;
