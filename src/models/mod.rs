// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod booking;
pub mod caller;
pub mod listing;

pub use booking::*;
pub use caller::*;
pub use listing::*;
