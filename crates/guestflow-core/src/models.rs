//! Domain models for GuestFlow.
//!
//! These are the core types shared across all crates.

pub mod booking;
pub mod guest;
pub mod staff;
pub mod table;
pub mod tenant;
