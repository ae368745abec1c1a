//! GuestFlow Core: domain models, error taxonomy, repository traits
//! and the booking lifecycle shared by every other crate.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
