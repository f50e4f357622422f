//! Domain layer for the Eventra backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, PromoCode)
//! - Pure business logic: promo-code validation, admission policy,
//!   payment reconciliation dispositions
//! - Trait seams for external collaborators (payment gateway, meeting
//!   integration)

pub mod models;
pub mod services;
