//! Shared utilities and common types for the Eventra backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Money arithmetic in currency minor units
//! - Offset/limit pagination helpers
//! - Common validation logic

pub mod money;
pub mod pagination;
pub mod validation;
