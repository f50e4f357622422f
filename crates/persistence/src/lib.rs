//! Persistence layer for the Eventra backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the row-locking helpers the
//!   admission and reconciliation transactions are built on

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
