//! HTTP route handlers.

pub mod events;
pub mod health;
pub mod payment_webhooks;
pub mod promo_codes;
pub mod reconciliation_alerts;
pub mod registrations;
