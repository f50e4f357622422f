//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::registration::{PaymentStatus, Registration, RegistrationStatus};

/// Database enum for registration_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
pub enum RegistrationStatusDb {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Pending => RegistrationStatus::Pending,
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Waitlisted => RegistrationStatus::Waitlisted,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Pending => RegistrationStatusDb::Pending,
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Waitlisted => RegistrationStatusDb::Waitlisted,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
        }
    }
}

/// Database enum for payment_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatusDb {
    NotRequired,
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(db: PaymentStatusDb) -> Self {
        match db {
            PaymentStatusDb::NotRequired => PaymentStatus::NotRequired,
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Paid => PaymentStatus::Paid,
            PaymentStatusDb::Failed => PaymentStatus::Failed,
            PaymentStatusDb::Refunded => PaymentStatus::Refunded,
        }
    }
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::NotRequired => PaymentStatusDb::NotRequired,
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::Paid => PaymentStatusDb::Paid,
            PaymentStatus::Failed => PaymentStatusDb::Failed,
            PaymentStatus::Refunded => PaymentStatusDb::Refunded,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: RegistrationStatusDb,
    pub payment_status: PaymentStatusDb,
    pub waitlist_position: Option<i32>,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub payment_intent_id: Option<String>,
    pub promo_code_usage_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(e: RegistrationEntity) -> Self {
        Registration {
            id: e.id,
            event_id: e.event_id,
            email: e.email,
            first_name: e.first_name,
            last_name: e.last_name,
            status: e.status.into(),
            payment_status: e.payment_status.into(),
            waitlist_position: e.waitlist_position,
            total_amount: e.total_amount,
            amount_paid: e.amount_paid,
            payment_intent_id: e.payment_intent_id,
            promo_code_usage_id: e.promo_code_usage_id,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}
