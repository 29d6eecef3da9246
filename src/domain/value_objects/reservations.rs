use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::reservations::ReservationEntity,
    value_objects::enums::{
        payment_statuses::PaymentStatus, reservation_kinds::ReservationKind,
        reservation_statuses::ReservationStatus,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservationModel {
    pub kind: ReservationKind,
    pub resource_ref: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub total_price: Option<i64>,
    /// Admin-only escape hatch for deliberate double-booking.
    #[serde(default)]
    pub allow_overlap: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockResourceModel {
    pub resource_ref: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelReservationModel {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationViewModel {
    pub id: Uuid,
    pub kind: ReservationKind,
    pub status: ReservationStatus,
    pub resource_ref: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub total_price: Option<i64>,
    pub payment_status: PaymentStatus,
    pub payment_due_at: Option<DateTime<Utc>>,
    pub latest_slip_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReservationEntity> for ReservationViewModel {
    fn from(entity: ReservationEntity) -> Self {
        // Unknown strings in these columns mean a corrupt or migrated-badly
        // row; render a conservative fallback but leave a trace of it.
        let kind = ReservationKind::from_str(&entity.kind).unwrap_or_else(|| {
            tracing::warn!(
                reservation_id = %entity.id,
                kind = %entity.kind,
                "unknown reservation kind in database row"
            );
            ReservationKind::Service
        });
        let status = ReservationStatus::from_str(&entity.status).unwrap_or_else(|| {
            tracing::warn!(
                reservation_id = %entity.id,
                status = %entity.status,
                "unknown reservation status in database row"
            );
            ReservationStatus::Pending
        });
        let payment_status =
            PaymentStatus::from_str(&entity.payment_status).unwrap_or_else(|| {
                tracing::warn!(
                    reservation_id = %entity.id,
                    payment_status = %entity.payment_status,
                    "unknown payment status in database row"
                );
                PaymentStatus::Unpaid
            });

        Self {
            id: entity.id,
            kind,
            status,
            resource_ref: entity.resource_ref,
            starts_at: entity.starts_at,
            ends_at: entity.ends_at,
            customer_id: entity.customer_id,
            customer_name: entity.customer_name,
            total_price: entity.total_price,
            payment_status,
            payment_due_at: entity.payment_due_at,
            latest_slip_id: entity.latest_slip_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityViewModel {
    pub resource_ref: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub available: bool,
}
