use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::payment_slips::{InsertPaymentSlipEntity, PaymentSlipEntity},
    value_objects::enums::reservation_statuses::ReservationStatus,
};

#[derive(Debug, Clone)]
pub enum SubmitSlipOutcome {
    Submitted { slip_id: Uuid },
    ReservationNotFound,
    NotOwner,
    NotPayable(ReservationStatus),
}

#[derive(Debug, Clone, Copy)]
pub struct SlipRef {
    pub slip_id: Uuid,
    pub reservation_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupCounts {
    pub deleted: usize,
    pub reservations_cleared: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentSlipRepository {
    /// Insert the slip and flip the owning reservation's payment_status to
    /// pending_verification with `latest_slip_id` in one transaction. The
    /// first submission on an ownerless reservation claims it for
    /// `submitted_by`.
    async fn submit(
        &self,
        insert_slip: InsertPaymentSlipEntity,
        submitted_by: String,
    ) -> Result<SubmitSlipOutcome>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentSlipEntity>>;

    /// Slips whose retention window has lapsed, oldest first, bounded page.
    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentSlipEntity>>;

    /// Delete the given slips and clear `latest_slip_id` on their owning
    /// reservations in chunks of `chunk_size`; each chunk commits on its own
    /// so a crashed run resumes cleanly. Already-deleted slips and
    /// already-cleared reservations are no-ops.
    async fn delete_and_clear(
        &self,
        slips: Vec<SlipRef>,
        chunk_size: usize,
    ) -> Result<CleanupCounts>;
}
