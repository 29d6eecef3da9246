use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    entities::reservations::{InsertReservationEntity, ReservationEntity},
    value_objects::enums::{actor_types::Actor, reservation_statuses::ReservationStatus},
};

/// Whether reservation creation must hold the resource/interval exclusively.
/// `AllowOverlap` is the deliberate admin double-booking escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusivityMode {
    Enforce,
    AllowOverlap,
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(ReservationEntity),
    SlotTaken,
}

#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(ReservationEntity),
    NotFound,
    InvalidState(ReservationStatus),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepository {
    /// Insert a reservation. Under `Enforce` the write happens in the same
    /// transaction as an overlap check against same-resource active rows, so
    /// two concurrent bookers cannot both succeed.
    async fn create(
        &self,
        insert_reservation: InsertReservationEntity,
        exclusivity: ExclusivityMode,
    ) -> Result<CreateOutcome>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReservationEntity>>;

    /// All reservations in the active status set holding the given resource.
    async fn list_active_on_resource(
        &self,
        resource_ref: String,
    ) -> Result<Vec<ReservationEntity>>;

    /// Compare-and-set status change: applies `to` only when the current
    /// status is in `allowed_from`, atomically.
    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: Vec<ReservationStatus>,
        to: ReservationStatus,
    ) -> Result<TransitionOutcome>;

    /// pending or awaiting_confirmation -> confirmed with payment_status = paid.
    async fn confirm_payment(&self, id: Uuid) -> Result<TransitionOutcome>;

    /// Rejected slip: payment_status back to unpaid, status untouched.
    async fn reset_payment(&self, id: Uuid) -> Result<TransitionOutcome>;

    /// Any non-terminal status -> cancelled, stamping the cancellation audit
    /// fields in the same write.
    async fn record_cancellation(
        &self,
        id: Uuid,
        reason: String,
        by: Actor,
    ) -> Result<TransitionOutcome>;

    /// Candidates for the auto-cancel sweep: status in
    /// {pending, awaiting_confirmation} and payment_status != paid.
    async fn list_awaiting_payment(&self, limit: i64) -> Result<Vec<ReservationEntity>>;
}
