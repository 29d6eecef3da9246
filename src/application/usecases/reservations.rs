use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::reservations::{InsertReservationEntity, ReservationEntity},
    repositories::{
        notification::NotificationSink,
        reservations::{CreateOutcome, ExclusivityMode, ReservationRepository, TransitionOutcome},
    },
    value_objects::{
        booking_interval::{BookingInterval, end_of_local_day},
        enums::{
            actor_types::{Actor, ActorType},
            payment_statuses::PaymentStatus,
            reservation_statuses::ReservationStatus,
        },
        reservations::{BlockResourceModel, CancelReservationModel, CreateReservationModel},
    },
};

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("reservation not found")]
    NotFound,
    #[error("invalid state transition from {0}")]
    InvalidStateTransition(ReservationStatus),
    #[error("the requested slot is already taken")]
    SlotTaken,
    #[error("not allowed")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReservationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ReservationError::Validation(_) => StatusCode::BAD_REQUEST,
            ReservationError::NotFound => StatusCode::NOT_FOUND,
            ReservationError::InvalidStateTransition(_) => StatusCode::CONFLICT,
            ReservationError::SlotTaken => StatusCode::CONFLICT,
            ReservationError::Unauthorized => StatusCode::FORBIDDEN,
            ReservationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ReservationResult<T> = std::result::Result<T, ReservationError>;

pub struct ReservationUseCase<R, N>
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    reservation_repository: Arc<R>,
    notification_sink: Arc<N>,
    reference_timezone: chrono::FixedOffset,
}

impl<R, N> ReservationUseCase<R, N>
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    pub fn new(
        reservation_repository: Arc<R>,
        notification_sink: Arc<N>,
        reference_timezone: chrono::FixedOffset,
    ) -> Self {
        Self {
            reservation_repository,
            notification_sink,
            reference_timezone,
        }
    }

    pub async fn create(
        &self,
        model: CreateReservationModel,
        actor: Actor,
    ) -> ReservationResult<ReservationEntity> {
        if model.customer_name.trim().is_empty() {
            return Err(ReservationError::Validation(
                "customer_name must not be empty".to_string(),
            ));
        }
        let interval = BookingInterval::new(model.starts_at, model.ends_at).ok_or_else(|| {
            ReservationError::Validation("interval must satisfy starts_at < ends_at".to_string())
        })?;

        // Only an admin may double-book on purpose; the flag is ignored for
        // everyone else.
        let exclusivity = if model.allow_overlap && actor.actor_type == ActorType::Admin {
            ExclusivityMode::AllowOverlap
        } else {
            ExclusivityMode::Enforce
        };

        let now = Utc::now();
        let customer_id = match actor.actor_type {
            ActorType::Customer => actor.id.clone(),
            _ => None,
        };

        let insert_reservation = InsertReservationEntity {
            id: Uuid::new_v4(),
            kind: model.kind.to_string(),
            status: ReservationStatus::Pending.to_string(),
            resource_ref: model.resource_ref,
            starts_at: interval.starts_at,
            ends_at: interval.ends_at,
            customer_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            total_price: model.total_price,
            payment_status: PaymentStatus::Unpaid.to_string(),
            payment_due_at: Some(end_of_local_day(now, self.reference_timezone)),
            created_by_type: actor.actor_type.to_string(),
            created_by_id: actor.id,
        };

        match self
            .reservation_repository
            .create(insert_reservation, exclusivity)
            .await?
        {
            CreateOutcome::Created(entity) => {
                info!(
                    reservation_id = %entity.id,
                    kind = %entity.kind,
                    resource_ref = ?entity.resource_ref,
                    "reservations: created"
                );
                Ok(entity)
            }
            CreateOutcome::SlotTaken => {
                warn!("reservations: create rejected, slot taken");
                Err(ReservationError::SlotTaken)
            }
        }
    }

    pub async fn block(
        &self,
        model: BlockResourceModel,
        admin: Actor,
    ) -> ReservationResult<ReservationEntity> {
        let interval = BookingInterval::new(model.starts_at, model.ends_at).ok_or_else(|| {
            ReservationError::Validation("interval must satisfy starts_at < ends_at".to_string())
        })?;

        let insert_reservation = InsertReservationEntity {
            id: Uuid::new_v4(),
            kind: "room".to_string(),
            status: ReservationStatus::Blocked.to_string(),
            resource_ref: Some(model.resource_ref),
            starts_at: interval.starts_at,
            ends_at: interval.ends_at,
            customer_id: None,
            customer_name: "blocked".to_string(),
            customer_phone: None,
            total_price: None,
            payment_status: PaymentStatus::Unpaid.to_string(),
            payment_due_at: None,
            created_by_type: admin.actor_type.to_string(),
            created_by_id: admin.id,
        };

        match self
            .reservation_repository
            .create(insert_reservation, ExclusivityMode::Enforce)
            .await?
        {
            CreateOutcome::Created(entity) => {
                info!(
                    reservation_id = %entity.id,
                    resource_ref = ?entity.resource_ref,
                    "reservations: resource blocked"
                );
                Ok(entity)
            }
            CreateOutcome::SlotTaken => Err(ReservationError::SlotTaken),
        }
    }

    pub async fn get(&self, id: Uuid) -> ReservationResult<ReservationEntity> {
        self.reservation_repository
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound)
    }

    pub async fn confirm(&self, id: Uuid) -> ReservationResult<ReservationEntity> {
        self.transition(
            id,
            vec![ReservationStatus::Pending],
            ReservationStatus::AwaitingConfirmation,
        )
        .await
    }

    pub async fn begin_service(&self, id: Uuid) -> ReservationResult<ReservationEntity> {
        self.transition(
            id,
            vec![ReservationStatus::Confirmed],
            ReservationStatus::InProgress,
        )
        .await
    }

    pub async fn complete_service(&self, id: Uuid) -> ReservationResult<ReservationEntity> {
        self.transition(
            id,
            vec![ReservationStatus::InProgress],
            ReservationStatus::Completed,
        )
        .await
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        model: CancelReservationModel,
        actor: Actor,
    ) -> ReservationResult<ReservationEntity> {
        if actor.actor_type == ActorType::Customer {
            let current = self.get(id).await?;
            if current.customer_id != actor.id {
                warn!(
                    reservation_id = %id,
                    actor_id = ?actor.id,
                    "reservations: cancel refused, caller does not own reservation"
                );
                return Err(ReservationError::Unauthorized);
            }
        }

        let cancelled = match self
            .reservation_repository
            .record_cancellation(id, model.reason.clone(), actor)
            .await?
        {
            TransitionOutcome::Applied(entity) => entity,
            TransitionOutcome::NotFound => return Err(ReservationError::NotFound),
            TransitionOutcome::InvalidState(status) => {
                return Err(ReservationError::InvalidStateTransition(status));
            }
        };

        info!(
            reservation_id = %cancelled.id,
            reason = %model.reason,
            "reservations: cancelled"
        );
        self.notify_cancelled(&cancelled, &model.reason).await;

        Ok(cancelled)
    }

    async fn transition(
        &self,
        id: Uuid,
        allowed_from: Vec<ReservationStatus>,
        to: ReservationStatus,
    ) -> ReservationResult<ReservationEntity> {
        match self
            .reservation_repository
            .transition_status(id, allowed_from, to)
            .await?
        {
            TransitionOutcome::Applied(entity) => {
                info!(reservation_id = %entity.id, status = %to, "reservations: transitioned");
                Ok(entity)
            }
            TransitionOutcome::NotFound => Err(ReservationError::NotFound),
            TransitionOutcome::InvalidState(status) => {
                warn!(
                    reservation_id = %id,
                    current = %status,
                    attempted = %to,
                    "reservations: invalid transition"
                );
                Err(ReservationError::InvalidStateTransition(status))
            }
        }
    }

    async fn notify_cancelled(&self, reservation: &ReservationEntity, reason: &str) {
        let Some(customer_id) = reservation.customer_id.clone() else {
            return;
        };

        let payload = serde_json::json!({
            "reservation_id": reservation.id,
            "reason": reason,
        });
        if let Err(err) = self
            .notification_sink
            .notify(customer_id, "reservation_cancelled".to_string(), payload)
            .await
        {
            warn!(
                reservation_id = %reservation.id,
                error = ?err,
                "reservations: cancellation notification failed; continuing"
            );
        }
    }
}
