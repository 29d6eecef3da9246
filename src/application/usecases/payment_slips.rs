use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::payment_slips::InsertPaymentSlipEntity,
    repositories::{
        notification::NotificationSink,
        payment_slips::{PaymentSlipRepository, SlipRef, SubmitSlipOutcome},
        reservations::{ReservationRepository, TransitionOutcome},
    },
    value_objects::{
        enums::reservation_statuses::ReservationStatus,
        payment_slips::{ALLOWED_SLIP_MIME_TYPES, MAX_SLIP_BYTES, SubmitSlipModel},
    },
};

#[derive(Debug, Error)]
pub enum SlipError {
    #[error("invalid payment evidence: {0}")]
    InvalidEvidence(String),
    #[error("not allowed")]
    Unauthorized,
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("payment slip not found")]
    SlipNotFound,
    #[error("reservation is not payable in status {0}")]
    NotPayable(ReservationStatus),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SlipError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SlipError::InvalidEvidence(_) => StatusCode::BAD_REQUEST,
            SlipError::Unauthorized => StatusCode::FORBIDDEN,
            SlipError::ReservationNotFound | SlipError::SlipNotFound => StatusCode::NOT_FOUND,
            SlipError::NotPayable(_) => StatusCode::CONFLICT,
            SlipError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type SlipResult<T> = std::result::Result<T, SlipError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupRunResult {
    pub checked: usize,
    pub deleted: usize,
}

pub struct PaymentSlipUseCase<S, R, N>
where
    S: PaymentSlipRepository + Send + Sync,
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    slip_repository: Arc<S>,
    reservation_repository: Arc<R>,
    notification_sink: Arc<N>,
    retention_days: i64,
    cleanup_batch_size: usize,
}

impl<S, R, N> PaymentSlipUseCase<S, R, N>
where
    S: PaymentSlipRepository + Send + Sync,
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    pub fn new(
        slip_repository: Arc<S>,
        reservation_repository: Arc<R>,
        notification_sink: Arc<N>,
        retention_days: i64,
        cleanup_batch_size: usize,
    ) -> Self {
        Self {
            slip_repository,
            reservation_repository,
            notification_sink,
            retention_days,
            cleanup_batch_size,
        }
    }

    pub async fn submit(
        &self,
        reservation_id: Uuid,
        customer_id: &str,
        model: SubmitSlipModel,
    ) -> SlipResult<Uuid> {
        if !ALLOWED_SLIP_MIME_TYPES.contains(&model.mime_type.as_str()) {
            return Err(SlipError::InvalidEvidence(format!(
                "unsupported mime type {}",
                model.mime_type
            )));
        }

        let payload = BASE64
            .decode(model.evidence_base64.as_bytes())
            .map_err(|_| SlipError::InvalidEvidence("payload is not valid base64".to_string()))?;
        if payload.is_empty() {
            return Err(SlipError::InvalidEvidence("payload is empty".to_string()));
        }
        if payload.len() > MAX_SLIP_BYTES {
            return Err(SlipError::InvalidEvidence(format!(
                "payload exceeds {} bytes",
                MAX_SLIP_BYTES
            )));
        }

        let insert_slip = InsertPaymentSlipEntity {
            id: Uuid::new_v4(),
            reservation_id,
            customer_id: Some(customer_id.to_string()),
            size_bytes: payload.len() as i64,
            payload,
            mime_type: model.mime_type,
            note: model.note,
            status: "submitted".to_string(),
            expires_at: Utc::now() + Duration::days(self.retention_days),
        };

        match self
            .slip_repository
            .submit(insert_slip, customer_id.to_string())
            .await?
        {
            SubmitSlipOutcome::Submitted { slip_id } => {
                info!(
                    %reservation_id,
                    %slip_id,
                    customer_id,
                    "slips: evidence submitted, awaiting verification"
                );
                Ok(slip_id)
            }
            SubmitSlipOutcome::ReservationNotFound => Err(SlipError::ReservationNotFound),
            SubmitSlipOutcome::NotOwner => {
                warn!(
                    %reservation_id,
                    customer_id,
                    "slips: submission refused, caller does not own reservation"
                );
                Err(SlipError::Unauthorized)
            }
            SubmitSlipOutcome::NotPayable(status) => Err(SlipError::NotPayable(status)),
        }
    }

    /// Admin decision on a submitted slip: approval is the "payment verified"
    /// transition, rejection sends the reservation back to unpaid.
    pub async fn verify(&self, slip_id: Uuid, approve: bool) -> SlipResult<()> {
        let slip = self
            .slip_repository
            .find_by_id(slip_id)
            .await?
            .ok_or(SlipError::SlipNotFound)?;

        let outcome = if approve {
            self.reservation_repository
                .confirm_payment(slip.reservation_id)
                .await?
        } else {
            self.reservation_repository
                .reset_payment(slip.reservation_id)
                .await?
        };

        let reservation = match outcome {
            TransitionOutcome::Applied(entity) => entity,
            TransitionOutcome::NotFound => return Err(SlipError::ReservationNotFound),
            TransitionOutcome::InvalidState(status) => return Err(SlipError::NotPayable(status)),
        };

        info!(
            %slip_id,
            reservation_id = %reservation.id,
            approve,
            "slips: verification recorded"
        );

        if let Some(customer_id) = reservation.customer_id.clone() {
            let event_type = if approve {
                "payment_confirmed"
            } else {
                "payment_slip_rejected"
            };
            let payload = serde_json::json!({ "reservation_id": reservation.id });
            if let Err(err) = self
                .notification_sink
                .notify(customer_id, event_type.to_string(), payload)
                .await
            {
                warn!(
                    %slip_id,
                    error = ?err,
                    "slips: verification notification failed; continuing"
                );
            }
        }

        Ok(())
    }

    /// Delete slips whose retention window has lapsed and detach them from
    /// their reservations. Safe to re-run: the second pass finds nothing.
    pub async fn expire_and_cleanup(&self, now: DateTime<Utc>) -> anyhow::Result<CleanupRunResult> {
        let expired = self
            .slip_repository
            .list_expired(now, self.cleanup_batch_size as i64)
            .await?;

        let checked = expired.len();
        if expired.is_empty() {
            info!("slips: cleanup found nothing to delete");
            return Ok(CleanupRunResult::default());
        }

        let refs = expired
            .iter()
            .map(|slip| SlipRef {
                slip_id: slip.id,
                reservation_id: slip.reservation_id,
            })
            .collect::<Vec<_>>();

        let counts = self
            .slip_repository
            .delete_and_clear(refs, self.cleanup_batch_size)
            .await?;

        info!(
            checked,
            deleted = counts.deleted,
            reservations_cleared = counts.reservations_cleared,
            "slips: cleanup completed"
        );

        Ok(CleanupRunResult {
            checked,
            deleted: counts.deleted,
        })
    }
}
