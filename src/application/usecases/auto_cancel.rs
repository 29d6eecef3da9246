use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{info, warn};

use crate::domain::{
    entities::reservations::ReservationEntity,
    repositories::{
        notification::NotificationSink,
        reservations::{ReservationRepository, TransitionOutcome},
    },
    value_objects::{booking_interval::end_of_local_day, enums::actor_types::Actor},
};

const AUTO_CANCEL_REASON: &str = "unpaid by deadline";

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCancelRunResult {
    pub checked: usize,
    pub cancelled: usize,
}

/// Sweeps unpaid reservations past their payment deadline into `cancelled`.
/// Driven by an external scheduler hitting the internal jobs endpoint.
pub struct AutoCancelUseCase<R, N>
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    reservation_repository: Arc<R>,
    notification_sink: Arc<N>,
    reference_timezone: FixedOffset,
    batch_size: i64,
}

impl<R, N> AutoCancelUseCase<R, N>
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
{
    pub fn new(
        reservation_repository: Arc<R>,
        notification_sink: Arc<N>,
        reference_timezone: FixedOffset,
        batch_size: i64,
    ) -> Self {
        Self {
            reservation_repository,
            notification_sink,
            reference_timezone,
            batch_size,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<AutoCancelRunResult> {
        let candidates = self
            .reservation_repository
            .list_awaiting_payment(self.batch_size)
            .await?;

        let mut result = AutoCancelRunResult {
            checked: candidates.len(),
            cancelled: 0,
        };

        for reservation in candidates {
            if now <= self.effective_deadline(&reservation) {
                continue;
            }

            match self
                .reservation_repository
                .record_cancellation(
                    reservation.id,
                    AUTO_CANCEL_REASON.to_string(),
                    Actor::system(),
                )
                .await?
            {
                TransitionOutcome::Applied(cancelled) => {
                    result.cancelled += 1;
                    info!(
                        reservation_id = %cancelled.id,
                        "auto-cancel: reservation cancelled for missed payment deadline"
                    );
                    self.notify_cancelled(&cancelled).await;
                }
                // Raced with a payment confirmation or a manual cancel;
                // either way the row no longer needs us.
                TransitionOutcome::NotFound | TransitionOutcome::InvalidState(_) => {}
            }
        }

        info!(
            checked = result.checked,
            cancelled = result.cancelled,
            "auto-cancel: sweep completed"
        );
        Ok(result)
    }

    fn effective_deadline(&self, reservation: &ReservationEntity) -> DateTime<Utc> {
        reservation
            .payment_due_at
            .unwrap_or_else(|| end_of_local_day(reservation.created_at, self.reference_timezone))
    }

    async fn notify_cancelled(&self, reservation: &ReservationEntity) {
        let Some(customer_id) = reservation.customer_id.clone() else {
            return;
        };

        let payload = serde_json::json!({
            "reservation_id": reservation.id,
            "reason": AUTO_CANCEL_REASON,
        });
        if let Err(err) = self
            .notification_sink
            .notify(customer_id, "reservation_cancelled".to_string(), payload)
            .await
        {
            warn!(
                reservation_id = %reservation.id,
                error = ?err,
                "auto-cancel: cancellation notification failed; continuing"
            );
        }
    }
}
