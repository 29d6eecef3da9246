use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::{
    repositories::reservations::ReservationRepository,
    value_objects::booking_interval::BookingInterval,
};

/// Read-only conflict probe. Advisory only: the authoritative overlap check
/// happens again inside the creation transaction, so a stale answer here can
/// never produce a double booking.
pub struct AvailabilityUseCase<R>
where
    R: ReservationRepository + Send + Sync,
{
    reservation_repository: Arc<R>,
}

impl<R> AvailabilityUseCase<R>
where
    R: ReservationRepository + Send + Sync,
{
    pub fn new(reservation_repository: Arc<R>) -> Self {
        Self {
            reservation_repository,
        }
    }

    pub async fn is_available(
        &self,
        resource_ref: &str,
        requested: BookingInterval,
    ) -> Result<bool> {
        let occupants = self
            .reservation_repository
            .list_active_on_resource(resource_ref.to_string())
            .await?;

        let conflict = occupants.iter().any(|existing| {
            BookingInterval::new(existing.starts_at, existing.ends_at)
                .map(|interval| interval.overlaps(&requested))
                .unwrap_or(false)
        });

        info!(
            resource_ref,
            occupants = occupants.len(),
            conflict,
            "availability: checked resource"
        );

        Ok(!conflict)
    }
}
