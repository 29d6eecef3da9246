use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, RunQueryDsl, insert_into, prelude::*, update};
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::reservations::{InsertReservationEntity, ReservationEntity},
        repositories::reservations::{
            CreateOutcome, ExclusivityMode, ReservationRepository, TransitionOutcome,
        },
        value_objects::enums::{
            actor_types::Actor, payment_statuses::PaymentStatus,
            reservation_statuses::ReservationStatus,
        },
    },
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, transaction_with_retry},
        schema::reservations,
    },
};

fn active_statuses() -> Vec<String> {
    ReservationStatus::ACTIVE
        .iter()
        .map(|status| status.to_string())
        .collect()
}

fn overlaps(existing: &ReservationEntity, insert: &InsertReservationEntity) -> bool {
    existing.starts_at < insert.ends_at && insert.starts_at < existing.ends_at
}

pub struct ReservationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReservationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReservationRepository for ReservationPostgres {
    async fn create(
        &self,
        insert_reservation: InsertReservationEntity,
        exclusivity: ExclusivityMode,
    ) -> Result<CreateOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<CreateOutcome> {
            let mut conn = db_pool.get()?;

            transaction_with_retry(&mut conn, |conn| {
                // Lock every active row on the resource before deciding, so
                // two concurrent creates serialize on the same lock set and
                // the loser sees the winner's row.
                if exclusivity == ExclusivityMode::Enforce {
                    if let Some(resource_ref) = insert_reservation.resource_ref.as_deref() {
                        let occupants = reservations::table
                            .select(ReservationEntity::as_select())
                            .filter(reservations::resource_ref.eq(resource_ref))
                            .filter(reservations::status.eq_any(active_statuses()))
                            .for_update()
                            .load::<ReservationEntity>(conn)?;

                        if occupants
                            .iter()
                            .any(|existing| overlaps(existing, &insert_reservation))
                        {
                            return Ok(CreateOutcome::SlotTaken);
                        }
                    }
                }

                let created = insert_into(reservations::table)
                    .values(&insert_reservation)
                    .returning(ReservationEntity::as_returning())
                    .get_result::<ReservationEntity>(conn)?;

                Ok(CreateOutcome::Created(created))
            })
        })
        .await??)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReservationEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(
            task::spawn_blocking(move || -> Result<Option<ReservationEntity>> {
                let mut conn = db_pool.get()?;

                let result = reservations::table
                    .select(ReservationEntity::as_select())
                    .filter(reservations::id.eq(id))
                    .first::<ReservationEntity>(&mut conn)
                    .optional()?;

                Ok(result)
            })
            .await??,
        )
    }

    async fn list_active_on_resource(
        &self,
        resource_ref: String,
    ) -> Result<Vec<ReservationEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(
            task::spawn_blocking(move || -> Result<Vec<ReservationEntity>> {
                let mut conn = db_pool.get()?;

                let results = reservations::table
                    .select(ReservationEntity::as_select())
                    .filter(reservations::resource_ref.eq(resource_ref))
                    .filter(reservations::status.eq_any(active_statuses()))
                    .order(reservations::starts_at.asc())
                    .load::<ReservationEntity>(&mut conn)?;

                Ok(results)
            })
            .await??,
        )
    }

    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: Vec<ReservationStatus>,
        to: ReservationStatus,
    ) -> Result<TransitionOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<TransitionOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<TransitionOutcome, anyhow::Error, _>(|conn| {
                let Some(current) = lock_reservation(conn, id)? else {
                    return Ok(TransitionOutcome::NotFound);
                };

                let current_status = parse_status(&current.status)?;
                if !allowed_from.contains(&current_status) {
                    return Ok(TransitionOutcome::InvalidState(current_status));
                }

                let updated = update(reservations::table.filter(reservations::id.eq(id)))
                    .set((
                        reservations::status.eq(to.to_string()),
                        reservations::updated_at.eq(Utc::now()),
                    ))
                    .returning(ReservationEntity::as_returning())
                    .get_result::<ReservationEntity>(conn)?;

                Ok(TransitionOutcome::Applied(updated))
            })
        })
        .await??)
    }

    async fn confirm_payment(&self, id: Uuid) -> Result<TransitionOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<TransitionOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<TransitionOutcome, anyhow::Error, _>(|conn| {
                let Some(current) = lock_reservation(conn, id)? else {
                    return Ok(TransitionOutcome::NotFound);
                };

                let current_status = parse_status(&current.status)?;
                let payable = matches!(
                    current_status,
                    ReservationStatus::Pending | ReservationStatus::AwaitingConfirmation
                );
                if !payable {
                    return Ok(TransitionOutcome::InvalidState(current_status));
                }

                let updated = update(reservations::table.filter(reservations::id.eq(id)))
                    .set((
                        reservations::status.eq(ReservationStatus::Confirmed.to_string()),
                        reservations::payment_status.eq(PaymentStatus::Paid.to_string()),
                        reservations::updated_at.eq(Utc::now()),
                    ))
                    .returning(ReservationEntity::as_returning())
                    .get_result::<ReservationEntity>(conn)?;

                Ok(TransitionOutcome::Applied(updated))
            })
        })
        .await??)
    }

    async fn reset_payment(&self, id: Uuid) -> Result<TransitionOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<TransitionOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<TransitionOutcome, anyhow::Error, _>(|conn| {
                let Some(current) = lock_reservation(conn, id)? else {
                    return Ok(TransitionOutcome::NotFound);
                };

                let current_status = parse_status(&current.status)?;
                if current_status.is_terminal() {
                    return Ok(TransitionOutcome::InvalidState(current_status));
                }

                let updated = update(reservations::table.filter(reservations::id.eq(id)))
                    .set((
                        reservations::payment_status.eq(PaymentStatus::Unpaid.to_string()),
                        reservations::updated_at.eq(Utc::now()),
                    ))
                    .returning(ReservationEntity::as_returning())
                    .get_result::<ReservationEntity>(conn)?;

                Ok(TransitionOutcome::Applied(updated))
            })
        })
        .await??)
    }

    async fn record_cancellation(
        &self,
        id: Uuid,
        reason: String,
        by: Actor,
    ) -> Result<TransitionOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<TransitionOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<TransitionOutcome, anyhow::Error, _>(|conn| {
                let Some(current) = lock_reservation(conn, id)? else {
                    return Ok(TransitionOutcome::NotFound);
                };

                let current_status = parse_status(&current.status)?;
                if current_status.is_terminal() {
                    return Ok(TransitionOutcome::InvalidState(current_status));
                }

                let now = Utc::now();
                let updated = update(reservations::table.filter(reservations::id.eq(id)))
                    .set((
                        reservations::status.eq(ReservationStatus::Cancelled.to_string()),
                        reservations::cancelled_at.eq(Some(now)),
                        reservations::cancelled_reason.eq(Some(reason)),
                        reservations::cancelled_by_type.eq(Some(by.actor_type.to_string())),
                        reservations::cancelled_by_id.eq(by.id),
                        reservations::updated_at.eq(now),
                    ))
                    .returning(ReservationEntity::as_returning())
                    .get_result::<ReservationEntity>(conn)?;

                Ok(TransitionOutcome::Applied(updated))
            })
        })
        .await??)
    }

    async fn list_awaiting_payment(&self, limit: i64) -> Result<Vec<ReservationEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(
            task::spawn_blocking(move || -> Result<Vec<ReservationEntity>> {
                let mut conn = db_pool.get()?;

                let awaiting = vec![
                    ReservationStatus::Pending.to_string(),
                    ReservationStatus::AwaitingConfirmation.to_string(),
                ];

                let results = reservations::table
                    .select(ReservationEntity::as_select())
                    .filter(reservations::status.eq_any(awaiting))
                    .filter(reservations::payment_status.ne(PaymentStatus::Paid.to_string()))
                    .order(reservations::created_at.asc())
                    .limit(limit)
                    .load::<ReservationEntity>(&mut conn)?;

                Ok(results)
            })
            .await??,
        )
    }
}

fn lock_reservation(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ReservationEntity>, diesel::result::Error> {
    reservations::table
        .select(ReservationEntity::as_select())
        .filter(reservations::id.eq(id))
        .for_update()
        .first::<ReservationEntity>(conn)
        .optional()
}

fn parse_status(raw: &str) -> Result<ReservationStatus> {
    ReservationStatus::from_str(raw)
        .ok_or_else(|| anyhow::anyhow!("unknown reservation status in database: {}", raw))
}
