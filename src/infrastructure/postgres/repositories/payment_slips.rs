use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, delete, insert_into, prelude::*, update};
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payment_slips::{InsertPaymentSlipEntity, PaymentSlipEntity},
        repositories::payment_slips::{
            CleanupCounts, PaymentSlipRepository, SlipRef, SubmitSlipOutcome,
        },
        value_objects::enums::{
            payment_statuses::PaymentStatus, reservation_statuses::ReservationStatus,
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{payment_slips, reservations},
    },
};

pub struct PaymentSlipPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentSlipPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentSlipRepository for PaymentSlipPostgres {
    async fn submit(
        &self,
        insert_slip: InsertPaymentSlipEntity,
        submitted_by: String,
    ) -> Result<SubmitSlipOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<SubmitSlipOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<SubmitSlipOutcome, anyhow::Error, _>(|conn| {
                let reservation = reservations::table
                    .select((
                        reservations::customer_id,
                        reservations::status,
                        reservations::payment_status,
                    ))
                    .filter(reservations::id.eq(insert_slip.reservation_id))
                    .for_update()
                    .first::<(Option<String>, String, String)>(conn)
                    .optional()?;
                let Some((owner, status, payment_status)) = reservation else {
                    return Ok(SubmitSlipOutcome::ReservationNotFound);
                };

                if let Some(ref owner_id) = owner {
                    if owner_id != &submitted_by {
                        return Ok(SubmitSlipOutcome::NotOwner);
                    }
                }

                let current_status = ReservationStatus::from_str(&status).ok_or_else(|| {
                    anyhow::anyhow!("unknown reservation status in database: {}", status)
                })?;
                let payable = matches!(
                    current_status,
                    ReservationStatus::Pending | ReservationStatus::AwaitingConfirmation
                ) && payment_status != PaymentStatus::Paid.to_string();
                if !payable {
                    return Ok(SubmitSlipOutcome::NotPayable(current_status));
                }

                let slip_id = insert_into(payment_slips::table)
                    .values(&insert_slip)
                    .returning(payment_slips::id)
                    .get_result::<Uuid>(conn)?;

                update(
                    reservations::table.filter(reservations::id.eq(insert_slip.reservation_id)),
                )
                .set((
                    reservations::latest_slip_id.eq(Some(slip_id)),
                    reservations::payment_status
                        .eq(PaymentStatus::PendingVerification.to_string()),
                    // First submission on an ownerless reservation claims it.
                    reservations::customer_id.eq(owner.or(Some(submitted_by))),
                    reservations::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

                Ok(SubmitSlipOutcome::Submitted { slip_id })
            })
        })
        .await??)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentSlipEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(
            task::spawn_blocking(move || -> Result<Option<PaymentSlipEntity>> {
                let mut conn = db_pool.get()?;

                let result = payment_slips::table
                    .select(PaymentSlipEntity::as_select())
                    .filter(payment_slips::id.eq(id))
                    .first::<PaymentSlipEntity>(&mut conn)
                    .optional()?;

                Ok(result)
            })
            .await??,
        )
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentSlipEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(
            task::spawn_blocking(move || -> Result<Vec<PaymentSlipEntity>> {
                let mut conn = db_pool.get()?;

                let results = payment_slips::table
                    .select(PaymentSlipEntity::as_select())
                    .filter(payment_slips::expires_at.le(now))
                    .order(payment_slips::expires_at.asc())
                    .limit(limit)
                    .load::<PaymentSlipEntity>(&mut conn)?;

                Ok(results)
            })
            .await??,
        )
    }

    async fn delete_and_clear(
        &self,
        slips: Vec<SlipRef>,
        chunk_size: usize,
    ) -> Result<CleanupCounts> {
        let db_pool = Arc::clone(&self.db_pool);
        let chunk_size = chunk_size.max(1);

        Ok(task::spawn_blocking(move || -> Result<CleanupCounts> {
            let mut conn = db_pool.get()?;
            let mut counts = CleanupCounts::default();

            // Each chunk commits on its own so a crashed run resumes where
            // it stopped instead of rolling everything back.
            for chunk in slips.chunks(chunk_size) {
                let slip_ids: Vec<Uuid> = chunk.iter().map(|r| r.slip_id).collect();
                let reservation_ids: Vec<Uuid> =
                    chunk.iter().map(|r| r.reservation_id).collect();

                let chunk_counts =
                    conn.transaction::<CleanupCounts, anyhow::Error, _>(|conn| {
                        let deleted = delete(
                            payment_slips::table.filter(payment_slips::id.eq_any(&slip_ids)),
                        )
                        .execute(conn)?;

                        // Only detach pointers that still reference a deleted
                        // slip; a newer slip stays linked.
                        let reservations_cleared = update(
                            reservations::table
                                .filter(reservations::id.eq_any(&reservation_ids))
                                .filter(reservations::latest_slip_id.eq_any(
                                    slip_ids.iter().map(|id| Some(*id)).collect::<Vec<_>>(),
                                )),
                        )
                        .set((
                            reservations::latest_slip_id.eq(None::<Uuid>),
                            reservations::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;

                        Ok(CleanupCounts {
                            deleted,
                            reservations_cleared,
                        })
                    })?;

                counts.deleted += chunk_counts.deleted;
                counts.reservations_cleared += chunk_counts.reservations_cleared;
            }

            Ok(counts)
        })
        .await??)
    }
}
