use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, PgConnection, RunQueryDsl, delete, insert_into, prelude::*, update};
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            coupons::{CouponEntity, InsertCouponEntity},
            customers::{CustomerEntity, InsertCustomerEntity},
            rewards::RewardEntity,
        },
        repositories::loyalty::{
            LoyaltyRepository, MergeIdentityEntity, MergeOutcome, RedeemOutcome, ReviewOutcome,
            UseCouponOutcome,
        },
        value_objects::enums::reservation_statuses::ReservationStatus,
    },
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, transaction_with_retry},
        schema::{coupons, customers, reservations, rewards},
    },
};

pub struct LoyaltyPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LoyaltyPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LoyaltyRepository for LoyaltyPostgres {
    async fn merge_identity(&self, merge: MergeIdentityEntity) -> Result<MergeOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<MergeOutcome> {
            let mut conn = db_pool.get()?;

            // Two row locks taken in data-dependent order can deadlock with a
            // concurrent merge; the retry wrapper absorbs the aborted loser.
            // The unique constraint on customers.phone closes the remaining
            // gap: two first-time merges of the same phone each see no
            // committed phone row, so the loser hits the constraint and
            // re-runs against the winner's row, resolving to fold or refusal.
            let mut phone_conflicts = 0;
            loop {
                let outcome = transaction_with_retry(&mut conn, |conn| {
                    let now = Utc::now();

                    // Chat-keyed rows use the chat user id as primary key.
                    let chat_record = lock_customer(conn, &merge.chat_user_id)?;

                    // A legacy row holds the phone but no chat identity yet.
                    let phone_record = customers::table
                        .select(CustomerEntity::as_select())
                        .filter(customers::phone.eq(&merge.phone))
                        .filter(customers::id.ne(&merge.chat_user_id))
                        .for_update()
                        .first::<CustomerEntity>(conn)
                        .optional()?;

                    if let Some(ref other) = phone_record {
                        if let Some(ref linked) = other.chat_user_id {
                            return Ok(MergeOutcome::Refused {
                                linked_chat_user_id: linked.clone(),
                            });
                        }
                    }

                    let mut points_transferred = 0;
                    if let Some(legacy) = phone_record {
                        points_transferred = legacy.points;
                        delete(customers::table.filter(customers::id.eq(&legacy.id)))
                            .execute(conn)?;
                    }

                    match chat_record {
                        Some(existing) => {
                            update(customers::table.filter(customers::id.eq(&existing.id)))
                                .set((
                                    customers::chat_user_id.eq(Some(&merge.chat_user_id)),
                                    customers::phone.eq(Some(&merge.phone)),
                                    customers::full_name.eq(merge
                                        .full_name
                                        .as_ref()
                                        .or(existing.full_name.as_ref())),
                                    customers::picture_url.eq(merge
                                        .picture_url
                                        .as_ref()
                                        .or(existing.picture_url.as_ref())),
                                    customers::points.eq(existing.points + points_transferred),
                                    customers::updated_at.eq(now),
                                ))
                                .execute(conn)?;
                        }
                        None => {
                            let insert_customer = InsertCustomerEntity {
                                id: merge.chat_user_id.clone(),
                                chat_user_id: Some(merge.chat_user_id.clone()),
                                phone: Some(merge.phone.clone()),
                                full_name: merge.full_name.clone(),
                                picture_url: merge.picture_url.clone(),
                                points: points_transferred,
                            };
                            insert_into(customers::table)
                                .values(&insert_customer)
                                .execute(conn)?;
                        }
                    }

                    Ok(MergeOutcome::Merged {
                        customer_id: merge.chat_user_id.clone(),
                        points_transferred,
                    })
                });

                match outcome {
                    Err(err) if phone_conflicts < 2 && is_phone_conflict(&err) => {
                        phone_conflicts += 1;
                    }
                    outcome => return outcome,
                }
            }
        })
        .await??)
    }

    async fn redeem(&self, customer_id: String, reward_id: Uuid) -> Result<RedeemOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<RedeemOutcome> {
            let mut conn = db_pool.get()?;

            transaction_with_retry(&mut conn, |conn| {
                // The row lock serializes concurrent redemptions on one
                // balance; the second caller re-reads the debited value.
                let Some(customer) = lock_customer(conn, &customer_id)? else {
                    return Ok(RedeemOutcome::CustomerNotFound);
                };

                let reward = rewards::table
                    .select(RewardEntity::as_select())
                    .filter(rewards::id.eq(reward_id))
                    .filter(rewards::is_active.eq(true))
                    .first::<RewardEntity>(conn)
                    .optional()?;
                let Some(reward) = reward else {
                    return Ok(RedeemOutcome::RewardNotFound);
                };

                let required = i64::from(reward.points_required);
                if customer.points < required {
                    return Ok(RedeemOutcome::InsufficientPoints {
                        balance: customer.points,
                        required,
                    });
                }

                let now = Utc::now();
                let balance = customer.points - required;
                update(customers::table.filter(customers::id.eq(&customer.id)))
                    .set((
                        customers::points.eq(balance),
                        customers::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                let insert_coupon = InsertCouponEntity {
                    id: Uuid::new_v4(),
                    customer_id: customer.id.clone(),
                    reward_id: reward.id,
                    discount_type: reward.discount_type.clone(),
                    discount_value: reward.discount_value,
                    redeemed_at: now,
                    used: false,
                };
                let coupon_id = insert_into(coupons::table)
                    .values(&insert_coupon)
                    .returning(coupons::id)
                    .get_result::<Uuid>(conn)?;

                update(rewards::table.filter(rewards::id.eq(reward.id)))
                    .set((
                        rewards::redeemed_count.eq(reward.redeemed_count + 1),
                        rewards::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                Ok(RedeemOutcome::Redeemed { coupon_id, balance })
            })
        })
        .await??)
    }

    async fn award_review_points(
        &self,
        reservation_id: Uuid,
        customer_id: String,
        rating: i32,
        comment: Option<String>,
        bonus: i64,
    ) -> Result<ReviewOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ReviewOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<ReviewOutcome, anyhow::Error, _>(|conn| {
                let reservation = reservations::table
                    .select((
                        reservations::customer_id,
                        reservations::status,
                        reservations::review_submitted,
                    ))
                    .filter(reservations::id.eq(reservation_id))
                    .for_update()
                    .first::<(Option<String>, String, bool)>(conn)
                    .optional()?;
                let Some((owner, status, review_submitted)) = reservation else {
                    return Ok(ReviewOutcome::ReservationNotFound);
                };

                if owner.as_deref() != Some(customer_id.as_str()) {
                    return Ok(ReviewOutcome::NotOwner);
                }
                if status != ReservationStatus::Completed.to_string() {
                    return Ok(ReviewOutcome::NotCompleted);
                }
                if review_submitted {
                    return Ok(ReviewOutcome::AlreadySubmitted);
                }

                let now = Utc::now();
                update(reservations::table.filter(reservations::id.eq(reservation_id)))
                    .set((
                        reservations::review_submitted.eq(true),
                        reservations::review_rating.eq(Some(rating)),
                        reservations::review_comment.eq(comment),
                        reservations::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                let credited = update(customers::table.filter(customers::id.eq(&customer_id)))
                    .set((
                        customers::points.eq(customers::points + bonus),
                        customers::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                // A guest who booked before ever opening the loyalty side has
                // no customer row yet; the bonus opens one.
                if credited == 0 {
                    let insert_customer = InsertCustomerEntity {
                        id: customer_id.clone(),
                        chat_user_id: Some(customer_id.clone()),
                        phone: None,
                        full_name: None,
                        picture_url: None,
                        points: bonus,
                    };
                    insert_into(customers::table)
                        .values(&insert_customer)
                        .execute(conn)?;
                }

                Ok(ReviewOutcome::Awarded { bonus })
            })
        })
        .await??)
    }

    async fn find_profile(
        &self,
        customer_id: String,
    ) -> Result<Option<(CustomerEntity, Vec<CouponEntity>)>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(
            move || -> Result<Option<(CustomerEntity, Vec<CouponEntity>)>> {
                let mut conn = db_pool.get()?;

                let customer = customers::table
                    .select(CustomerEntity::as_select())
                    .filter(customers::id.eq(&customer_id))
                    .first::<CustomerEntity>(&mut conn)
                    .optional()?;
                let Some(customer) = customer else {
                    return Ok(None);
                };

                let owned_coupons = coupons::table
                    .select(CouponEntity::as_select())
                    .filter(coupons::customer_id.eq(&customer.id))
                    .order(coupons::redeemed_at.desc())
                    .load::<CouponEntity>(&mut conn)?;

                Ok(Some((customer, owned_coupons)))
            },
        )
        .await??)
    }

    async fn use_coupon(&self, coupon_id: Uuid) -> Result<UseCouponOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<UseCouponOutcome> {
            let mut conn = db_pool.get()?;

            conn.transaction::<UseCouponOutcome, anyhow::Error, _>(|conn| {
                let coupon = coupons::table
                    .select(CouponEntity::as_select())
                    .filter(coupons::id.eq(coupon_id))
                    .for_update()
                    .first::<CouponEntity>(conn)
                    .optional()?;
                let Some(coupon) = coupon else {
                    return Ok(UseCouponOutcome::NotFound);
                };
                if coupon.used {
                    return Ok(UseCouponOutcome::AlreadyUsed);
                }

                update(coupons::table.filter(coupons::id.eq(coupon_id)))
                    .set((
                        coupons::used.eq(true),
                        coupons::used_at.eq(Some(Utc::now())),
                    ))
                    .execute(conn)?;

                Ok(UseCouponOutcome::Used)
            })
        })
        .await??)
    }
}

fn lock_customer(
    conn: &mut PgConnection,
    customer_id: &str,
) -> Result<Option<CustomerEntity>, diesel::result::Error> {
    customers::table
        .select(CustomerEntity::as_select())
        .filter(customers::id.eq(customer_id))
        .for_update()
        .first::<CustomerEntity>(conn)
        .optional()
}

fn is_phone_conflict(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<diesel::result::Error>(),
        Some(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _
        ))
    )
}
