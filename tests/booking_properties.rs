use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use lotus_booking::application::usecases::{
    auto_cancel::AutoCancelUseCase,
    loyalty::{LoyaltyError, LoyaltyUseCase},
    payment_slips::PaymentSlipUseCase,
    reservations::{ReservationError, ReservationUseCase},
};
use lotus_booking::domain::{
    entities::{
        coupons::CouponEntity,
        customers::CustomerEntity,
        payment_slips::{InsertPaymentSlipEntity, PaymentSlipEntity},
        reservations::{InsertReservationEntity, ReservationEntity},
        rewards::RewardEntity,
    },
    repositories::{
        loyalty::{
            LoyaltyRepository, MergeIdentityEntity, MergeOutcome, RedeemOutcome, ReviewOutcome,
            UseCouponOutcome,
        },
        notification::NotificationSink,
        payment_slips::{CleanupCounts, PaymentSlipRepository, SlipRef, SubmitSlipOutcome},
        reservations::{
            CreateOutcome, ExclusivityMode, ReservationRepository, TransitionOutcome,
        },
    },
    value_objects::{
        enums::{
            actor_types::Actor,
            payment_statuses::PaymentStatus,
            reservation_kinds::ReservationKind,
            reservation_statuses::ReservationStatus,
        },
        loyalty::{MergeIdentityModel, SubmitReviewModel},
        reservations::{CancelReservationModel, CreateReservationModel},
        payment_slips::SubmitSlipModel,
    },
};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::FixedOffset;

// ---------------------------------------------------------------------------
// In-memory store implementing the repository traits with the same
// atomicity guarantees as the Postgres implementations: every operation
// runs to completion under one lock, so concurrent callers observe either
// all of a mutation or none of it.
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    reservations: HashMap<Uuid, ReservationEntity>,
    customers: HashMap<String, CustomerEntity>,
    rewards: HashMap<Uuid, RewardEntity>,
    coupons: HashMap<Uuid, CouponEntity>,
    slips: HashMap<Uuid, PaymentSlipEntity>,
}

#[derive(Default)]
struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn insert_customer(&self, customer: CustomerEntity) {
        self.state
            .lock()
            .unwrap()
            .customers
            .insert(customer.id.clone(), customer);
    }

    fn insert_reward(&self, reward: RewardEntity) {
        self.state.lock().unwrap().rewards.insert(reward.id, reward);
    }

    fn insert_reservation(&self, reservation: ReservationEntity) {
        self.state
            .lock()
            .unwrap()
            .reservations
            .insert(reservation.id, reservation);
    }

    fn reservation(&self, id: Uuid) -> Option<ReservationEntity> {
        self.state.lock().unwrap().reservations.get(&id).cloned()
    }

    fn customer(&self, id: &str) -> Option<CustomerEntity> {
        self.state.lock().unwrap().customers.get(id).cloned()
    }

    fn coupon_count(&self) -> usize {
        self.state.lock().unwrap().coupons.len()
    }

    fn reward(&self, id: Uuid) -> Option<RewardEntity> {
        self.state.lock().unwrap().rewards.get(&id).cloned()
    }

    fn slip_count(&self) -> usize {
        self.state.lock().unwrap().slips.len()
    }
}

fn materialize(insert: InsertReservationEntity, now: DateTime<Utc>) -> ReservationEntity {
    ReservationEntity {
        id: insert.id,
        kind: insert.kind,
        status: insert.status,
        resource_ref: insert.resource_ref,
        starts_at: insert.starts_at,
        ends_at: insert.ends_at,
        customer_id: insert.customer_id,
        customer_name: insert.customer_name,
        customer_phone: insert.customer_phone,
        total_price: insert.total_price,
        payment_status: insert.payment_status,
        payment_due_at: insert.payment_due_at,
        latest_slip_id: None,
        review_submitted: false,
        review_rating: None,
        review_comment: None,
        cancelled_at: None,
        cancelled_reason: None,
        cancelled_by_type: None,
        cancelled_by_id: None,
        created_by_type: insert.created_by_type,
        created_by_id: insert.created_by_id,
        created_at: now,
        updated_at: now,
    }
}

fn status_of(entity: &ReservationEntity) -> ReservationStatus {
    ReservationStatus::from_str(&entity.status).unwrap()
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn create(
        &self,
        insert_reservation: InsertReservationEntity,
        exclusivity: ExclusivityMode,
    ) -> Result<CreateOutcome> {
        let mut state = self.state.lock().unwrap();

        if exclusivity == ExclusivityMode::Enforce {
            if let Some(ref resource_ref) = insert_reservation.resource_ref {
                let conflict = state.reservations.values().any(|existing| {
                    existing.resource_ref.as_deref() == Some(resource_ref.as_str())
                        && status_of(existing).is_active()
                        && existing.starts_at < insert_reservation.ends_at
                        && insert_reservation.starts_at < existing.ends_at
                });
                if conflict {
                    return Ok(CreateOutcome::SlotTaken);
                }
            }
        }

        let entity = materialize(insert_reservation, Utc::now());
        state.reservations.insert(entity.id, entity.clone());
        Ok(CreateOutcome::Created(entity))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReservationEntity>> {
        Ok(self.reservation(id))
    }

    async fn list_active_on_resource(
        &self,
        resource_ref: String,
    ) -> Result<Vec<ReservationEntity>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reservations
            .values()
            .filter(|r| {
                r.resource_ref.as_deref() == Some(resource_ref.as_str())
                    && status_of(r).is_active()
            })
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: Vec<ReservationStatus>,
        to: ReservationStatus,
    ) -> Result<TransitionOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(entity) = state.reservations.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        let current = status_of(entity);
        if !allowed_from.contains(&current) {
            return Ok(TransitionOutcome::InvalidState(current));
        }

        entity.status = to.to_string();
        entity.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(entity.clone()))
    }

    async fn confirm_payment(&self, id: Uuid) -> Result<TransitionOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(entity) = state.reservations.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        let current = status_of(entity);
        if !matches!(
            current,
            ReservationStatus::Pending | ReservationStatus::AwaitingConfirmation
        ) {
            return Ok(TransitionOutcome::InvalidState(current));
        }

        entity.status = ReservationStatus::Confirmed.to_string();
        entity.payment_status = PaymentStatus::Paid.to_string();
        entity.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(entity.clone()))
    }

    async fn reset_payment(&self, id: Uuid) -> Result<TransitionOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(entity) = state.reservations.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        let current = status_of(entity);
        if current.is_terminal() {
            return Ok(TransitionOutcome::InvalidState(current));
        }

        entity.payment_status = PaymentStatus::Unpaid.to_string();
        entity.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(entity.clone()))
    }

    async fn record_cancellation(
        &self,
        id: Uuid,
        reason: String,
        by: Actor,
    ) -> Result<TransitionOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(entity) = state.reservations.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        let current = status_of(entity);
        if current.is_terminal() {
            return Ok(TransitionOutcome::InvalidState(current));
        }

        let now = Utc::now();
        entity.status = ReservationStatus::Cancelled.to_string();
        entity.cancelled_at = Some(now);
        entity.cancelled_reason = Some(reason);
        entity.cancelled_by_type = Some(by.actor_type.to_string());
        entity.cancelled_by_id = by.id;
        entity.updated_at = now;
        Ok(TransitionOutcome::Applied(entity.clone()))
    }

    async fn list_awaiting_payment(&self, limit: i64) -> Result<Vec<ReservationEntity>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reservations
            .values()
            .filter(|r| {
                matches!(
                    status_of(r),
                    ReservationStatus::Pending | ReservationStatus::AwaitingConfirmation
                ) && r.payment_status != PaymentStatus::Paid.to_string()
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LoyaltyRepository for InMemoryStore {
    async fn merge_identity(&self, merge: MergeIdentityEntity) -> Result<MergeOutcome> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        let legacy = state
            .customers
            .values()
            .find(|c| c.phone.as_deref() == Some(merge.phone.as_str()) && c.id != merge.chat_user_id)
            .cloned();

        if let Some(ref other) = legacy {
            if let Some(ref linked) = other.chat_user_id {
                return Ok(MergeOutcome::Refused {
                    linked_chat_user_id: linked.clone(),
                });
            }
        }

        let mut points_transferred = 0;
        if let Some(legacy) = legacy {
            points_transferred = legacy.points;
            state.customers.remove(&legacy.id);
        }

        let entry = state
            .customers
            .entry(merge.chat_user_id.clone())
            .or_insert_with(|| CustomerEntity {
                id: merge.chat_user_id.clone(),
                chat_user_id: Some(merge.chat_user_id.clone()),
                phone: None,
                full_name: None,
                picture_url: None,
                points: 0,
                created_at: now,
                updated_at: now,
            });
        entry.chat_user_id = Some(merge.chat_user_id.clone());
        entry.phone = Some(merge.phone.clone());
        if merge.full_name.is_some() {
            entry.full_name = merge.full_name.clone();
        }
        if merge.picture_url.is_some() {
            entry.picture_url = merge.picture_url.clone();
        }
        entry.points += points_transferred;
        entry.updated_at = now;

        Ok(MergeOutcome::Merged {
            customer_id: merge.chat_user_id,
            points_transferred,
        })
    }

    async fn redeem(&self, customer_id: String, reward_id: Uuid) -> Result<RedeemOutcome> {
        let mut state = self.state.lock().unwrap();

        let Some(customer) = state.customers.get(&customer_id).cloned() else {
            return Ok(RedeemOutcome::CustomerNotFound);
        };
        let Some(reward) = state
            .rewards
            .get(&reward_id)
            .filter(|r| r.is_active)
            .cloned()
        else {
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
        state.customers.get_mut(&customer_id).unwrap().points = balance;

        let coupon = CouponEntity {
            id: Uuid::new_v4(),
            customer_id,
            reward_id,
            discount_type: reward.discount_type.clone(),
            discount_value: reward.discount_value,
            redeemed_at: now,
            used: false,
            used_at: None,
        };
        let coupon_id = coupon.id;
        state.coupons.insert(coupon_id, coupon);
        state.rewards.get_mut(&reward_id).unwrap().redeemed_count += 1;

        Ok(RedeemOutcome::Redeemed { coupon_id, balance })
    }

    async fn award_review_points(
        &self,
        reservation_id: Uuid,
        customer_id: String,
        rating: i32,
        comment: Option<String>,
        bonus: i64,
    ) -> Result<ReviewOutcome> {
        let mut state = self.state.lock().unwrap();

        let Some(reservation) = state.reservations.get(&reservation_id).cloned() else {
            return Ok(ReviewOutcome::ReservationNotFound);
        };
        if reservation.customer_id.as_deref() != Some(customer_id.as_str()) {
            return Ok(ReviewOutcome::NotOwner);
        }
        if status_of(&reservation) != ReservationStatus::Completed {
            return Ok(ReviewOutcome::NotCompleted);
        }
        if reservation.review_submitted {
            return Ok(ReviewOutcome::AlreadySubmitted);
        }

        let now = Utc::now();
        {
            let entity = state.reservations.get_mut(&reservation_id).unwrap();
            entity.review_submitted = true;
            entity.review_rating = Some(rating);
            entity.review_comment = comment;
            entity.updated_at = now;
        }

        let entry = state
            .customers
            .entry(customer_id.clone())
            .or_insert_with(|| CustomerEntity {
                id: customer_id.clone(),
                chat_user_id: Some(customer_id.clone()),
                phone: None,
                full_name: None,
                picture_url: None,
                points: 0,
                created_at: now,
                updated_at: now,
            });
        entry.points += bonus;
        entry.updated_at = now;

        Ok(ReviewOutcome::Awarded { bonus })
    }

    async fn find_profile(
        &self,
        customer_id: String,
    ) -> Result<Option<(CustomerEntity, Vec<CouponEntity>)>> {
        let state = self.state.lock().unwrap();
        let Some(customer) = state.customers.get(&customer_id).cloned() else {
            return Ok(None);
        };
        let coupons = state
            .coupons
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(Some((customer, coupons)))
    }

    async fn use_coupon(&self, coupon_id: Uuid) -> Result<UseCouponOutcome> {
        let mut state = self.state.lock().unwrap();
        let Some(coupon) = state.coupons.get_mut(&coupon_id) else {
            return Ok(UseCouponOutcome::NotFound);
        };
        if coupon.used {
            return Ok(UseCouponOutcome::AlreadyUsed);
        }
        coupon.used = true;
        coupon.used_at = Some(Utc::now());
        Ok(UseCouponOutcome::Used)
    }
}

#[async_trait]
impl PaymentSlipRepository for InMemoryStore {
    async fn submit(
        &self,
        insert_slip: InsertPaymentSlipEntity,
        submitted_by: String,
    ) -> Result<SubmitSlipOutcome> {
        let mut state = self.state.lock().unwrap();

        let Some(reservation) = state.reservations.get(&insert_slip.reservation_id).cloned()
        else {
            return Ok(SubmitSlipOutcome::ReservationNotFound);
        };
        if let Some(ref owner) = reservation.customer_id {
            if owner != &submitted_by {
                return Ok(SubmitSlipOutcome::NotOwner);
            }
        }
        let current = status_of(&reservation);
        let payable = matches!(
            current,
            ReservationStatus::Pending | ReservationStatus::AwaitingConfirmation
        ) && reservation.payment_status != PaymentStatus::Paid.to_string();
        if !payable {
            return Ok(SubmitSlipOutcome::NotPayable(current));
        }

        let slip_id = insert_slip.id;
        let now = Utc::now();
        state.slips.insert(
            slip_id,
            PaymentSlipEntity {
                id: insert_slip.id,
                reservation_id: insert_slip.reservation_id,
                customer_id: insert_slip.customer_id,
                payload: insert_slip.payload,
                mime_type: insert_slip.mime_type,
                size_bytes: insert_slip.size_bytes,
                note: insert_slip.note,
                status: insert_slip.status,
                created_at: now,
                expires_at: insert_slip.expires_at,
            },
        );

        let entity = state.reservations.get_mut(&insert_slip.reservation_id).unwrap();
        entity.latest_slip_id = Some(slip_id);
        entity.payment_status = PaymentStatus::PendingVerification.to_string();
        if entity.customer_id.is_none() {
            entity.customer_id = Some(submitted_by);
        }
        entity.updated_at = now;

        Ok(SubmitSlipOutcome::Submitted { slip_id })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentSlipEntity>> {
        Ok(self.state.lock().unwrap().slips.get(&id).cloned())
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentSlipEntity>> {
        let state = self.state.lock().unwrap();
        let mut expired: Vec<PaymentSlipEntity> = state
            .slips
            .values()
            .filter(|s| s.expires_at <= now)
            .cloned()
            .collect();
        expired.sort_by_key(|s| s.expires_at);
        expired.truncate(limit as usize);
        Ok(expired)
    }

    async fn delete_and_clear(
        &self,
        slips: Vec<SlipRef>,
        _chunk_size: usize,
    ) -> Result<CleanupCounts> {
        let mut state = self.state.lock().unwrap();
        let mut counts = CleanupCounts::default();

        for slip_ref in slips {
            if state.slips.remove(&slip_ref.slip_id).is_some() {
                counts.deleted += 1;
            }
            if let Some(reservation) = state.reservations.get_mut(&slip_ref.reservation_id) {
                if reservation.latest_slip_id == Some(slip_ref.slip_id) {
                    reservation.latest_slip_id = None;
                    counts.reservations_cleared += 1;
                }
            }
        }

        Ok(counts)
    }
}

struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _: String, _: String, _: serde_json::Value) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn tz() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn customer(id: &str, points: i64) -> CustomerEntity {
    let now = Utc::now();
    CustomerEntity {
        id: id.to_string(),
        chat_user_id: Some(id.to_string()),
        phone: None,
        full_name: None,
        picture_url: None,
        points,
        created_at: now,
        updated_at: now,
    }
}

fn legacy_customer(id: &str, phone: &str, points: i64) -> CustomerEntity {
    let now = Utc::now();
    CustomerEntity {
        id: id.to_string(),
        chat_user_id: None,
        phone: Some(phone.to_string()),
        full_name: Some("Walk-in".to_string()),
        picture_url: None,
        points,
        created_at: now,
        updated_at: now,
    }
}

fn reward(points_required: i32) -> RewardEntity {
    let now = Utc::now();
    RewardEntity {
        id: Uuid::new_v4(),
        name: "spa voucher".to_string(),
        points_required,
        discount_type: "percentage".to_string(),
        discount_value: 10,
        redeemed_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn room_request(resource: &str, starts: DateTime<Utc>, ends: DateTime<Utc>) -> CreateReservationModel {
    CreateReservationModel {
        kind: ReservationKind::Room,
        resource_ref: Some(resource.to_string()),
        starts_at: starts,
        ends_at: ends,
        customer_name: "Anong".to_string(),
        customer_phone: None,
        total_price: Some(150_000),
        allow_overlap: false,
    }
}

fn stored_reservation(
    store: &InMemoryStore,
    resource: Option<&str>,
    status: ReservationStatus,
    payment_status: PaymentStatus,
    customer_id: Option<&str>,
    payment_due_at: Option<DateTime<Utc>>,
) -> Uuid {
    let id = Uuid::new_v4();
    let created = Utc::now() - Duration::days(1);
    store.insert_reservation(ReservationEntity {
        id,
        kind: "room".to_string(),
        status: status.to_string(),
        resource_ref: resource.map(|r| r.to_string()),
        starts_at: created + Duration::days(3),
        ends_at: created + Duration::days(5),
        customer_id: customer_id.map(|c| c.to_string()),
        customer_name: "Anong".to_string(),
        customer_phone: None,
        total_price: Some(150_000),
        payment_status: payment_status.to_string(),
        payment_due_at,
        latest_slip_id: None,
        review_submitted: false,
        review_rating: None,
        review_comment: None,
        cancelled_at: None,
        cancelled_reason: None,
        cancelled_by_type: None,
        cancelled_by_id: None,
        created_by_type: "customer".to_string(),
        created_by_id: customer_id.map(|c| c.to_string()),
        created_at: created,
        updated_at: created,
    });
    id
}

// ---------------------------------------------------------------------------
// Exclusivity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overlapping_reservations_on_one_room_are_rejected() {
    let store = InMemoryStore::new();
    let usecase = ReservationUseCase::new(Arc::clone(&store), Arc::new(NullSink), tz());

    // Room R101 booked June 1 to June 3.
    usecase
        .create(
            room_request("R101", utc(2024, 6, 1), utc(2024, 6, 3)),
            Actor::customer("U1"),
        )
        .await
        .unwrap();

    // June 2 to June 4 straddles the occupied window.
    let err = usecase
        .create(
            room_request("R101", utc(2024, 6, 2), utc(2024, 6, 4)),
            Actor::customer("U2"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReservationError::SlotTaken));

    // June 3 to June 5 starts exactly at checkout and is accepted.
    usecase
        .create(
            room_request("R101", utc(2024, 6, 3), utc(2024, 6, 5)),
            Actor::customer("U2"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_can_deliberately_double_book() {
    let store = InMemoryStore::new();
    let usecase = ReservationUseCase::new(Arc::clone(&store), Arc::new(NullSink), tz());

    usecase
        .create(
            room_request("R101", utc(2024, 6, 1), utc(2024, 6, 3)),
            Actor::customer("U1"),
        )
        .await
        .unwrap();

    let mut overlapping = room_request("R101", utc(2024, 6, 2), utc(2024, 6, 4));
    overlapping.allow_overlap = true;
    usecase
        .create(overlapping, Actor::admin("A1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_reservation_frees_the_slot() {
    let store = InMemoryStore::new();
    let usecase = ReservationUseCase::new(Arc::clone(&store), Arc::new(NullSink), tz());

    let first = usecase
        .create(
            room_request("R101", utc(2024, 6, 1), utc(2024, 6, 3)),
            Actor::customer("U1"),
        )
        .await
        .unwrap();
    usecase
        .cancel(
            first.id,
            CancelReservationModel {
                reason: "change of plans".to_string(),
            },
            Actor::customer("U1"),
        )
        .await
        .unwrap();

    usecase
        .create(
            room_request("R101", utc(2024, 6, 1), utc(2024, 6, 3)),
            Actor::customer("U2"),
        )
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Loyalty
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redemption_below_threshold_is_refused_without_debit() {
    let store = InMemoryStore::new();
    store.insert_customer(customer("U1", 80));
    let reward_entity = reward(100);
    let reward_id = reward_entity.id;
    store.insert_reward(reward_entity);

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    let err = usecase.redeem("U1", reward_id).await.unwrap_err();
    assert!(matches!(
        err,
        LoyaltyError::InsufficientPoints {
            balance: 80,
            required: 100
        }
    ));

    assert_eq!(store.customer("U1").unwrap().points, 80);
    assert_eq!(store.coupon_count(), 0);
    assert_eq!(store.reward(reward_id).unwrap().redeemed_count, 0);
}

#[tokio::test]
async fn successful_redemption_debits_and_issues_coupon() {
    let store = InMemoryStore::new();
    store.insert_customer(customer("U1", 150));
    let reward_entity = reward(100);
    let reward_id = reward_entity.id;
    store.insert_reward(reward_entity);

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    usecase.redeem("U1", reward_id).await.unwrap();

    assert_eq!(store.customer("U1").unwrap().points, 50);
    assert_eq!(store.coupon_count(), 1);
    assert_eq!(store.reward(reward_id).unwrap().redeemed_count, 1);
}

#[tokio::test]
async fn concurrent_redemptions_never_overspend() {
    let store = InMemoryStore::new();
    store.insert_customer(customer("U1", 150));
    let reward_entity = reward(100);
    let reward_id = reward_entity.id;
    store.insert_reward(reward_entity);

    let usecase = Arc::new(LoyaltyUseCase::new(Arc::clone(&store), 5));

    let a = tokio::spawn({
        let usecase = Arc::clone(&usecase);
        async move { usecase.redeem("U1", reward_id).await }
    });
    let b = tokio::spawn({
        let usecase = Arc::clone(&usecase);
        async move { usecase.redeem("U1", reward_id).await }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();

    // 150 points only cover one 100-point redemption.
    assert_eq!(successes, 1);
    assert_eq!(store.customer("U1").unwrap().points, 50);
    assert_eq!(store.coupon_count(), 1);
    assert_eq!(store.reward(reward_id).unwrap().redeemed_count, 1);
}

#[tokio::test]
async fn identity_merge_transfers_legacy_points_exactly_once() {
    let store = InMemoryStore::new();
    store.insert_customer(legacy_customer("phone:0812345678", "0812345678", 120));

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    let model = MergeIdentityModel {
        phone: "0812345678".to_string(),
        full_name: Some("Malee".to_string()),
        picture_url: None,
    };

    let customer_id = usecase.merge_identity("U1", model.clone()).await.unwrap();
    assert_eq!(customer_id, "U1");
    assert_eq!(store.customer("U1").unwrap().points, 120);
    assert!(store.customer("phone:0812345678").is_none());

    // Re-running the merge is a no-op on the balance.
    usecase.merge_identity("U1", model).await.unwrap();
    assert_eq!(store.customer("U1").unwrap().points, 120);
}

#[tokio::test]
async fn concurrent_first_time_merges_leave_one_phone_owner() {
    let store = InMemoryStore::new();
    let usecase = Arc::new(LoyaltyUseCase::new(Arc::clone(&store), 5));
    let model = MergeIdentityModel {
        phone: "0899999999".to_string(),
        full_name: None,
        picture_url: None,
    };

    let a = tokio::spawn({
        let usecase = Arc::clone(&usecase);
        let model = model.clone();
        async move { usecase.merge_identity("U1", model).await }
    });
    let b = tokio::spawn({
        let usecase = Arc::clone(&usecase);
        let model = model.clone();
        async move { usecase.merge_identity("U2", model).await }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|err| matches!(err, LoyaltyError::MergeRefused)));

    let owners = ["U1", "U2"]
        .iter()
        .filter_map(|id| store.customer(id))
        .filter(|c| c.phone.as_deref() == Some("0899999999"))
        .count();
    assert_eq!(owners, 1);
}

#[tokio::test]
async fn merge_refuses_phone_linked_to_another_identity() {
    let store = InMemoryStore::new();
    let mut linked = customer("U9", 40);
    linked.phone = Some("0812345678".to_string());
    store.insert_customer(linked);

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    let err = usecase
        .merge_identity(
            "U1",
            MergeIdentityModel {
                phone: "0812345678".to_string(),
                full_name: None,
                picture_url: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::MergeRefused));

    // The linked account keeps its balance.
    assert_eq!(store.customer("U9").unwrap().points, 40);
}

#[tokio::test]
async fn review_bonus_is_awarded_at_most_once() {
    let store = InMemoryStore::new();
    store.insert_customer(customer("U1", 10));
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Completed,
        PaymentStatus::Paid,
        Some("U1"),
        None,
    );

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    let model = SubmitReviewModel {
        rating: 5,
        comment: Some("wonderful stay".to_string()),
    };

    let bonus = usecase
        .submit_review(reservation_id, "U1", model.clone())
        .await
        .unwrap();
    assert_eq!(bonus, 5);
    assert_eq!(store.customer("U1").unwrap().points, 15);

    let err = usecase
        .submit_review(reservation_id, "U1", model)
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::AlreadyReviewed));
    assert_eq!(store.customer("U1").unwrap().points, 15);
}

#[tokio::test]
async fn review_on_unfinished_reservation_is_refused() {
    let store = InMemoryStore::new();
    store.insert_customer(customer("U1", 0));
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Confirmed,
        PaymentStatus::Paid,
        Some("U1"),
        None,
    );

    let usecase = LoyaltyUseCase::new(Arc::clone(&store), 5);
    let err = usecase
        .submit_review(
            reservation_id,
            "U1",
            SubmitReviewModel {
                rating: 4,
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::NotCompleted));
}

// ---------------------------------------------------------------------------
// Auto-cancel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auto_cancel_only_touches_overdue_unpaid_reservations() {
    let store = InMemoryStore::new();
    let now = Utc::now();

    let overdue = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U1"),
        Some(now - Duration::hours(3)),
    );
    let not_due = stored_reservation(
        &store,
        Some("R102"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U2"),
        Some(now + Duration::hours(3)),
    );
    let paid = stored_reservation(
        &store,
        Some("R103"),
        ReservationStatus::Confirmed,
        PaymentStatus::Paid,
        Some("U3"),
        Some(now - Duration::hours(3)),
    );
    let completed = stored_reservation(
        &store,
        Some("R104"),
        ReservationStatus::Completed,
        PaymentStatus::Paid,
        Some("U4"),
        Some(now - Duration::hours(3)),
    );

    let usecase = AutoCancelUseCase::new(Arc::clone(&store), Arc::new(NullSink), tz(), 200);
    let result = usecase.run(now).await.unwrap();

    assert_eq!(result.cancelled, 1);
    assert_eq!(
        store.reservation(overdue).unwrap().status,
        ReservationStatus::Cancelled.to_string()
    );
    assert_eq!(
        store.reservation(overdue).unwrap().cancelled_by_type,
        Some("system".to_string())
    );
    assert_eq!(
        store.reservation(not_due).unwrap().status,
        ReservationStatus::Pending.to_string()
    );
    assert_eq!(
        store.reservation(paid).unwrap().status,
        ReservationStatus::Confirmed.to_string()
    );
    assert_eq!(
        store.reservation(completed).unwrap().status,
        ReservationStatus::Completed.to_string()
    );
}

#[tokio::test]
async fn auto_cancel_sweep_is_idempotent() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U1"),
        Some(now - Duration::hours(3)),
    );

    let usecase = AutoCancelUseCase::new(Arc::clone(&store), Arc::new(NullSink), tz(), 200);
    assert_eq!(usecase.run(now).await.unwrap().cancelled, 1);
    assert_eq!(usecase.run(now).await.unwrap().cancelled, 0);
}

// ---------------------------------------------------------------------------
// Payment slips
// ---------------------------------------------------------------------------

fn slip_usecase(
    store: &Arc<InMemoryStore>,
) -> PaymentSlipUseCase<InMemoryStore, InMemoryStore, NullSink> {
    PaymentSlipUseCase::new(Arc::clone(store), Arc::clone(store), Arc::new(NullSink), 30, 200)
}

fn evidence() -> SubmitSlipModel {
    SubmitSlipModel {
        evidence_base64: BASE64.encode(b"bank transfer screenshot"),
        mime_type: "image/jpeg".to_string(),
        note: None,
    }
}

#[tokio::test]
async fn approved_slip_confirms_reservation_and_marks_paid() {
    let store = InMemoryStore::new();
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U1"),
        None,
    );

    let usecase = slip_usecase(&store);
    let slip_id = usecase
        .submit(reservation_id, "U1", evidence())
        .await
        .unwrap();

    let pending = store.reservation(reservation_id).unwrap();
    assert_eq!(
        pending.payment_status,
        PaymentStatus::PendingVerification.to_string()
    );
    assert_eq!(pending.latest_slip_id, Some(slip_id));

    usecase.verify(slip_id, true).await.unwrap();
    let confirmed = store.reservation(reservation_id).unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed.to_string());
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid.to_string());
}

#[tokio::test]
async fn rejected_slip_resets_payment_to_unpaid() {
    let store = InMemoryStore::new();
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U1"),
        None,
    );

    let usecase = slip_usecase(&store);
    let slip_id = usecase
        .submit(reservation_id, "U1", evidence())
        .await
        .unwrap();
    usecase.verify(slip_id, false).await.unwrap();

    let reservation = store.reservation(reservation_id).unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending.to_string());
    assert_eq!(
        reservation.payment_status,
        PaymentStatus::Unpaid.to_string()
    );
}

#[tokio::test]
async fn first_slip_submission_claims_ownerless_reservation() {
    let store = InMemoryStore::new();
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        None,
        None,
    );

    let usecase = slip_usecase(&store);
    usecase
        .submit(reservation_id, "U1", evidence())
        .await
        .unwrap();

    assert_eq!(
        store.reservation(reservation_id).unwrap().customer_id,
        Some("U1".to_string())
    );
}

#[tokio::test]
async fn slip_cleanup_is_idempotent_and_clears_pointers() {
    let store = InMemoryStore::new();
    let reservation_id = stored_reservation(
        &store,
        Some("R101"),
        ReservationStatus::Pending,
        PaymentStatus::Unpaid,
        Some("U1"),
        None,
    );

    let usecase = slip_usecase(&store);
    let slip_id = usecase
        .submit(reservation_id, "U1", evidence())
        .await
        .unwrap();

    // Push the clock past the retention window.
    let far_future = Utc::now() + Duration::days(40);
    let first = usecase.expire_and_cleanup(far_future).await.unwrap();
    assert_eq!(first.deleted, 1);
    assert_eq!(store.slip_count(), 0);
    assert_eq!(store.reservation(reservation_id).unwrap().latest_slip_id, None);
    assert!(
        PaymentSlipRepository::find_by_id(&*store, slip_id)
            .await
            .unwrap()
            .is_none()
    );

    let second = usecase.expire_and_cleanup(far_future).await.unwrap();
    assert_eq!(second.deleted, 0);
    assert_eq!(second.checked, 0);
}
