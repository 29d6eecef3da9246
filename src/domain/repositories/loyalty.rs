use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{coupons::CouponEntity, customers::CustomerEntity};

#[derive(Debug, Clone)]
pub struct MergeIdentityEntity {
    pub chat_user_id: String,
    pub phone: String,
    pub full_name: Option<String>,
    pub picture_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// The chat-keyed record is (now) authoritative; `points_transferred` is
    /// zero when no legacy phone record existed, which makes re-running the
    /// same merge a no-op.
    Merged {
        customer_id: String,
        points_transferred: i64,
    },
    /// The phone already belongs to a different chat identity.
    Refused { linked_chat_user_id: String },
}

#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    Redeemed { coupon_id: Uuid, balance: i64 },
    InsufficientPoints { balance: i64, required: i64 },
    CustomerNotFound,
    RewardNotFound,
}

#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    Awarded { bonus: i64 },
    AlreadySubmitted,
    NotCompleted,
    NotOwner,
    ReservationNotFound,
}

#[derive(Debug, Clone)]
pub enum UseCouponOutcome {
    Used,
    AlreadyUsed,
    NotFound,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoyaltyRepository {
    /// Reconcile a phone-keyed legacy record into the chat-keyed record.
    /// Reads both candidates, moves the point balance, and deletes the legacy
    /// row inside one transaction; no partial state is ever visible.
    async fn merge_identity(&self, merge: MergeIdentityEntity) -> Result<MergeOutcome>;

    /// Atomic points-for-coupon exchange: debit balance, insert an unused
    /// coupon, bump the reward's redeemed counter, all or nothing.
    async fn redeem(&self, customer_id: String, reward_id: Uuid) -> Result<RedeemOutcome>;

    /// Store a review on a completed reservation and credit the bonus exactly
    /// once, gated by the reservation's review_submitted flag within the same
    /// transaction.
    async fn award_review_points(
        &self,
        reservation_id: Uuid,
        customer_id: String,
        rating: i32,
        comment: Option<String>,
        bonus: i64,
    ) -> Result<ReviewOutcome>;

    async fn find_profile(
        &self,
        customer_id: String,
    ) -> Result<Option<(CustomerEntity, Vec<CouponEntity>)>>;

    async fn use_coupon(&self, coupon_id: Uuid) -> Result<UseCouponOutcome>;
}
