use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::loyalty::{
        LoyaltyRepository, MergeIdentityEntity, MergeOutcome, RedeemOutcome, ReviewOutcome,
        UseCouponOutcome,
    },
    value_objects::loyalty::{
        CustomerProfileModel, MergeIdentityModel, SubmitReviewModel,
    },
};

#[derive(Debug, Error)]
pub enum LoyaltyError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("insufficient points: have {balance}, need {required}")]
    InsufficientPoints { balance: i64, required: i64 },
    #[error("customer not found")]
    CustomerNotFound,
    #[error("reward not found")]
    RewardNotFound,
    #[error("phone number is linked to another account")]
    MergeRefused,
    #[error("review already submitted for this reservation")]
    AlreadyReviewed,
    #[error("reservation is not completed")]
    NotCompleted,
    #[error("reservation not found")]
    ReservationNotFound,
    #[error("not allowed")]
    Unauthorized,
    #[error("coupon not found")]
    CouponNotFound,
    #[error("coupon already used")]
    CouponAlreadyUsed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LoyaltyError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LoyaltyError::Validation(_) => StatusCode::BAD_REQUEST,
            LoyaltyError::InsufficientPoints { .. }
            | LoyaltyError::MergeRefused
            | LoyaltyError::AlreadyReviewed
            | LoyaltyError::NotCompleted
            | LoyaltyError::CouponAlreadyUsed => StatusCode::CONFLICT,
            LoyaltyError::CustomerNotFound
            | LoyaltyError::RewardNotFound
            | LoyaltyError::ReservationNotFound
            | LoyaltyError::CouponNotFound => StatusCode::NOT_FOUND,
            LoyaltyError::Unauthorized => StatusCode::FORBIDDEN,
            LoyaltyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type LoyaltyResult<T> = std::result::Result<T, LoyaltyError>;

pub struct LoyaltyUseCase<L>
where
    L: LoyaltyRepository + Send + Sync,
{
    loyalty_repository: Arc<L>,
    review_point_bonus: i64,
}

impl<L> LoyaltyUseCase<L>
where
    L: LoyaltyRepository + Send + Sync,
{
    pub fn new(loyalty_repository: Arc<L>, review_point_bonus: i64) -> Self {
        Self {
            loyalty_repository,
            review_point_bonus,
        }
    }

    /// Link the caller's chat identity to a phone number, folding any legacy
    /// phone-keyed balance into the chat-keyed record.
    pub async fn merge_identity(
        &self,
        chat_user_id: &str,
        model: MergeIdentityModel,
    ) -> LoyaltyResult<String> {
        let merge = MergeIdentityEntity {
            chat_user_id: chat_user_id.to_string(),
            phone: model.phone,
            full_name: model.full_name,
            picture_url: model.picture_url,
        };

        match self.loyalty_repository.merge_identity(merge).await? {
            MergeOutcome::Merged {
                customer_id,
                points_transferred,
            } => {
                info!(
                    %customer_id,
                    points_transferred,
                    "loyalty: identity merged"
                );
                Ok(customer_id)
            }
            MergeOutcome::Refused {
                linked_chat_user_id,
            } => {
                // Refusal blocks point theft via someone else's phone number.
                warn!(
                    chat_user_id,
                    linked_chat_user_id = %linked_chat_user_id,
                    "loyalty: merge refused, phone linked to another chat identity"
                );
                Err(LoyaltyError::MergeRefused)
            }
        }
    }

    pub async fn redeem(&self, customer_id: &str, reward_id: Uuid) -> LoyaltyResult<Uuid> {
        match self
            .loyalty_repository
            .redeem(customer_id.to_string(), reward_id)
            .await?
        {
            RedeemOutcome::Redeemed { coupon_id, balance } => {
                info!(
                    customer_id,
                    %reward_id,
                    %coupon_id,
                    balance,
                    "loyalty: reward redeemed"
                );
                Ok(coupon_id)
            }
            RedeemOutcome::InsufficientPoints { balance, required } => {
                info!(
                    customer_id,
                    %reward_id,
                    balance,
                    required,
                    "loyalty: redemption refused, insufficient points"
                );
                Err(LoyaltyError::InsufficientPoints { balance, required })
            }
            RedeemOutcome::CustomerNotFound => Err(LoyaltyError::CustomerNotFound),
            RedeemOutcome::RewardNotFound => Err(LoyaltyError::RewardNotFound),
        }
    }

    pub async fn submit_review(
        &self,
        reservation_id: Uuid,
        customer_id: &str,
        model: SubmitReviewModel,
    ) -> LoyaltyResult<i64> {
        if !(1..=5).contains(&model.rating) {
            return Err(LoyaltyError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        match self
            .loyalty_repository
            .award_review_points(
                reservation_id,
                customer_id.to_string(),
                model.rating,
                model.comment,
                self.review_point_bonus,
            )
            .await?
        {
            ReviewOutcome::Awarded { bonus } => {
                info!(
                    %reservation_id,
                    customer_id,
                    bonus,
                    "loyalty: review stored, points awarded"
                );
                Ok(bonus)
            }
            ReviewOutcome::AlreadySubmitted => Err(LoyaltyError::AlreadyReviewed),
            ReviewOutcome::NotCompleted => Err(LoyaltyError::NotCompleted),
            ReviewOutcome::NotOwner => Err(LoyaltyError::Unauthorized),
            ReviewOutcome::ReservationNotFound => Err(LoyaltyError::ReservationNotFound),
        }
    }

    pub async fn profile(&self, customer_id: &str) -> LoyaltyResult<CustomerProfileModel> {
        let (customer, coupons) = self
            .loyalty_repository
            .find_profile(customer_id.to_string())
            .await?
            .ok_or(LoyaltyError::CustomerNotFound)?;

        Ok(CustomerProfileModel::from_parts(customer, coupons))
    }

    pub async fn use_coupon(&self, coupon_id: Uuid) -> LoyaltyResult<()> {
        match self.loyalty_repository.use_coupon(coupon_id).await? {
            UseCouponOutcome::Used => {
                info!(%coupon_id, "loyalty: coupon marked used");
                Ok(())
            }
            UseCouponOutcome::AlreadyUsed => Err(LoyaltyError::CouponAlreadyUsed),
            UseCouponOutcome::NotFound => Err(LoyaltyError::CouponNotFound),
        }
    }
}
