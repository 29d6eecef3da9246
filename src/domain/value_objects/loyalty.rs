use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{coupons::CouponEntity, customers::CustomerEntity};

#[derive(Debug, Clone, Deserialize)]
pub struct MergeIdentityModel {
    pub phone: String,
    pub full_name: Option<String>,
    pub picture_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedeemModel {
    pub reward_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReviewModel {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CouponViewModel {
    pub id: Uuid,
    pub reward_id: Uuid,
    pub discount_type: String,
    pub discount_value: i32,
    pub redeemed_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<CouponEntity> for CouponViewModel {
    fn from(entity: CouponEntity) -> Self {
        Self {
            id: entity.id,
            reward_id: entity.reward_id,
            discount_type: entity.discount_type,
            discount_value: entity.discount_value,
            redeemed_at: entity.redeemed_at,
            used: entity.used,
            used_at: entity.used_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerProfileModel {
    pub id: String,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub points: i64,
    pub coupons: Vec<CouponViewModel>,
}

impl CustomerProfileModel {
    pub fn from_parts(customer: CustomerEntity, coupons: Vec<CouponEntity>) -> Self {
        Self {
            id: customer.id,
            phone: customer.phone,
            full_name: customer.full_name,
            points: customer.points,
            coupons: coupons.into_iter().map(CouponViewModel::from).collect(),
        }
    }
}
