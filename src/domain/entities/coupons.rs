use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::coupons;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = coupons)]
pub struct CouponEntity {
    pub id: Uuid,
    pub customer_id: String,
    pub reward_id: Uuid,
    pub discount_type: String,
    pub discount_value: i32,
    pub redeemed_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coupons)]
pub struct InsertCouponEntity {
    pub id: Uuid,
    pub customer_id: String,
    pub reward_id: Uuid,
    pub discount_type: String,
    pub discount_value: i32,
    pub redeemed_at: DateTime<Utc>,
    pub used: bool,
}
