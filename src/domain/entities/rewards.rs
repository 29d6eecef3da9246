use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::rewards;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = rewards)]
pub struct RewardEntity {
    pub id: Uuid,
    pub name: String,
    pub points_required: i32,
    pub discount_type: String,
    pub discount_value: i32,
    pub redeemed_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
