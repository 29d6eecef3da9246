use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::reservations;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = reservations)]
pub struct ReservationEntity {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub resource_ref: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub total_price: Option<i64>,
    pub payment_status: String,
    pub payment_due_at: Option<DateTime<Utc>>,
    pub latest_slip_id: Option<Uuid>,
    pub review_submitted: bool,
    pub review_rating: Option<i32>,
    pub review_comment: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_reason: Option<String>,
    pub cancelled_by_type: Option<String>,
    pub cancelled_by_id: Option<String>,
    pub created_by_type: String,
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reservations)]
pub struct InsertReservationEntity {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub resource_ref: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub total_price: Option<i64>,
    pub payment_status: String,
    pub payment_due_at: Option<DateTime<Utc>>,
    pub created_by_type: String,
    pub created_by_id: Option<String>,
}
