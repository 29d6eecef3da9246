use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_slips;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_slips)]
pub struct PaymentSlipEntity {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub customer_id: Option<String>,
    pub payload: Vec<u8>,
    pub mime_type: String,
    pub size_bytes: i64,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_slips)]
pub struct InsertPaymentSlipEntity {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub customer_id: Option<String>,
    pub payload: Vec<u8>,
    pub mime_type: String,
    pub size_bytes: i64,
    pub note: Option<String>,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}
