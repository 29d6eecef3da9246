use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::customers;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = customers)]
pub struct CustomerEntity {
    pub id: String,
    pub chat_user_id: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub picture_url: Option<String>,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub struct InsertCustomerEntity {
    pub id: String,
    pub chat_user_id: Option<String>,
    pub phone: Option<String>,
    pub full_name: Option<String>,
    pub picture_url: Option<String>,
    pub points: i64,
}
