pub mod axum_http;
pub mod notification;
pub mod postgres;
