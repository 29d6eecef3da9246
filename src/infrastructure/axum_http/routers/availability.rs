use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::error;

use crate::{
    application::usecases::availability::AvailabilityUseCase,
    domain::{
        repositories::reservations::ReservationRepository,
        value_objects::{
            booking_interval::BookingInterval, reservations::AvailabilityViewModel,
        },
    },
    infrastructure::{
        axum_http::error_responses,
        postgres::{
            postgres_connection::PgPoolSquad, repositories::reservations::ReservationPostgres,
        },
    },
};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub resource_ref: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let reservation_repository = ReservationPostgres::new(Arc::clone(&db_pool));
    let usecase = AvailabilityUseCase::new(Arc::new(reservation_repository));

    Router::new()
        .route("/availability", get(check_availability))
        .with_state(Arc::new(usecase))
}

pub async fn check_availability<R>(
    State(usecase): State<Arc<AvailabilityUseCase<R>>>,
    Query(query): Query<AvailabilityQuery>,
) -> impl IntoResponse
where
    R: ReservationRepository + Send + Sync,
{
    let Some(requested) = BookingInterval::new(query.start, query.end) else {
        return (
            StatusCode::BAD_REQUEST,
            "start must be strictly before end".to_string(),
        )
            .into_response();
    };

    match usecase.is_available(&query.resource_ref, requested).await {
        Ok(available) => Json(AvailabilityViewModel {
            resource_ref: query.resource_ref,
            starts_at: query.start,
            ends_at: query.end,
            available,
        })
        .into_response(),
        Err(err) => {
            error!(error = ?err, "availability: check failed");
            error_responses::error_response(StatusCode::INTERNAL_SERVER_ERROR, &err)
        }
    }
}
