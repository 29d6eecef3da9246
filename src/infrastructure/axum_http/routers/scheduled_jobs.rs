use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use tracing::error;

use crate::{
    application::usecases::{auto_cancel::AutoCancelUseCase, payment_slips::PaymentSlipUseCase},
    config::config_model::DotEnvyConfig,
    domain::value_objects::payment_slips::{AutoCancelSummaryModel, CleanupSummaryModel},
    infrastructure::{
        notification::chat_push::ChatPushSink,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                payment_slips::PaymentSlipPostgres, reservations::ReservationPostgres,
            },
        },
    },
};

// Run example
//   curl "http://localhost:$SERVER_PORT/internal/v1/jobs/auto-cancel" \
//     -H "Authorization: Bearer $SCHEDULER_SECRET"

type AutoCancel = AutoCancelUseCase<ReservationPostgres, ChatPushSink>;
type SlipCleanup = PaymentSlipUseCase<PaymentSlipPostgres, ReservationPostgres, ChatPushSink>;

#[derive(Clone)]
pub struct JobsRouteState {
    config: Arc<DotEnvyConfig>,
    auto_cancel_usecase: Arc<AutoCancel>,
    slip_usecase: Arc<SlipCleanup>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let reservation_repository = Arc::new(ReservationPostgres::new(Arc::clone(&db_pool)));
    let slip_repository = Arc::new(PaymentSlipPostgres::new(Arc::clone(&db_pool)));
    let notification_sink = Arc::new(ChatPushSink::new(&config.chat_push));

    let auto_cancel_usecase = AutoCancelUseCase::new(
        Arc::clone(&reservation_repository),
        Arc::clone(&notification_sink),
        config.booking.reference_timezone(),
        config.booking.cleanup_batch_size as i64,
    );
    let slip_usecase = PaymentSlipUseCase::new(
        slip_repository,
        reservation_repository,
        notification_sink,
        config.booking.slip_retention_days,
        config.booking.cleanup_batch_size,
    );

    Router::new()
        .route("/auto-cancel", get(auto_cancel))
        .route("/cleanup-slips", get(cleanup_slips))
        .with_state(JobsRouteState {
            config,
            auto_cancel_usecase: Arc::new(auto_cancel_usecase),
            slip_usecase: Arc::new(slip_usecase),
        })
}

pub async fn auto_cancel(State(state): State<JobsRouteState>, headers: HeaderMap) -> Response {
    if let Err(status) = authorize_bearer(&headers, &state.config.scheduler.secret) {
        return (status, "unauthorized").into_response();
    }

    match state.auto_cancel_usecase.run(Utc::now()).await {
        Ok(result) => Json(AutoCancelSummaryModel {
            success: true,
            cancelled: result.cancelled,
            checked: result.checked,
        })
        .into_response(),
        Err(err) => {
            error!(error = ?err, "auto_cancel: sweep failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "auto-cancel failed").into_response()
        }
    }
}

pub async fn cleanup_slips(State(state): State<JobsRouteState>, headers: HeaderMap) -> Response {
    if let Err(status) = authorize_bearer(&headers, &state.config.scheduler.secret) {
        return (status, "unauthorized").into_response();
    }

    match state.slip_usecase.expire_and_cleanup(Utc::now()).await {
        Ok(result) => Json(CleanupSummaryModel {
            success: true,
            deleted: result.deleted,
            checked: result.checked,
        })
        .into_response(),
        Err(err) => {
            error!(error = ?err, "cleanup_slips: cleanup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "cleanup failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
