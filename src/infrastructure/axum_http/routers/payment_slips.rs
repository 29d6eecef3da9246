use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::{admin_gate::AdminGate, payment_slips::PaymentSlipUseCase},
    auth::{AdminUser, CustomerUser},
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{
            admins::AdminRepository, notification::NotificationSink,
            payment_slips::PaymentSlipRepository, reservations::ReservationRepository,
        },
        value_objects::payment_slips::{SubmitSlipModel, VerifySlipModel},
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        notification::chat_push::ChatPushSink,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                admins::AdminPostgres, payment_slips::PaymentSlipPostgres,
                reservations::ReservationPostgres,
            },
        },
    },
};

pub struct SlipsState<S, R, N, A>
where
    S: PaymentSlipRepository + Send + Sync,
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    pub slip_usecase: PaymentSlipUseCase<S, R, N>,
    pub admin_gate: AdminGate<A>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let slip_repository = PaymentSlipPostgres::new(Arc::clone(&db_pool));
    let reservation_repository = ReservationPostgres::new(Arc::clone(&db_pool));
    let notification_sink = ChatPushSink::new(&config.chat_push);
    let admin_repository = AdminPostgres::new(Arc::clone(&db_pool));

    let state = SlipsState {
        slip_usecase: PaymentSlipUseCase::new(
            Arc::new(slip_repository),
            Arc::new(reservation_repository),
            Arc::new(notification_sink),
            config.booking.slip_retention_days,
            config.booking.cleanup_batch_size,
        ),
        admin_gate: AdminGate::new(Arc::new(admin_repository)),
    };

    Router::new()
        .route("/reservations/:id/slips", post(submit_slip))
        .route("/slips/:id/verify", post(verify_slip))
        .with_state(Arc::new(state))
}

pub async fn submit_slip<S, R, N, A>(
    State(state): State<Arc<SlipsState<S, R, N, A>>>,
    customer: CustomerUser,
    Path(reservation_id): Path<Uuid>,
    Json(model): Json<SubmitSlipModel>,
) -> Response
where
    S: PaymentSlipRepository + Send + Sync,
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    match state
        .slip_usecase
        .submit(reservation_id, &customer.customer_id, model)
        .await
    {
        Ok(slip_id) => (
            StatusCode::CREATED,
            Json(json!({ "slip_id": slip_id })),
        )
            .into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn verify_slip<S, R, N, A>(
    State(state): State<Arc<SlipsState<S, R, N, A>>>,
    admin: AdminUser,
    Path(slip_id): Path<Uuid>,
    Json(model): Json<VerifySlipModel>,
) -> Response
where
    S: PaymentSlipRepository + Send + Sync,
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    if let Err(err) = state.admin_gate.authorize(&admin.subject).await {
        return error_response(err.status_code(), &err);
    }

    match state.slip_usecase.verify(slip_id, model.approve).await {
        Ok(()) => Json(json!({ "verified": model.approve })).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
