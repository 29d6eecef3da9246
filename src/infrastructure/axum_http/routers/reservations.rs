use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    application::usecases::{
        admin_gate::AdminGate,
        reservations::{ReservationResult, ReservationUseCase},
    },
    auth::{AdminUser, CallerIdentity},
    config::config_model::DotEnvyConfig,
    domain::{
        entities::reservations::ReservationEntity,
        repositories::{
            admins::AdminRepository, notification::NotificationSink,
            reservations::ReservationRepository,
        },
        value_objects::{
            enums::actor_types::Actor,
            reservations::{
                BlockResourceModel, CancelReservationModel, CreateReservationModel,
                ReservationViewModel,
            },
        },
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        notification::chat_push::ChatPushSink,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{admins::AdminPostgres, reservations::ReservationPostgres},
        },
    },
};

pub struct ReservationsState<R, N, A>
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    pub reservation_usecase: ReservationUseCase<R, N>,
    pub admin_gate: AdminGate<A>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let reservation_repository = ReservationPostgres::new(Arc::clone(&db_pool));
    let notification_sink = ChatPushSink::new(&config.chat_push);
    let admin_repository = AdminPostgres::new(Arc::clone(&db_pool));

    let state = ReservationsState {
        reservation_usecase: ReservationUseCase::new(
            Arc::new(reservation_repository),
            Arc::new(notification_sink),
            config.booking.reference_timezone(),
        ),
        admin_gate: AdminGate::new(Arc::new(admin_repository)),
    };

    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/reservations/block", post(block_resource))
        .route("/reservations/:id", get(get_reservation))
        .route("/reservations/:id/confirm", post(confirm_reservation))
        .route("/reservations/:id/begin", post(begin_service))
        .route("/reservations/:id/complete", post(complete_service))
        .route("/reservations/:id/cancel", post(cancel_reservation))
        .with_state(Arc::new(state))
}

/// Map the authenticated caller to a reservation actor; admin callers must
/// also clear the admin registry.
async fn resolve_actor<A>(
    admin_gate: &AdminGate<A>,
    caller: CallerIdentity,
) -> Result<Actor, Response>
where
    A: AdminRepository + Send + Sync,
{
    match caller {
        CallerIdentity::Admin(AdminUser { subject }) => {
            match admin_gate.authorize(&subject).await {
                Ok(admin) => Ok(Actor::admin(admin.subject)),
                Err(err) => Err(error_response(err.status_code(), &err)),
            }
        }
        CallerIdentity::Customer(customer) => Ok(Actor::customer(customer.customer_id)),
    }
}

fn respond(result: ReservationResult<ReservationEntity>, created: bool) -> Response {
    match result {
        Ok(entity) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(ReservationViewModel::from(entity))).into_response()
        }
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn create_reservation<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    caller: CallerIdentity,
    Json(model): Json<CreateReservationModel>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    let actor = match resolve_actor(&state.admin_gate, caller).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    respond(state.reservation_usecase.create(model, actor).await, true)
}

pub async fn block_resource<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    admin: AdminUser,
    Json(model): Json<BlockResourceModel>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    let admin_entity = match state.admin_gate.authorize(&admin.subject).await {
        Ok(admin_entity) => admin_entity,
        Err(err) => return error_response(err.status_code(), &err),
    };

    info!(subject = %admin_entity.subject, "reservations: block request received");
    respond(
        state
            .reservation_usecase
            .block(model, Actor::admin(admin_entity.subject))
            .await,
        true,
    )
}

pub async fn get_reservation<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    Path(id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    respond(state.reservation_usecase.get(id).await, false)
}

pub async fn confirm_reservation<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    if let Err(err) = state.admin_gate.authorize(&admin.subject).await {
        return error_response(err.status_code(), &err);
    }

    respond(state.reservation_usecase.confirm(id).await, false)
}

pub async fn begin_service<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    if let Err(err) = state.admin_gate.authorize(&admin.subject).await {
        return error_response(err.status_code(), &err);
    }

    respond(state.reservation_usecase.begin_service(id).await, false)
}

pub async fn complete_service<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    if let Err(err) = state.admin_gate.authorize(&admin.subject).await {
        return error_response(err.status_code(), &err);
    }

    respond(state.reservation_usecase.complete_service(id).await, false)
}

pub async fn cancel_reservation<R, N, A>(
    State(state): State<Arc<ReservationsState<R, N, A>>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(model): Json<CancelReservationModel>,
) -> Response
where
    R: ReservationRepository + Send + Sync,
    N: NotificationSink + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    let actor = match resolve_actor(&state.admin_gate, caller).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    respond(
        state.reservation_usecase.cancel(id, model, actor).await,
        false,
    )
}
