use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::{admin_gate::AdminGate, loyalty::LoyaltyUseCase},
    auth::{AdminUser, CustomerUser},
    config::config_model::DotEnvyConfig,
    domain::{
        repositories::{admins::AdminRepository, loyalty::LoyaltyRepository},
        value_objects::loyalty::{MergeIdentityModel, RedeemModel, SubmitReviewModel},
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{admins::AdminPostgres, loyalty::LoyaltyPostgres},
        },
    },
};

pub struct LoyaltyState<L, A>
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    pub loyalty_usecase: LoyaltyUseCase<L>,
    pub admin_gate: AdminGate<A>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let loyalty_repository = LoyaltyPostgres::new(Arc::clone(&db_pool));
    let admin_repository = AdminPostgres::new(Arc::clone(&db_pool));

    let state = LoyaltyState {
        loyalty_usecase: LoyaltyUseCase::new(
            Arc::new(loyalty_repository),
            config.booking.review_point_bonus,
        ),
        admin_gate: AdminGate::new(Arc::new(admin_repository)),
    };

    Router::new()
        .route("/loyalty/merge", post(merge_identity))
        .route("/loyalty/profile", get(profile))
        .route("/loyalty/redeem", post(redeem))
        .route("/loyalty/coupons/:id/use", post(use_coupon))
        .route("/reservations/:id/review", post(submit_review))
        .with_state(Arc::new(state))
}

pub async fn merge_identity<L, A>(
    State(state): State<Arc<LoyaltyState<L, A>>>,
    customer: CustomerUser,
    Json(model): Json<MergeIdentityModel>,
) -> Response
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    match state
        .loyalty_usecase
        .merge_identity(&customer.customer_id, model)
        .await
    {
        Ok(customer_id) => Json(json!({ "customer_id": customer_id })).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn profile<L, A>(
    State(state): State<Arc<LoyaltyState<L, A>>>,
    customer: CustomerUser,
) -> Response
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    match state.loyalty_usecase.profile(&customer.customer_id).await {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn redeem<L, A>(
    State(state): State<Arc<LoyaltyState<L, A>>>,
    customer: CustomerUser,
    Json(model): Json<RedeemModel>,
) -> Response
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    match state
        .loyalty_usecase
        .redeem(&customer.customer_id, model.reward_id)
        .await
    {
        Ok(coupon_id) => (
            StatusCode::CREATED,
            Json(json!({ "coupon_id": coupon_id })),
        )
            .into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn use_coupon<L, A>(
    State(state): State<Arc<LoyaltyState<L, A>>>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Response
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    if let Err(err) = state.admin_gate.authorize(&admin.subject).await {
        return error_response(err.status_code(), &err);
    }

    match state.loyalty_usecase.use_coupon(id).await {
        Ok(()) => Json(json!({ "used": true })).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn submit_review<L, A>(
    State(state): State<Arc<LoyaltyState<L, A>>>,
    customer: CustomerUser,
    Path(id): Path<Uuid>,
    Json(model): Json<SubmitReviewModel>,
) -> Response
where
    L: LoyaltyRepository + Send + Sync,
    A: AdminRepository + Send + Sync,
{
    match state
        .loyalty_usecase
        .submit_review(id, &customer.customer_id, model)
        .await
    {
        Ok(bonus) => Json(json!({ "points_awarded": bonus })).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
