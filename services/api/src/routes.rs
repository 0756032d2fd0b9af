//! API service routes

use auth::{middleware::AuthUser, middleware::auth_middleware, models::User};
use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use common::Tier;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    entitlement::LimitCheck,
    error::{ApiError, ApiResult},
    limits::{Ceilings, FeatureFlags},
    models::{
        UsageKind, UsageKindRequest, UsageResponse, UsageSyncRequest, UsageSyncResponse,
    },
};

/// Response for the tier-entitlements endpoint
#[derive(Serialize)]
pub struct LimitsResponse {
    pub success: bool,
    pub tier: Tier,
    pub limits: Ceilings,
    pub features: FeatureFlags,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/subscription/check-limit", post(check_limit))
        .route("/api/subscription/limits", get(get_limits))
        .route("/api/usage", get(get_usage))
        .route("/api/usage/sync", post(sync_usage))
        .route("/api/usage/increment", post(increment_usage))
        .route("/api/usage/decrement", post(decrement_usage))
        .route_layer(middleware::from_fn_with_state(
            state.token_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

fn parse_kind(payload: Result<Json<UsageKindRequest>, JsonRejection>) -> ApiResult<UsageKind> {
    let Json(payload) = payload?;
    payload.parse_kind().map_err(ApiError::BadRequest)
}

/// Live account lookup; the token's tier may be stale
async fn current_user(state: &AppState, auth_user: &AuthUser) -> ApiResult<User> {
    state
        .user_store
        .find_by_id(auth_user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Check whether the caller may create one more resource of a kind
pub async fn check_limit(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UsageKindRequest>, JsonRejection>,
) -> ApiResult<Json<LimitCheck>> {
    let kind = parse_kind(payload)?;
    let user = current_user(&state, &auth_user).await?;

    let check = state.evaluator.check_limit(user.id, user.tier, kind).await?;
    if !check.allowed {
        info!("User {} denied another {}: {}", user.id, kind, check.message);
    }

    Ok(Json(check))
}

/// Ceilings and feature flags for the caller's current tier
pub async fn get_limits(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<LimitsResponse>> {
    let user = current_user(&state, &auth_user).await?;
    let entitlements = state.evaluator.policy().for_tier(user.tier);

    Ok(Json(LimitsResponse {
        success: true,
        tier: user.tier,
        limits: entitlements.ceilings,
        features: entitlements.features,
    }))
}

/// Current-month usage for the caller
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<UsageResponse>> {
    let user = current_user(&state, &auth_user).await?;
    let usage = state.usage_store.get_usage_stats(user.id).await?;

    Ok(Json(UsageResponse {
        success: true,
        usage,
    }))
}

/// Replace the caller's current-month counts with the client's tallies
pub async fn sync_usage(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UsageSyncRequest>, JsonRejection>,
) -> ApiResult<Json<UsageSyncResponse>> {
    let Json(payload) = payload?;
    let counts = payload.into_counts().map_err(ApiError::BadRequest)?;
    let user = current_user(&state, &auth_user).await?;

    let usage = state.reconciler.reconcile(user.id, counts).await?;

    Ok(Json(UsageSyncResponse {
        success: true,
        message: "Usage synced successfully".to_string(),
        usage,
    }))
}

/// Record one created resource
pub async fn increment_usage(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UsageKindRequest>, JsonRejection>,
) -> ApiResult<Json<UsageResponse>> {
    let kind = parse_kind(payload)?;
    let user = current_user(&state, &auth_user).await?;
    state.usage_store.increment_usage(user.id, kind).await?;
    let usage = state.usage_store.get_usage_stats(user.id).await?;

    Ok(Json(UsageResponse {
        success: true,
        usage,
    }))
}

/// Record one deleted resource; counts never drop below zero
pub async fn decrement_usage(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<UsageKindRequest>, JsonRejection>,
) -> ApiResult<Json<UsageResponse>> {
    let kind = parse_kind(payload)?;
    let user = current_user(&state, &auth_user).await?;
    state.usage_store.decrement_usage(user.id, kind).await?;
    let usage = state.usage_store.get_usage_stats(user.id).await?;

    Ok(Json(UsageResponse {
        success: true,
        usage,
    }))
}
