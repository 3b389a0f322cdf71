use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::Value;

use crate::{
    error::AppError,
    routes::bearer::BearerToken,
    services::trophy_service,
    state::SharedState,
    upstream::psn::TrophySummary,
};

/// Account-level reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/user/summary/{account_id}", get(summary))
        .route("/api/user/profile/{account_id}", get(profile))
}

/// Earned trophy totals, polled by the client watchdog.
#[utoipa::path(
    get,
    path = "/api/user/summary/{account_id}",
    tag = "user",
    params(
        ("account_id" = String, Path, description = "Account id"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Trophy summary", body = TrophySummary),
        (status = 401, description = "Token Expired"),
    )
)]
pub async fn summary(
    State(state): State<SharedState>,
    Path(account_id): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Json<TrophySummary>, AppError> {
    Ok(Json(trophy_service::summary(&state, &account_id, &token).await?))
}

/// Raw profile document (online id, avatars).
#[utoipa::path(
    get,
    path = "/api/user/profile/{account_id}",
    tag = "user",
    params(
        ("account_id" = String, Path, description = "Account id"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Profile", body = serde_json::Value),
        (status = 401, description = "Token Expired"),
    )
)]
pub async fn profile(
    State(state): State<SharedState>,
    Path(account_id): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, AppError> {
    Ok(Json(trophy_service::profile(&state, &account_id, &token).await?))
}
