use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::xbox::{XboxExchangeRequest, XboxTitlesRequest},
    error::AppError,
    services::xbox_service,
    state::SharedState,
    upstream::xbox::{XboxSession, XboxTitleList},
};

/// Xbox Live endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/xbox/exchange", post(exchange))
        .route("/xbox/titles", post(titles))
}

/// Trade a Microsoft OAuth code for XSTS credentials and the gamer profile.
#[utoipa::path(
    post,
    path = "/xbox/exchange",
    tag = "xbox",
    request_body = XboxExchangeRequest,
    responses(
        (status = 200, description = "Linked account", body = XboxSession),
        (status = 400, description = "Missing credentials"),
        (status = 500, description = "Exchange failed"),
    )
)]
pub async fn exchange(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<XboxExchangeRequest>>,
) -> Result<Json<XboxSession>, AppError> {
    Ok(Json(xbox_service::exchange(&state, &payload).await?))
}

/// Title history with achievement progress.
#[utoipa::path(
    post,
    path = "/xbox/titles",
    tag = "xbox",
    request_body = XboxTitlesRequest,
    responses(
        (status = 200, description = "Title history", body = XboxTitleList),
        (status = 400, description = "Missing credentials"),
        (status = 500, description = "Upstream failure"),
    )
)]
pub async fn titles(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<XboxTitlesRequest>>,
) -> Result<Json<XboxTitleList>, AppError> {
    Ok(Json(xbox_service::titles(&state, &payload).await?))
}
