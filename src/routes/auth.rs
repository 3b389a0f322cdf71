use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::auth::{NpssoRequest, RefreshRequest},
    error::AppError,
    services::auth_service,
    state::SharedState,
    upstream::psn::{PsnSession, TokenPair},
};

/// Console network sign-in endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/npsso", post(npsso))
        .route("/api/auth/refresh", post(refresh))
}

/// Exchange an NPSSO cookie for tokens, account id and profile basics.
#[utoipa::path(
    post,
    path = "/api/auth/npsso",
    tag = "auth",
    request_body = NpssoRequest,
    responses(
        (status = 200, description = "Signed in", body = PsnSession),
        (status = 400, description = "NPSSO token required"),
        (status = 500, description = "Authentication Failed"),
    )
)]
pub async fn npsso(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<NpssoRequest>>,
) -> Result<Json<PsnSession>, AppError> {
    Ok(Json(auth_service::exchange_npsso(&state, &payload.npsso).await?))
}

/// Rotate the access and refresh tokens.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 400, description = "Refresh token required"),
        (status = 401, description = "Session Expired"),
    )
)]
pub async fn refresh(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RefreshRequest>>,
) -> Result<Json<TokenPair>, AppError> {
    Ok(Json(auth_service::refresh(&state, &payload.refresh_token).await?))
}
