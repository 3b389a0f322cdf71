use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::trophies::{DetailQuery, TitleDetailResponse},
    error::AppError,
    routes::bearer::BearerToken,
    services::trophy_service,
    state::SharedState,
    upstream::psn::TitleLibrary,
};

/// Owned title list and per-title detail.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/trophies/{account_id}", get(title_library))
        .route(
            "/api/trophies/{account_id}/{np_communication_id}",
            get(title_detail),
        )
}

/// Every owned trophy title, with artwork from the game list.
#[utoipa::path(
    get,
    path = "/api/trophies/{account_id}",
    tag = "trophies",
    params(
        ("account_id" = String, Path, description = "Account id, or `me`"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Owned titles", body = TitleLibrary),
        (status = 401, description = "Token Expired"),
    )
)]
pub async fn title_library(
    State(state): State<SharedState>,
    Path(account_id): Path<String>,
    BearerToken(token): BearerToken,
) -> Result<Json<TitleLibrary>, AppError> {
    Ok(Json(
        trophy_service::title_library(&state, &account_id, &token).await?,
    ))
}

/// Progress, definitions and groups for one title, merged.
#[utoipa::path(
    get,
    path = "/api/trophies/{account_id}/{np_communication_id}",
    tag = "trophies",
    params(
        ("account_id" = String, Path, description = "Account id, or `me`"),
        ("np_communication_id" = String, Path, description = "Trophy set id"),
        ("Authorization" = String, Header, description = "Bearer access token"),
        DetailQuery,
    ),
    responses(
        (status = 200, description = "Merged detail", body = TitleDetailResponse),
        (status = 401, description = "Token Expired"),
    )
)]
pub async fn title_detail(
    State(state): State<SharedState>,
    Path((account_id, np_communication_id)): Path<(String, String)>,
    Query(query): Query<DetailQuery>,
    BearerToken(token): BearerToken,
) -> Result<Json<TitleDetailResponse>, AppError> {
    Ok(Json(
        trophy_service::title_detail(&state, &account_id, &np_communication_id, query, &token)
            .await?,
    ))
}
