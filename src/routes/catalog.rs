use axum::{Json, Router, extract::State, routing::get};
use serde_json::Value;

use crate::{services::catalog_service, state::SharedState};

/// Shared catalog endpoint.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/games", get(list_games))
}

/// Full catalog; an empty array whenever the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "catalog",
    responses((status = 200, description = "Catalog documents", body = [crate::engine::model::CatalogEntry]))
)]
pub async fn list_games(State(state): State<SharedState>) -> Json<Vec<Value>> {
    Json(catalog_service::list_games(&state).await)
}
