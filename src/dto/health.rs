use serde::Serialize;
use utoipa::ToSchema;

/// Catalog availability as seen by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// No catalog store; `/api/games` answers an empty list.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub catalog_store: bool,
}

impl HealthResponse {
    pub fn new(catalog_store: bool) -> Self {
        let status = if catalog_store {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            catalog_store,
        }
    }
}
