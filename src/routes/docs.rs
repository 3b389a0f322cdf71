use axum::Router;
use utoipa::{OpenApi, openapi::OpenApi as OpenApiDocument};
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the Swagger UI is mounted.
pub const UI_PATH: &str = "/docs";
/// Where the raw OpenAPI JSON is served.
pub const DOCUMENT_PATH: &str = "/api-doc/openapi.json";

fn document() -> OpenApiDocument {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "Trophy Hub proxy".to_owned();
    doc.info.description =
        Some("PSN trophy and Xbox achievement proxy with the shared game catalog.".to_owned());
    doc
}

/// Swagger UI for the trophy, Xbox and catalog routes.
pub fn router(state: SharedState) -> Router<SharedState> {
    let ui: Router<SharedState> = SwaggerUi::new(UI_PATH).url(DOCUMENT_PATH, document()).into();

    ui.with_state(state)
}
