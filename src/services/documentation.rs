use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trophy Hub Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::npsso,
        crate::routes::auth::refresh,
        crate::routes::trophies::title_library,
        crate::routes::trophies::title_detail,
        crate::routes::user::summary,
        crate::routes::user::profile,
        crate::routes::xbox::exchange,
        crate::routes::xbox::titles,
        crate::routes::catalog::list_games,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::auth::NpssoRequest,
            crate::dto::auth::RefreshRequest,
            crate::dto::trophies::DetailMeta,
            crate::dto::trophies::TitleDetailResponse,
            crate::dto::xbox::XboxExchangeRequest,
            crate::dto::xbox::XboxTitlesRequest,
            crate::upstream::psn::PsnSession,
            crate::upstream::psn::TokenPair,
            crate::upstream::psn::TitleLibrary,
            crate::upstream::psn::TrophySummary,
            crate::upstream::xbox::XboxSession,
            crate::upstream::xbox::XboxTitleList,
            crate::engine::model::CatalogEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Console network sign-in and token rotation"),
        (name = "trophies", description = "Owned titles and per-title trophy detail"),
        (name = "user", description = "Account summary and profile"),
        (name = "xbox", description = "Xbox Live sign-in and title history"),
        (name = "catalog", description = "Shared game catalog"),
    )
)]
pub struct ApiDoc;
