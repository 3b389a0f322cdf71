/// NPSSO login and token rotation.
pub mod auth_service;
/// Shared catalog listing.
pub mod catalog_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Catalog store connection supervisor.
pub mod storage_supervisor;
/// Owned titles, per-title detail, summary and profile.
pub mod trophy_service;
/// Xbox Live sign-in and title history.
pub mod xbox_service;
