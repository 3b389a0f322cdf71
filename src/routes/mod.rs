use axum::Router;

use crate::state::SharedState;

pub mod auth;
pub mod bearer;
pub mod catalog;
pub mod docs;
pub mod health;
pub mod trophies;
pub mod user;
pub mod xbox;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router())
        .merge(trophies::router())
        .merge(user::router())
        .merge(xbox::router())
        .merge(catalog::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
