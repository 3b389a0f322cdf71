//! Console network reads on behalf of a bearer-authenticated client.

use serde_json::Value;
use tracing::debug;

use crate::{
    dto::trophies::{DetailQuery, TitleDetailResponse},
    error::ServiceError,
    state::SharedState,
    upstream::psn::{TitleLibrary, TrophySummary},
};

/// Every owned trophy title with artwork.
pub async fn title_library(
    state: &SharedState,
    account_id: &str,
    access_token: &str,
) -> Result<TitleLibrary, ServiceError> {
    Ok(state.psn().title_library(account_id, access_token).await?)
}

/// Merged trophies and groups for one title, tagged with the request's hints.
pub async fn title_detail(
    state: &SharedState,
    account_id: &str,
    np_communication_id: &str,
    query: DetailQuery,
    access_token: &str,
) -> Result<TitleDetailResponse, ServiceError> {
    let detail = state
        .psn()
        .title_detail(account_id, np_communication_id, access_token)
        .await?;
    debug!(
        %account_id,
        %np_communication_id,
        trophies = detail.trophies.len(),
        groups = detail.groups.len(),
        "title detail merged"
    );
    Ok(TitleDetailResponse::new(np_communication_id, query, detail))
}

pub async fn summary(
    state: &SharedState,
    account_id: &str,
    access_token: &str,
) -> Result<TrophySummary, ServiceError> {
    Ok(state.psn().trophy_summary(account_id, access_token).await?)
}

pub async fn profile(
    state: &SharedState,
    account_id: &str,
    access_token: &str,
) -> Result<Value, ServiceError> {
    Ok(state.psn().profile(account_id, access_token).await?)
}
