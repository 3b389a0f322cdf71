use tracing::{info, warn};

use crate::{
    dto::xbox::{XboxExchangeRequest, XboxTitlesRequest},
    error::ServiceError,
    state::SharedState,
    upstream::xbox::{XboxSession, XboxTitleList},
};

/// OAuth code -> XBL -> XSTS -> profile.
pub async fn exchange(
    state: &SharedState,
    request: &XboxExchangeRequest,
) -> Result<XboxSession, ServiceError> {
    let session = state
        .xbox()
        .exchange(&request.code, &request.redirect_uri, &request.code_verifier)
        .await
        .map_err(|err| {
            warn!(error = %err, "xbox exchange failed");
            ServiceError::AuthenticationFailed(err)
        })?;
    info!(xuid = %session.xuid, gamertag = %session.gamertag, "xbox linked");
    Ok(session)
}

/// Title history for the signed-in user.
pub async fn titles(
    state: &SharedState,
    request: &XboxTitlesRequest,
) -> Result<XboxTitleList, ServiceError> {
    state
        .xbox()
        .titles(&request.xuid, &request.xsts_token, &request.user_hash)
        .await
        .map_err(|err| {
            warn!(xuid = %request.xuid, error = %err, "xbox titles failed");
            ServiceError::from(err)
        })
}
