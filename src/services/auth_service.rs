//! Console network sign-in proxied for clients that cannot hold the OAuth client secret.

use tracing::{info, warn};

use crate::{
    error::ServiceError,
    state::SharedState,
    upstream::psn::{PsnSession, TokenPair},
};

/// Exchange an NPSSO cookie for tokens and the account identity.
pub async fn exchange_npsso(state: &SharedState, npsso: &str) -> Result<PsnSession, ServiceError> {
    match state.psn().exchange_npsso(npsso.trim()).await {
        Ok(session) => {
            info!(account_id = %session.account_id, "signed in");
            Ok(session)
        }
        Err(err) => {
            warn!(error = %err, "npsso exchange failed");
            Err(ServiceError::AuthenticationFailed(err))
        }
    }
}

/// Rotate both tokens. Every failure reads as an expired session.
pub async fn refresh(state: &SharedState, refresh_token: &str) -> Result<TokenPair, ServiceError> {
    state.psn().refresh(refresh_token).await.map_err(|err| {
        info!(error = %err, "refresh rejected");
        ServiceError::SessionExpired
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::test_support::state_with,
        upstream::{FetchResponse, test_support::FakeFetch},
    };
    use reqwest::StatusCode;

    #[tokio::test]
    async fn refresh_failure_is_session_expired() {
        let fake = FakeFetch::new(|request| {
            FetchResponse::new(&request.url, StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#)
        });
        let state = state_with(&fake);
        let err = refresh(&state, "stale").await.unwrap_err();
        assert!(matches!(err, ServiceError::SessionExpired));
    }

    #[tokio::test]
    async fn refresh_returns_rotated_pair() {
        let fake = FakeFetch::new(|request| {
            FetchResponse::new(
                &request.url,
                StatusCode::OK,
                r#"{"access_token":"a-2","refresh_token":"r-2","expires_in":3600}"#,
            )
        });
        let state = state_with(&fake);
        let tokens = refresh(&state, "r-1").await.unwrap();
        assert_eq!(tokens.access_token, "a-2");
        assert_eq!(tokens.refresh_token, "r-2");
    }

    #[tokio::test]
    async fn npsso_failure_is_authentication_failed() {
        let fake = FakeFetch::new(|request| {
            FetchResponse::new(&request.url, StatusCode::INTERNAL_SERVER_ERROR, "")
        });
        let state = state_with(&fake);
        let err = exchange_npsso(&state, "cookie").await.unwrap_err();
        assert!(matches!(err, ServiceError::AuthenticationFailed(_)));
    }
}
