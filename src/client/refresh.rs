//! Authenticated proxy client with single-flight token refresh.
//!
//! Every call carries the current bearer token. A 401 triggers at most one
//! refresh across all concurrent callers; each caller then retries its own
//! request exactly once with the rotated token.

use std::sync::Arc;

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::upstream::{
    FetchRequest, FetchResponse, HttpFetch, UpstreamError, UpstreamResult, psn::TokenPair,
};

/// Why a refresh attempt failed. Cloneable so every waiter sees the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token is held")]
    MissingRefreshToken,
    #[error("refresh rejected with status {0}")]
    Rejected(u16),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Side effects of token rotation. Each runs once per refresh, not once per waiter.
pub trait SessionHooks: Send + Sync {
    /// Persist freshly rotated tokens.
    fn tokens_updated<'a>(&'a self, tokens: &'a TokenPair) -> BoxFuture<'a, ()>;
    /// The refresh token was refused; the session is over.
    fn logged_out(&self) -> BoxFuture<'_, ()>;
}

type RefreshFlight = Shared<BoxFuture<'static, Result<TokenPair, RefreshError>>>;

/// Client for the trophy proxy.
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpFetch>,
    base_url: String,
    tokens: Arc<RwLock<Option<TokenPair>>>,
    in_flight: Arc<Mutex<Option<RefreshFlight>>>,
    hooks: Arc<dyn SessionHooks>,
}

impl ApiClient {
    /// Client for the proxy rooted at `base_url`.
    pub fn new(
        http: Arc<dyn HttpFetch>,
        base_url: impl Into<String>,
        hooks: Arc<dyn SessionHooks>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(Mutex::new(None)),
            hooks,
        }
    }

    /// Absolute URL for a proxy path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Replace the held tokens without running hooks.
    pub async fn set_tokens(&self, tokens: Option<TokenPair>) {
        *self.tokens.write().await = tokens;
    }

    /// Currently held tokens.
    pub async fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().await.clone()
    }

    /// Currently held access token.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    /// Unauthenticated request against the proxy.
    pub async fn send_anonymous(&self, request: FetchRequest) -> UpstreamResult<FetchResponse> {
        self.http.fetch(request).await
    }

    /// Send `request` with the bearer token, refreshing once on 401.
    ///
    /// When the refresh fails the original 401 response is returned.
    pub async fn send(&self, request: FetchRequest) -> UpstreamResult<FetchResponse> {
        let used = self.access_token().await;
        let response = self
            .http
            .fetch(authorize(request.clone(), used.as_deref()))
            .await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Another caller may already have rotated the token.
        let current = self.access_token().await;
        let fresh = match current {
            Some(token) if used.as_deref() != Some(token.as_str()) => token,
            _ => match self.refresh_single_flight().await {
                Ok(tokens) => tokens.access_token,
                Err(err) => {
                    debug!(url = %request.url, error = %err, "refresh failed; returning original response");
                    return Ok(response);
                }
            },
        };
        self.http.fetch(authorize(request, Some(&fresh))).await
    }

    /// Authenticated GET decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> UpstreamResult<T> {
        self.send(FetchRequest::get(self.url(path)))
            .await?
            .error_for_status()?
            .json()
    }

    /// Force a refresh, joining one already in flight.
    pub async fn refresh_now(&self) -> Result<TokenPair, RefreshError> {
        self.refresh_single_flight().await
    }

    async fn refresh_single_flight(&self) -> Result<TokenPair, RefreshError> {
        let flight = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    let flight = self.start_refresh().shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        let outcome = flight.clone().await;

        let mut slot = self.in_flight.lock().await;
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&flight))
        {
            *slot = None;
        }
        outcome
    }

    fn start_refresh(&self) -> BoxFuture<'static, Result<TokenPair, RefreshError>> {
        let http = self.http.clone();
        let url = self.url("/api/auth/refresh");
        let tokens = self.tokens.clone();
        let hooks = self.hooks.clone();
        async move {
            let refresh_token = tokens
                .read()
                .await
                .as_ref()
                .map(|held| held.refresh_token.clone())
                .filter(|token| !token.is_empty());
            let outcome = match refresh_token {
                Some(refresh_token) => request_refresh(http.as_ref(), &url, &refresh_token).await,
                None => Err(RefreshError::MissingRefreshToken),
            };
            match &outcome {
                Ok(rotated) => {
                    *tokens.write().await = Some(rotated.clone());
                    hooks.tokens_updated(rotated).await;
                    info!("access token refreshed");
                }
                Err(err) => {
                    warn!(error = %err, "token refresh failed; logging out");
                    *tokens.write().await = None;
                    hooks.logged_out().await;
                }
            }
            outcome
        }
        .boxed()
    }
}

fn authorize(request: FetchRequest, token: Option<&str>) -> FetchRequest {
    match token {
        Some(token) => request.bearer(token),
        None => request,
    }
}

async fn request_refresh(
    http: &dyn HttpFetch,
    url: &str,
    refresh_token: &str,
) -> Result<TokenPair, RefreshError> {
    let response = http
        .fetch(FetchRequest::post(url).json(json!({ "refreshToken": refresh_token })))
        .await?;
    if !response.is_ok() {
        return Err(RefreshError::Rejected(response.status.as_u16()));
    }
    let mut rotated: TokenPair = response.json()?;
    if rotated.refresh_token.is_empty() {
        rotated.refresh_token = refresh_token.to_string();
    }
    Ok(rotated)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    #[derive(Default)]
    pub(crate) struct CountingHooks {
        pub updated: AtomicUsize,
        pub logged_out: AtomicUsize,
    }

    impl SessionHooks for CountingHooks {
        fn tokens_updated<'a>(&'a self, _: &'a TokenPair) -> BoxFuture<'a, ()> {
            self.updated.fetch_add(1, Ordering::SeqCst);
            async {}.boxed()
        }

        fn logged_out(&self) -> BoxFuture<'_, ()> {
            self.logged_out.fetch_add(1, Ordering::SeqCst);
            async {}.boxed()
        }
    }

    /// Accepts only `Bearer fresh`; the refresh endpoint answers after a delay.
    struct ExpiringProxy {
        refresh_calls: AtomicUsize,
        data_calls: AtomicUsize,
        refresh_status: StatusCode,
    }

    impl ExpiringProxy {
        fn new(refresh_status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                refresh_calls: AtomicUsize::new(0),
                data_calls: AtomicUsize::new(0),
                refresh_status,
            })
        }
    }

    impl HttpFetch for ExpiringProxy {
        fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, UpstreamResult<FetchResponse>> {
            async move {
                if request.url.ends_with("/api/auth/refresh") {
                    self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let body = json!({"accessToken": "fresh", "refreshToken": "", "expiresIn": 3600});
                    return Ok(FetchResponse::new(request.url, self.refresh_status, body.to_string()));
                }
                self.data_calls.fetch_add(1, Ordering::SeqCst);
                let status = if request.header_value("authorization") == Some("Bearer fresh") {
                    StatusCode::OK
                } else {
                    StatusCode::UNAUTHORIZED
                };
                Ok(FetchResponse::new(request.url, status, r#"{"ok":true}"#))
            }
            .boxed()
        }
    }

    fn stale_tokens() -> TokenPair {
        TokenPair {
            access_token: "stale".into(),
            refresh_token: "refresh-1".into(),
            expires_in: 0,
        }
    }

    #[tokio::test]
    async fn concurrent_expiry_refreshes_once() {
        let proxy = ExpiringProxy::new(StatusCode::OK);
        let hooks = Arc::new(CountingHooks::default());
        let client = ApiClient::new(proxy.clone(), "http://proxy/", hooks.clone());
        client.set_tokens(Some(stale_tokens())).await;

        let calls = (0..5).map(|i| client.send(FetchRequest::get(client.url(&format!("/api/x/{i}")))));
        let responses = futures::future::join_all(calls).await;

        assert!(responses.iter().all(|r| r.as_ref().unwrap().status == StatusCode::OK));
        assert_eq!(proxy.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(proxy.data_calls.load(Ordering::SeqCst), 10);
        assert_eq!(hooks.updated.load(Ordering::SeqCst), 1);

        let held = client.tokens().await.unwrap();
        assert_eq!(held.access_token, "fresh");
        // An empty rotated refresh token keeps the previous one.
        assert_eq!(held.refresh_token, "refresh-1");
    }

    #[tokio::test]
    async fn rejected_refresh_logs_out_and_returns_original_401() {
        let proxy = ExpiringProxy::new(StatusCode::UNAUTHORIZED);
        let hooks = Arc::new(CountingHooks::default());
        let client = ApiClient::new(proxy.clone(), "http://proxy", hooks.clone());
        client.set_tokens(Some(stale_tokens())).await;

        let (a, b) = tokio::join!(
            client.send(FetchRequest::get(client.url("a"))),
            client.send(FetchRequest::get(client.url("b")))
        );
        assert_eq!(a.unwrap().status, StatusCode::UNAUTHORIZED);
        assert_eq!(b.unwrap().status, StatusCode::UNAUTHORIZED);
        assert_eq!(proxy.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.logged_out.load(Ordering::SeqCst), 1);
        assert!(client.tokens().await.is_none());
    }

    #[tokio::test]
    async fn missing_refresh_token_skips_network() {
        let proxy = ExpiringProxy::new(StatusCode::OK);
        let hooks = Arc::new(CountingHooks::default());
        let client = ApiClient::new(proxy.clone(), "http://proxy", hooks.clone());

        let err = client.get_json::<serde_json::Value>("/api/trophies/1").await.unwrap_err();
        assert!(err.is_auth_expired());
        assert_eq!(proxy.refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.logged_out.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_rotated_token_is_reused_without_refresh() {
        let proxy = ExpiringProxy::new(StatusCode::OK);
        let hooks = Arc::new(CountingHooks::default());
        let client = ApiClient::new(proxy.clone(), "http://proxy", hooks);
        client
            .set_tokens(Some(TokenPair {
                access_token: "fresh".into(),
                ..stale_tokens()
            }))
            .await;

        let response = client.send(FetchRequest::get(client.url("a"))).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(proxy.refresh_calls.load(Ordering::SeqCst), 0);
    }
}
