//! On-device key/value persistence for credentials and the owned-record cache.

use std::sync::Arc;

use dashmap::DashMap;
use futures::{FutureExt, future::BoxFuture};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{engine::model::OwnedRecords, upstream::psn::TokenPair};

use super::refresh::SessionHooks;

pub const ACCESS_TOKEN_KEY: &str = "psn_access_token";
pub const REFRESH_TOKEN_KEY: &str = "psn_refresh_token";
pub const EXPIRES_AT_KEY: &str = "psn_expires_at";
pub const ACCOUNT_ID_KEY: &str = "psn_account_id";
pub const ONLINE_ID_KEY: &str = "psn_online_id";
pub const AVATAR_URL_KEY: &str = "psn_avatar_url";
pub const OWNED_CACHE_KEY: &str = "owned_records_cache";

/// Every key the session writes; removed together on logout.
pub const SESSION_KEYS: [&str; 7] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    EXPIRES_AT_KEY,
    ACCOUNT_ID_KEY,
    ONLINE_ID_KEY,
    AVATAR_URL_KEY,
    OWNED_CACHE_KEY,
];

/// Tokens expiring sooner than this are refreshed before first use.
pub const REFRESH_MARGIN: Duration = Duration::minutes(5);

/// Failure reported by a [`CredentialStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("credential store failure: {0}")]
pub struct CredentialError(pub String);

/// Async key/value blob store.
pub trait CredentialStore: Send + Sync {
    /// Value under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CredentialError>>;
    /// Store `value` under `key`.
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), CredentialError>>;
    /// Remove every key in `keys`.
    fn remove<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), CredentialError>>;
}

/// Process-local [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, String>,
}

impl MemoryCredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CredentialError>> {
        let value = self.entries.get(key).map(|entry| entry.value().clone());
        async move { Ok(value) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), CredentialError>> {
        self.entries.insert(key.to_string(), value);
        async { Ok(()) }.boxed()
    }

    fn remove<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<(), CredentialError>> {
        for key in keys {
            self.entries.remove(*key);
        }
        async { Ok(()) }.boxed()
    }
}

/// Profile data kept next to the tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_id: String,
    pub online_id: Option<String>,
    pub avatar_url: Option<String>,
}

/// Session read back from the store at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<OffsetDateTime>,
    pub account: AccountInfo,
}

impl StoredSession {
    /// Whether the access token expires within [`REFRESH_MARGIN`] of `now`.
    /// Unknown expiry counts as expiring.
    pub fn needs_refresh(&self, now: OffsetDateTime) -> bool {
        self.expires_at
            .is_none_or(|expires_at| expires_at - now <= REFRESH_MARGIN)
    }

    /// Held tokens as a pair.
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_in: self
                .expires_at
                .map(|at| (at - OffsetDateTime::now_utc()).whole_seconds().max(0) as u64)
                .unwrap_or(0),
        }
    }
}

/// Typed access to the session keys. Every store failure reads as "no value".
#[derive(Clone)]
pub struct SessionVault {
    store: Arc<dyn CredentialStore>,
}

impl SessionVault {
    /// Wrap a store.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value.filter(|value| !value.is_empty()),
            Err(err) => {
                warn!(%key, error = %err, "credential read failed; treating as empty");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: String) {
        if let Err(err) = self.store.set(key, value).await {
            warn!(%key, error = %err, "credential write failed");
        }
    }

    /// Stored session, if tokens and account id are all present.
    pub async fn load_session(&self) -> Option<StoredSession> {
        let access_token = self.read(ACCESS_TOKEN_KEY).await?;
        let refresh_token = self.read(REFRESH_TOKEN_KEY).await?;
        let account_id = self.read(ACCOUNT_ID_KEY).await?;
        let expires_at = self
            .read(EXPIRES_AT_KEY)
            .await
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());
        Some(StoredSession {
            access_token,
            refresh_token,
            expires_at,
            account: AccountInfo {
                account_id,
                online_id: self.read(ONLINE_ID_KEY).await,
                avatar_url: self.read(AVATAR_URL_KEY).await,
            },
        })
    }

    /// Persist a token pair, turning its lifetime into an absolute expiry.
    pub async fn save_tokens(&self, tokens: &TokenPair) {
        let expires_at = OffsetDateTime::now_utc() + Duration::seconds(tokens.expires_in as i64);
        self.write(ACCESS_TOKEN_KEY, tokens.access_token.clone()).await;
        self.write(REFRESH_TOKEN_KEY, tokens.refresh_token.clone()).await;
        self.write(EXPIRES_AT_KEY, expires_at.unix_timestamp().to_string())
            .await;
    }

    /// Persist profile fields.
    pub async fn save_account(&self, account: &AccountInfo) {
        self.write(ACCOUNT_ID_KEY, account.account_id.clone()).await;
        if let Some(online_id) = &account.online_id {
            self.write(ONLINE_ID_KEY, online_id.clone()).await;
        }
        if let Some(avatar_url) = &account.avatar_url {
            self.write(AVATAR_URL_KEY, avatar_url.clone()).await;
        }
    }

    /// Cached owned records for cold-start hydration.
    pub async fn load_owned(&self) -> Option<OwnedRecords> {
        let raw = self.read(OWNED_CACHE_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(err) => {
                warn!(error = %err, "owned-record cache is corrupt; ignoring it");
                None
            }
        }
    }

    /// Replace the owned-record cache.
    pub async fn save_owned(&self, records: &OwnedRecords) {
        match serde_json::to_string(records) {
            Ok(blob) => self.write(OWNED_CACHE_KEY, blob).await,
            Err(err) => warn!(error = %err, "failed to serialize owned records"),
        }
    }

    /// Remove every session key.
    pub async fn clear(&self) {
        if let Err(err) = self.store.remove(&SESSION_KEYS).await {
            warn!(error = %err, "failed to clear session keys");
        }
        debug!("session keys cleared");
    }
}

impl SessionHooks for SessionVault {
    fn tokens_updated<'a>(&'a self, tokens: &'a TokenPair) -> BoxFuture<'a, ()> {
        self.save_tokens(tokens).boxed()
    }

    fn logged_out(&self) -> BoxFuture<'_, ()> {
        self.clear().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn get<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<Option<String>, CredentialError>> {
            async { Err(CredentialError("disk gone".into())) }.boxed()
        }

        fn set<'a>(&'a self, _: &'a str, _: String) -> BoxFuture<'a, Result<(), CredentialError>> {
            async { Err(CredentialError("disk gone".into())) }.boxed()
        }

        fn remove<'a>(&'a self, _: &'a [&'a str]) -> BoxFuture<'a, Result<(), CredentialError>> {
            async { Err(CredentialError("disk gone".into())) }.boxed()
        }
    }

    fn pair(expires_in: u64) -> TokenPair {
        TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in,
        }
    }

    #[tokio::test]
    async fn round_trips_a_session() {
        let vault = SessionVault::new(Arc::new(MemoryCredentialStore::new()));
        assert!(vault.load_session().await.is_none());

        vault.save_tokens(&pair(3600)).await;
        vault
            .save_account(&AccountInfo {
                account_id: "acct".into(),
                online_id: Some("Player".into()),
                avatar_url: None,
            })
            .await;
        let session = vault.load_session().await.unwrap();
        assert_eq!(session.account.online_id.as_deref(), Some("Player"));
        assert!(!session.needs_refresh(OffsetDateTime::now_utc()));

        vault.clear().await;
        assert!(vault.load_session().await.is_none());
    }

    #[tokio::test]
    async fn near_expiry_tokens_need_refresh() {
        let vault = SessionVault::new(Arc::new(MemoryCredentialStore::new()));
        vault.save_tokens(&pair(120)).await;
        vault
            .save_account(&AccountInfo {
                account_id: "acct".into(),
                ..AccountInfo::default()
            })
            .await;
        let session = vault.load_session().await.unwrap();
        assert!(session.needs_refresh(OffsetDateTime::now_utc()));
    }

    #[tokio::test]
    async fn broken_store_reads_as_empty() {
        let vault = SessionVault::new(Arc::new(BrokenStore));
        vault.save_tokens(&pair(10)).await;
        assert!(vault.load_session().await.is_none());
        assert!(vault.load_owned().await.is_none());
        vault.clear().await;
    }

    #[tokio::test]
    async fn owned_cache_survives_round_trip_and_ignores_garbage() {
        let store = Arc::new(MemoryCredentialStore::new());
        let vault = SessionVault::new(store.clone());
        let records = OwnedRecords {
            tiered: vec![Default::default()],
            flat: Vec::new(),
        };
        vault.save_owned(&records).await;
        assert_eq!(vault.load_owned().await, Some(records));

        store.set(OWNED_CACHE_KEY, "{not json".into()).await.unwrap();
        assert!(vault.load_owned().await.is_none());
    }
}
