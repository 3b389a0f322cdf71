//! Signed-in trophy session: owned records, catalog, refresh and detail loading.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::{
    engine::{
        CatalogIndex, CatalogIndexCache, Identification, LibraryOptions, LibraryRow, aggregate,
        catalog_index::parse_entries,
        group, identify,
        model::{CatalogEntry, GameSource, OwnedRecords, PsnTitle, Trophy, TrophyGroup, XboxTitle},
        stats::{UserStats, user_stats},
        trophies::{TrophySource, select_source},
    },
    upstream::{
        FetchRequest, HttpFetch, UpstreamError, UpstreamResult,
        psn::{PsnSession, TitleDetail, TitleLibrary},
        xbox::{XboxSession, XboxTitleList},
    },
};

use super::{
    ClientConfig,
    credentials::{AccountInfo, CredentialStore, SessionVault},
    detail::{DetailLoader, DetailOutcome},
    refresh::ApiClient,
    watchdog::{AppActivity, DetectionHandler, WatchdogDeps, WatchdogSupervisor},
};

/// Capacity of the change broadcast; slow subscribers skip ahead.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Everything the detail screen needs for one title.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDetail {
    pub identification: Identification,
    pub source: TrophySource,
    pub trophies: Vec<Trophy>,
    pub groups: Option<Vec<TrophyGroup>>,
}

/// Client-side state for one signed-in user.
pub struct TrophySession {
    api: ApiClient,
    vault: SessionVault,
    account: RwLock<Option<AccountInfo>>,
    xbox: RwLock<Option<XboxSession>>,
    owned: RwLock<Arc<OwnedRecords>>,
    catalog: RwLock<Arc<Vec<CatalogEntry>>>,
    index_cache: Mutex<CatalogIndexCache>,
    ready: AtomicBool,
    refresh_lock: Mutex<()>,
    refreshing: watch::Sender<bool>,
    changes: broadcast::Sender<Arc<BTreeSet<String>>>,
    watchdog: Mutex<WatchdogSupervisor>,
    detail: DetailLoader,
}

impl TrophySession {
    /// Build a signed-out session talking to the proxy in `config`.
    pub fn new(
        config: &ClientConfig,
        http: Arc<dyn HttpFetch>,
        store: Arc<dyn CredentialStore>,
        activity: watch::Receiver<AppActivity>,
    ) -> Arc<Self> {
        let vault = SessionVault::new(store);
        let api = ApiClient::new(http, config.proxy_base_url.clone(), Arc::new(vault.clone()));
        let interval = config.watchdog_interval;
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let on_detect: DetectionHandler = Arc::new(move |_, _| {
                let Some(session) = weak.upgrade() else {
                    return;
                };
                tokio::spawn(async move {
                    if let Err(err) = session.refresh().await {
                        warn!(error = %err, "refresh after trophy detection failed");
                    }
                });
            });
            let watchdog =
                WatchdogSupervisor::new(Arc::new(api.clone()), interval, activity, on_detect);
            Self {
                api,
                vault,
                account: RwLock::new(None),
                xbox: RwLock::new(None),
                owned: RwLock::new(Arc::new(OwnedRecords::default())),
                catalog: RwLock::new(Arc::new(Vec::new())),
                index_cache: Mutex::new(CatalogIndexCache::new()),
                ready: AtomicBool::new(false),
                refresh_lock: Mutex::new(()),
                refreshing: watch::Sender::new(false),
                changes: broadcast::Sender::new(CHANGE_CHANNEL_CAPACITY),
                watchdog: Mutex::new(watchdog),
                detail: DetailLoader::new(),
            }
        })
    }

    /// Proxy client carrying this session's tokens.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restore a persisted session. Tokens near expiry are refreshed first.
    ///
    /// Returns whether a usable session was restored.
    pub async fn bootstrap(&self) -> bool {
        let Some(stored) = self.vault.load_session().await else {
            debug!("no stored session");
            return false;
        };
        self.api.set_tokens(Some(stored.tokens())).await;
        if stored.needs_refresh(time::OffsetDateTime::now_utc()) {
            info!("stored token is near expiry; refreshing before use");
            if let Err(err) = self.api.refresh_now().await {
                warn!(error = %err, "stored session could not be refreshed");
                self.reset_state().await;
                return false;
            }
        }
        *self.account.write().await = Some(stored.account);
        if let Some(records) = self.vault.load_owned().await {
            *self.owned.write().await = Arc::new(records);
        }
        true
    }

    /// Exchange an NPSSO value for a session and persist it.
    pub async fn login_with_npsso(&self, npsso: &str) -> UpstreamResult<AccountInfo> {
        let request = FetchRequest::post(self.api.url("/api/auth/npsso")).json(json!({ "npsso": npsso }));
        let session: PsnSession = self
            .api
            .send_anonymous(request)
            .await?
            .error_for_status()?
            .json()?;
        let account = AccountInfo {
            account_id: session.account_id,
            online_id: session.online_id,
            avatar_url: session.avatar_url,
        };
        self.vault.save_tokens(&session.tokens).await;
        self.vault.save_account(&account).await;
        self.api.set_tokens(Some(session.tokens)).await;
        *self.account.write().await = Some(account.clone());
        info!(account_id = %account.account_id, "signed in");
        Ok(account)
    }

    /// Exchange a Microsoft OAuth code and keep the Xbox session in memory.
    pub async fn link_xbox(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> UpstreamResult<XboxSession> {
        let request = FetchRequest::post(self.api.url("/xbox/exchange")).json(json!({
            "code": code,
            "redirectUri": redirect_uri,
            "codeVerifier": code_verifier,
        }));
        let session: XboxSession = self
            .api
            .send_anonymous(request)
            .await?
            .error_for_status()?
            .json()?;
        *self.xbox.write().await = Some(session.clone());
        Ok(session)
    }

    /// Clear credentials, caches and the watchdog.
    pub async fn logout(&self) {
        self.vault.clear().await;
        self.reset_state().await;
        info!("signed out");
    }

    async fn reset_state(&self) {
        self.api.set_tokens(None).await;
        *self.account.write().await = None;
        *self.xbox.write().await = None;
        *self.owned.write().await = Arc::new(OwnedRecords::default());
        self.ready.store(false, Ordering::SeqCst);
        self.detail.clear().await;
        self.watchdog.lock().await.stop();
    }

    /// Signed-in account, if any.
    pub async fn account(&self) -> Option<AccountInfo> {
        self.account.read().await.clone()
    }

    /// Snapshot of the owned records.
    pub async fn owned(&self) -> Arc<OwnedRecords> {
        self.owned.read().await.clone()
    }

    /// Load the catalog. Failures keep the previous catalog.
    pub async fn load_catalog(&self) -> usize {
        let fetched = async {
            self.api
                .send_anonymous(FetchRequest::get(self.api.url("/api/games")))
                .await?
                .error_for_status()?
                .json::<Vec<Value>>()
        }
        .await;
        match fetched {
            Ok(documents) => {
                let entries = parse_entries(documents);
                let count = entries.len();
                *self.catalog.write().await = Arc::new(entries);
                info!(entries = count, "catalog loaded");
                count
            }
            Err(err) => {
                warn!(error = %err, "catalog unavailable; keeping previous entries");
                self.catalog.read().await.len()
            }
        }
    }

    /// Index over the current catalog, rebuilt only when the catalog changed.
    pub async fn index(&self) -> Arc<CatalogIndex> {
        let catalog = self.catalog.read().await.clone();
        self.index_cache.lock().await.get(&catalog)
    }

    /// Whether a refresh is running.
    pub fn refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing.subscribe()
    }

    /// Ids of titles changed by each refresh.
    pub fn changes(&self) -> BroadcastStream<Arc<BTreeSet<String>>> {
        BroadcastStream::new(self.changes.subscribe())
    }

    /// Refetch owned records on both platforms and swap them in wholesale.
    ///
    /// Returns the ids whose progress changed.
    pub async fn refresh(&self) -> UpstreamResult<BTreeSet<String>> {
        let _serialized = self.refresh_lock.lock().await;
        let account_id = self
            .account
            .read()
            .await
            .as_ref()
            .map(|account| account.account_id.clone())
            .ok_or_else(|| UpstreamError::Rejected {
                reason: "not signed in".into(),
            })?;

        self.refreshing.send_replace(true);
        let outcome = self.fetch_owned(&account_id).await;
        self.refreshing.send_replace(false);
        let records = outcome?;

        let previous = self.owned.read().await.clone();
        let changed = changed_ids(&previous, &records);
        let stats = user_stats(&records.tiered);
        self.vault.save_owned(&records).await;
        *self.owned.write().await = Arc::new(records);
        self.ready.store(true, Ordering::SeqCst);

        self.watchdog.lock().await.override_baseline(stats.total).await;
        self.sync_watchdog().await;

        if !changed.is_empty() {
            info!(changed = changed.len(), "owned records updated");
            // No subscribers is fine.
            let _ = self.changes.send(Arc::new(changed.clone()));
        }
        Ok(changed)
    }

    async fn fetch_owned(&self, account_id: &str) -> UpstreamResult<OwnedRecords> {
        let library: TitleLibrary = self.api.get_json(&format!("/api/trophies/{account_id}")).await?;
        let xbox = self.xbox.read().await.clone();
        let flat = match xbox {
            Some(xbox) => match self.fetch_xbox_titles(&xbox).await {
                Ok(list) => list.titles,
                Err(err) => {
                    warn!(error = %err, "xbox titles unavailable; keeping previous list");
                    self.owned.read().await.flat.clone()
                }
            },
            None => Vec::new(),
        };
        Ok(OwnedRecords {
            tiered: library.trophy_titles,
            flat,
        })
    }

    async fn fetch_xbox_titles(&self, xbox: &XboxSession) -> UpstreamResult<XboxTitleList> {
        let request = FetchRequest::post(self.api.url("/xbox/titles")).json(json!({
            "xuid": xbox.xuid,
            "xstsToken": xbox.xsts_token,
            "userHash": xbox.user_hash,
        }));
        self.api
            .send_anonymous(request)
            .await?
            .error_for_status()?
            .json()
    }

    /// Start, restart or stop the watchdog to match the current session.
    pub async fn sync_watchdog(&self) -> bool {
        let deps = WatchdogDeps {
            access_token: self.api.access_token().await,
            account_id: self.account().await.map(|account| account.account_id),
            ready: self.ready.load(Ordering::SeqCst),
        };
        self.watchdog.lock().await.reconfigure(deps).await
    }

    /// Current watchdog baseline.
    pub async fn watchdog_baseline(&self) -> Option<u32> {
        self.watchdog.lock().await.baseline().await
    }

    /// Earned totals across owned tiered titles.
    pub async fn stats(&self) -> UserStats {
        user_stats(&self.owned.read().await.tiered)
    }

    /// Identify one title.
    pub async fn identify(&self, raw_id: &str) -> Identification {
        let index = self.index().await;
        let owned = self.owned().await;
        identify(raw_id, &index, &owned)
    }

    /// Library rows under `options`.
    pub async fn library(&self, options: &LibraryOptions) -> Vec<LibraryRow> {
        let index = self.index().await;
        let owned = self.owned().await;
        aggregate(&owned.tiered, &owned.flat, &index, options)
    }

    /// Trophies and groups for one title.
    ///
    /// An owned title that already carries its trophy list skips the network
    /// on first load and serves that list as live data. Returns `None` when a newer load superseded this one.
    pub async fn load_detail(&self, raw_id: &str, first_load: bool) -> Option<GameDetail> {
        let identification = self.identify(raw_id).await;
        let unified = identification.unified.as_ref();
        let catalog = identification.catalog_entry.as_ref();

        let has_local_list = unified.is_some_and(|game| {
            game.source == GameSource::User && !game.trophy_list.is_empty()
        });
        let account_id = self
            .account()
            .await
            .map(|account| account.account_id)
            .filter(|_| unified.is_some_and(|game| game.source != GameSource::Xbox));

        let fetched = if first_load && has_local_list {
            // Supersede any fetch still running for another title.
            self.detail.begin(raw_id).await;
            TitleDetail {
                trophies: unified
                    .map(|game| game.trophy_list.clone())
                    .unwrap_or_default(),
                groups: Vec::new(),
            }
        } else if let Some(account_id) = account_id {
            let url = self.detail_url(
                &account_id,
                raw_id,
                unified.map(|game| (game.title.as_str(), game.platform.as_str())),
            );
            match self.detail.load(raw_id, self.api.get_json::<TitleDetail>(&url)).await {
                DetailOutcome::Applied(detail) => detail,
                DetailOutcome::Stale => return None,
                DetailOutcome::Failed(err) => {
                    warn!(id = %raw_id, error = %err, "trophy detail unavailable; using fallback");
                    TitleDetail::default()
                }
            }
        } else {
            TitleDetail::default()
        };

        let (source, trophies) = select_source(&fetched.trophies, catalog, unified);
        let groups = group(
            Some(fetched.groups.as_slice()),
            catalog.and_then(|entry| entry.trophy_groups.as_deref()),
            &trophies,
        );
        Some(GameDetail {
            identification,
            source,
            trophies,
            groups,
        })
    }

    fn detail_url(&self, account_id: &str, raw_id: &str, hints: Option<(&str, &str)>) -> String {
        let path = self.api.url(&format!("/api/trophies/{account_id}/{raw_id}"));
        let Some((game_name, platform)) = hints else {
            return path;
        };
        reqwest::Url::parse_with_params(&path, [("gameName", game_name), ("platform", platform)])
            .map(String::from)
            .unwrap_or(path)
    }
}

/// Ids added or whose progress moved between two snapshots.
pub fn changed_ids(previous: &OwnedRecords, next: &OwnedRecords) -> BTreeSet<String> {
    let old_tiered: HashMap<&str, &PsnTitle> = previous
        .tiered
        .iter()
        .map(|title| (title.np_communication_id.as_str(), title))
        .collect();
    let old_flat: HashMap<&str, &XboxTitle> = previous
        .flat
        .iter()
        .map(|title| (title.title_id.as_str(), title))
        .collect();

    let tiered = next.tiered.iter().filter(|title| {
        old_tiered
            .get(title.np_communication_id.as_str())
            .is_none_or(|old| {
                old.progress != title.progress
                    || old.earned_trophies != title.earned_trophies
                    || old.last_updated_date_time != title.last_updated_date_time
            })
    });
    let flat = next.flat.iter().filter(|title| {
        old_flat
            .get(title.title_id.as_str())
            .is_none_or(|old| old.achievement != title.achievement)
    });

    tiered
        .map(|title| title.np_communication_id.clone())
        .chain(flat.map(|title| title.title_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::credentials::{MemoryCredentialStore, SessionVault},
        engine::model::TierCounts,
        upstream::{FetchResponse, psn::TokenPair, test_support::FakeFetch},
    };
    use futures::StreamExt;
    use reqwest::StatusCode;
    use std::sync::atomic::AtomicUsize;

    fn title(id: &str, progress: u8, bronze: u32) -> Value {
        json!({
            "npCommunicationId": id,
            "trophyTitleName": format!("Game {id}"),
            "trophyTitlePlatform": "PS5",
            "progress": progress,
            "definedTrophies": {"bronze": 10, "silver": 0, "gold": 0, "platinum": 0},
            "earnedTrophies": {"bronze": bronze, "silver": 0, "gold": 0, "platinum": 0},
            "trophies": [{"trophyId": 1, "trophyName": "First", "trophyType": "bronze", "earned": true}]
        })
    }

    fn ok(request: &FetchRequest, body: Value) -> FetchResponse {
        FetchResponse::new(&request.url, StatusCode::OK, body.to_string())
    }

    async fn signed_in(fake: Arc<FakeFetch>, store: Arc<MemoryCredentialStore>) -> Arc<TrophySession> {
        let (_tx, rx) = watch::channel(AppActivity::Active);
        let session = TrophySession::new(&ClientConfig::default(), fake, store, rx);
        session
            .api()
            .set_tokens(Some(TokenPair {
                access_token: "a".into(),
                refresh_token: "r".into(),
                expires_in: 3600,
            }))
            .await;
        *session.account.write().await = Some(AccountInfo {
            account_id: "me".into(),
            ..AccountInfo::default()
        });
        session
    }

    #[tokio::test]
    async fn refresh_broadcasts_only_changed_titles() {
        let library_calls = Arc::new(AtomicUsize::new(0));
        let counter = library_calls.clone();
        let fake = FakeFetch::new(move |request| {
            if request.url.ends_with("/api/trophies/me") {
                let bronze = if counter.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 2 };
                ok(request, json!({"totalItemCount": 2, "trophyTitles": [title("A", 10, bronze), title("B", 50, 5)]}))
            } else {
                ok(request, json!({"earnedTrophies": {"bronze": 6}}))
            }
        });
        let store = Arc::new(MemoryCredentialStore::new());
        let session = signed_in(fake, store.clone()).await;
        let mut changes = session.changes();

        let first = session.refresh().await.unwrap();
        assert_eq!(first, BTreeSet::from(["A".to_string(), "B".to_string()]));
        assert_eq!(session.watchdog_baseline().await, Some(6));

        let second = session.refresh().await.unwrap();
        assert_eq!(second, BTreeSet::from(["A".to_string()]));
        assert_eq!(session.watchdog_baseline().await, Some(7));

        let seen: Vec<_> = changes.by_ref().take(2).collect().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(*seen[1].as_ref().unwrap().as_ref(), second);

        let cached = SessionVault::new(store).load_owned().await.unwrap();
        assert_eq!(cached.tiered.len(), 2);
        assert!(!*session.refreshing().borrow());
    }

    #[tokio::test]
    async fn owned_title_with_trophies_skips_network_on_first_load() {
        let fake = FakeFetch::new(|request| {
            if request.url.ends_with("/api/trophies/me") {
                ok(request, json!({"trophyTitles": [title("NPWR1_00", 10, 1)]}))
            } else {
                ok(request, json!({"trophies": [], "groups": []}))
            }
        });
        let session = signed_in(fake.clone(), Arc::new(MemoryCredentialStore::new())).await;
        session.refresh().await.unwrap();
        let detail_urls = || {
            fake.urls()
                .into_iter()
                .filter(|url| url.contains("/api/trophies/me/"))
                .collect::<Vec<_>>()
        };

        let detail = session.load_detail("NPWR1_00", true).await.unwrap();
        assert!(detail_urls().is_empty());
        assert_eq!(detail.source, TrophySource::Api);
        assert_eq!(detail.trophies.len(), 1);
        assert!(detail.trophies[0].earned);

        session.load_detail("NPWR1_00", false).await.unwrap();
        let urls = detail_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].ends_with("/api/trophies/me/NPWR1_00?gameName=Game+NPWR1_00&platform=PS5"));
    }

    fn catalog_game(id: &str) -> Value {
        json!({
            "canonicalId": "g1",
            "displayName": "Catalog Game",
            "platforms": {"ps": [{"id": id, "platform": "PS5"}]},
            "trophies": [
                {"id": 0, "name": "Start", "type": "bronze"},
                {"id": 1, "name": "First", "type": "bronze"},
                {"id": 2, "name": "Extra", "type": "gold"}
            ],
            "trophyGroups": [
                {"trophyGroupId": "001", "trophyIds": [2]},
                {"trophyGroupId": "default", "trophyIds": [0, 1]}
            ]
        })
    }

    #[tokio::test]
    async fn owned_earned_list_wins_over_catalog_definitions() {
        let fake = FakeFetch::new(|request| {
            if request.url.ends_with("/api/games") {
                ok(request, json!([catalog_game("NPWR1")]))
            } else if request.url.ends_with("/api/trophies/me") {
                ok(request, json!({"trophyTitles": [title("NPWR1", 10, 1)]}))
            } else {
                ok(request, json!({"earnedTrophies": {"bronze": 1}}))
            }
        });
        let session = signed_in(fake, Arc::new(MemoryCredentialStore::new())).await;
        assert_eq!(session.load_catalog().await, 1);
        session.refresh().await.unwrap();

        let detail = session.load_detail("NPWR1", true).await.unwrap();
        assert_eq!(detail.source, TrophySource::Api);
        assert_eq!(detail.trophies.len(), 1);
        assert!(detail.trophies[0].earned);
    }

    #[tokio::test]
    async fn catalog_groups_split_base_game_and_dlc_when_live_groups_are_missing() {
        let fake = FakeFetch::new(|request| {
            if request.url.ends_with("/api/games") {
                ok(request, json!([catalog_game("NPWR9")]))
            } else if request.url.contains("/api/trophies/me/") {
                ok(request, json!({
                    "trophies": [
                        {"trophyId": 0, "trophyName": "Start", "trophyType": "bronze", "earned": true},
                        {"trophyId": 1, "trophyName": "First", "trophyType": "bronze", "earned": false},
                        {"trophyId": 2, "trophyName": "Extra", "trophyType": "gold", "earned": true}
                    ],
                    "groups": []
                }))
            } else if request.url.ends_with("/api/trophies/me") {
                ok(request, json!({"trophyTitles": [{
                    "npCommunicationId": "NPWR9",
                    "trophyTitleName": "Catalog Game",
                    "trophyTitlePlatform": "PS5",
                    "progress": 50
                }]}))
            } else {
                ok(request, json!({"earnedTrophies": {}}))
            }
        });
        let session = signed_in(fake, Arc::new(MemoryCredentialStore::new())).await;
        session.load_catalog().await;
        session.refresh().await.unwrap();

        let detail = session.load_detail("NPWR9", true).await.unwrap();
        assert_eq!(detail.source, TrophySource::Api);
        let groups = detail.groups.expect("base game and one DLC");
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_base_game);
        assert_eq!(groups[0].trophies.len(), 2);
        assert_eq!(groups[1].id, "001");
        assert_eq!(groups[1].trophies.len(), 1);
    }

    #[tokio::test]
    async fn unknown_title_has_no_detail_source() {
        let fake = FakeFetch::new(|request| ok(request, json!([])));
        let session = signed_in(fake, Arc::new(MemoryCredentialStore::new())).await;
        let detail = session.load_detail("nothing", true).await.unwrap();
        assert!(detail.identification.is_unknown());
        assert_eq!(detail.source, TrophySource::None);
    }

    #[tokio::test]
    async fn bootstrap_refreshes_near_expiry_tokens() {
        let fake = FakeFetch::new(|request| {
            ok(request, json!({"accessToken": "new", "refreshToken": "r2", "expiresIn": 3600}))
        });
        let store = Arc::new(MemoryCredentialStore::new());
        let vault = SessionVault::new(store.clone());
        vault
            .save_tokens(&TokenPair {
                access_token: "old".into(),
                refresh_token: "r1".into(),
                expires_in: 60,
            })
            .await;
        vault
            .save_account(&AccountInfo {
                account_id: "me".into(),
                ..AccountInfo::default()
            })
            .await;

        let (_tx, rx) = watch::channel(AppActivity::Active);
        let session = TrophySession::new(&ClientConfig::default(), fake.clone(), store, rx);
        assert!(session.bootstrap().await);
        assert_eq!(session.api().access_token().await.as_deref(), Some("new"));
        assert!(fake.urls()[0].ends_with("/api/auth/refresh"));
        assert_eq!(vault.load_session().await.unwrap().refresh_token, "r2");
    }

    #[tokio::test]
    async fn bootstrap_without_stored_session_stays_signed_out() {
        let fake = FakeFetch::new(|request| ok(request, json!({})));
        let (_tx, rx) = watch::channel(AppActivity::Active);
        let session = TrophySession::new(
            &ClientConfig::default(),
            fake.clone(),
            Arc::new(MemoryCredentialStore::new()),
            rx,
        );
        assert!(!session.bootstrap().await);
        assert_eq!(fake.calls(), 0);
    }

    #[test]
    fn changed_ids_ignores_untouched_titles() {
        let psn = |id: &str, bronze| PsnTitle {
            np_communication_id: id.into(),
            earned_trophies: TierCounts {
                bronze,
                ..TierCounts::default()
            },
            ..PsnTitle::default()
        };
        let previous = OwnedRecords {
            tiered: vec![psn("A", 1), psn("B", 1)],
            flat: Vec::new(),
        };
        let next = OwnedRecords {
            tiered: vec![psn("A", 1), psn("B", 2), psn("C", 0)],
            flat: Vec::new(),
        };
        assert_eq!(
            changed_ids(&previous, &next),
            BTreeSet::from(["B".to_string(), "C".to_string()])
        );
    }
}
