//! Console network (PSN) client: trophy lists, title details and auth exchange.

use std::{collections::HashMap, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::{DefaultOnNull, serde_as};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    config::UpstreamConfig,
    engine::model::{PsnTitle, RawTrophyGroup, TierCounts, Trophy},
};

use super::{
    error::{UpstreamError, UpstreamResult},
    http::{FetchRequest, FetchResponse, HttpFetch},
};

/// Public client id of the console network's mobile app.
const CLIENT_ID: &str = "09515159-7237-4370-9b40-3806e67c0891";
/// Basic credentials of the same app for the token endpoint.
const CLIENT_BASIC_AUTH: &str =
    "Basic MDk1MTUxNTktNzIzNy00MzcwLTliNDAtMzgwNmU2N2MwODkxOnVjUGprYTV0bnRCMktxc1A=";
const REDIRECT_URI: &str = "com.scee.psxandroid.scecompcall://redirect";
const SCOPE: &str = "psn:mobile.v2.core psn:clientapp";
/// Legacy service names tried after the plain URL 404s.
const LEGACY_SERVICES: [&str; 2] = ["trophy", "trophy2"];

/// Ordered request variants for a title endpoint: the plain URL, then each
/// legacy service name.
pub fn legacy_candidates(url: &str) -> Vec<String> {
    let separator = if url.contains('?') { '&' } else { '?' };
    std::iter::once(url.to_string())
        .chain(
            LEGACY_SERVICES
                .iter()
                .map(|service| format!("{url}{separator}npServiceName={service}")),
        )
        .collect()
}

/// Entry of the game list endpoint, used only for artwork enrichment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameListTitle {
    pub name: String,
    pub image_url: Option<String>,
    pub concept: Option<GameConcept>,
}

/// Concept block of a game list entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConcept {
    pub media: Option<ConceptMedia>,
}

/// Media attached to a concept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConceptMedia {
    pub images: Vec<ConceptImage>,
}

/// One concept image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConceptImage {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl GameListTitle {
    fn hero_art(&self) -> Option<String> {
        self.concept
            .as_ref()
            .and_then(|concept| concept.media.as_ref())
            .and_then(|media| {
                ["GAMEHUB_COVER_ART", "MASTER"].iter().find_map(|kind| {
                    media
                        .images
                        .iter()
                        .find(|image| image.kind == *kind && !image.url.is_empty())
                        .map(|image| image.url.clone())
                })
            })
    }
}

/// Owned title list, enriched with artwork.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleLibrary {
    #[serde(default)]
    pub total_item_count: usize,
    #[serde(default)]
    pub trophy_titles: Vec<PsnTitle>,
}

/// Merged per-title trophy data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetail {
    pub trophies: Vec<Trophy>,
    pub groups: Vec<RawTrophyGroup>,
}

/// Account-wide trophy summary polled by the watchdog.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrophySummary {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub account_id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_level: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub progress: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tier: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub earned_trophies: TierCounts,
}

/// Access/refresh pair returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Everything the client needs after an NPSSO login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PsnSession {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub account_id: String,
    pub online_id: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProfile {
    online_id: Option<String>,
    avatars: Vec<RawAvatar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAvatar {
    size: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IdClaims {
    sub: String,
}

/// Read the account id (`sub`) from an id token without verifying it.
///
/// The token comes straight from the issuer over TLS; only the claim is needed.
pub fn account_id_from_token(token: &str) -> UpstreamResult<String> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    decode::<IdClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims.sub)
        .map_err(|err| UpstreamError::Decode {
            url: "id_token".into(),
            message: err.to_string(),
        })
}

/// Combine definitions with per-user progress by trophy id.
pub fn merge_trophies(definitions: Vec<Trophy>, progress: &[Trophy]) -> Vec<Trophy> {
    let by_id: HashMap<u32, &Trophy> = progress.iter().map(|t| (t.trophy_id, t)).collect();
    definitions
        .into_iter()
        .map(|mut trophy| {
            if let Some(user) = by_id.get(&trophy.trophy_id) {
                trophy.earned = user.earned || user.earned_date_time.is_some();
                trophy.earned_date_time = user.earned_date_time.clone();
                if user.trophy_earned_rate.is_some() {
                    trophy.trophy_earned_rate = user.trophy_earned_rate.clone();
                }
                if trophy.trophy_group_id.is_none() {
                    trophy.trophy_group_id = user.trophy_group_id.clone();
                }
            }
            trophy
        })
        .collect()
}

/// Pick the final trophy list out of the progress and definition calls.
///
/// Progress that embeds names is used as is; otherwise definitions are merged
/// with it, unless there are none.
pub fn resolve_detail(progress: Vec<Trophy>, definitions: Vec<Trophy>) -> Vec<Trophy> {
    let rich = progress
        .first()
        .is_some_and(|first| first.trophy_name.is_some());
    if rich {
        return progress
            .into_iter()
            .map(|mut trophy| {
                trophy.earned = trophy.earned || trophy.earned_date_time.is_some();
                trophy
            })
            .collect();
    }
    if definitions.is_empty() {
        return progress;
    }
    merge_trophies(definitions, &progress)
}

/// Lowercase alphanumerics only, so `"Game™: Deluxe"` matches `"game deluxe"`.
pub fn normalize_title(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Attach game-list artwork to trophy titles matched by normalized name.
pub fn enrich_with_artwork(mut titles: Vec<PsnTitle>, games: &[GameListTitle]) -> Vec<PsnTitle> {
    let mut by_name: HashMap<String, &GameListTitle> = HashMap::new();
    for game in games {
        let key = normalize_title(&game.name);
        if !key.is_empty() {
            by_name.entry(key).or_insert(game);
        }
    }
    for title in &mut titles {
        let Some(game) = by_name.get(&normalize_title(&title.trophy_title_name)) else {
            continue;
        };
        if let Some(image) = game.image_url.clone().filter(|url| !url.is_empty()) {
            title.trophy_title_icon_url = Some(image.clone());
            title.game_art_url = Some(game.hero_art().unwrap_or(image));
        }
    }
    titles
}

fn items<T: DeserializeOwned>(payload: &Value, key: &str) -> Vec<T> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Client for the console network endpoints.
#[derive(Clone)]
pub struct PsnClient {
    http: Arc<dyn HttpFetch>,
    config: UpstreamConfig,
}

impl PsnClient {
    /// Build a client over the given fetch primitive.
    pub fn new(http: Arc<dyn HttpFetch>, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.config.psn_api_base.trim_end_matches('/'), path)
    }

    fn auth(&self, path: &str) -> String {
        format!("{}{}", self.config.psn_auth_base.trim_end_matches('/'), path)
    }

    /// Send a request, sleeping and retrying the same request on rate limits.
    async fn send(&self, request: FetchRequest) -> UpstreamResult<FetchResponse> {
        let mut attempt = 1;
        loop {
            let result = self.http.fetch(request.clone()).await?.error_for_status();
            match result {
                Err(UpstreamError::RateLimited { url })
                    if attempt < self.config.max_rate_limit_attempts =>
                {
                    warn!(
                        %url,
                        attempt,
                        delay_ms = self.config.rate_limit_delay.as_millis() as u64,
                        "rate limited; backing off"
                    );
                    sleep(self.config.rate_limit_delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn get_json(&self, url: &str, access_token: &str) -> UpstreamResult<Value> {
        let request = FetchRequest::get(url)
            .bearer(access_token)
            .header("User-Agent", "Mozilla/5.0")
            .header("Accept-Language", "en-US");
        self.send(request).await?.json()
    }

    /// Try each legacy candidate in order. Auth failures abort at once.
    pub async fn fetch_with_fallback(&self, url: &str, access_token: &str) -> UpstreamResult<Value> {
        let candidates = legacy_candidates(url);
        let attempts = candidates.len();
        let mut last = None;
        for candidate in candidates {
            match self.get_json(&candidate, access_token).await {
                Ok(value) => return Ok(value),
                Err(err @ (UpstreamError::NotFound { .. } | UpstreamError::Status { .. })) => {
                    debug!(url = %candidate, error = %err, "candidate failed; trying next service");
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(UpstreamError::FallbackExhausted {
            url: url.to_string(),
            attempts,
            last: Box::new(last.unwrap_or(UpstreamError::NotFound {
                url: url.to_string(),
            })),
        })
    }

    /// Fallback fetch that degrades every non-auth failure to an empty list.
    async fn safe_items<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        key: &str,
    ) -> UpstreamResult<Vec<T>> {
        match self.fetch_with_fallback(url, access_token).await {
            Ok(payload) => Ok(items(&payload, key)),
            Err(err) if err.is_auth_expired() => Err(err),
            Err(err) => {
                info!(%key, error = %err, "fetch skipped; using empty list");
                Ok(Vec::new())
            }
        }
    }

    /// Request `limit`-sized pages until a short page comes back.
    ///
    /// Auth failures propagate; any other failure ends the drain with what
    /// was collected so far.
    pub async fn drain_pages<T: DeserializeOwned>(
        &self,
        base_url: &str,
        key: &str,
        access_token: &str,
    ) -> UpstreamResult<Vec<T>> {
        let limit = self.config.page_size;
        let mut collected = Vec::new();
        let mut offset = 0;
        loop {
            let url = format!("{base_url}?limit={limit}&offset={offset}");
            let payload = match self.get_json(&url, access_token).await {
                Ok(payload) => payload,
                Err(err) if err.is_auth_expired() => return Err(err),
                Err(err) => {
                    warn!(%url, error = %err, "pagination stopped early");
                    break;
                }
            };
            let page_len = payload
                .get(key)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            collected.extend(items::<T>(&payload, key));
            if page_len < limit {
                break;
            }
            offset += limit;
        }
        Ok(collected)
    }

    /// Drain the owned trophy titles and the game list, then enrich artwork.
    pub async fn title_library(
        &self,
        account_id: &str,
        access_token: &str,
    ) -> UpstreamResult<TitleLibrary> {
        let trophy_url = self.api(&format!("/api/trophy/v1/users/{account_id}/trophyTitles"));
        let games_url = self.api(&format!("/api/gamelist/v2/users/{account_id}/titles"));
        let (titles, games) = tokio::try_join!(
            self.drain_pages::<PsnTitle>(&trophy_url, "trophyTitles", access_token),
            self.drain_pages::<GameListTitle>(&games_url, "titles", access_token),
        )?;
        let trophy_titles = enrich_with_artwork(titles, &games);
        info!(
            %account_id,
            titles = trophy_titles.len(),
            games = games.len(),
            "title library fetched"
        );
        Ok(TitleLibrary {
            total_item_count: trophy_titles.len(),
            trophy_titles,
        })
    }

    /// Progress, definitions and groups for one title, merged.
    pub async fn title_detail(
        &self,
        account_id: &str,
        np_communication_id: &str,
        access_token: &str,
    ) -> UpstreamResult<TitleDetail> {
        let base = self.api("/api/trophy/v1");
        let progress_url = format!(
            "{base}/users/{account_id}/npCommunicationIds/{np_communication_id}/trophyGroups/all/trophies?limit=1000"
        );
        let definitions_url =
            format!("{base}/npCommunicationIds/{np_communication_id}/trophyGroups/all/trophies");
        let groups_url = format!("{base}/npCommunicationIds/{np_communication_id}/trophyGroups");

        let (progress, definitions, groups) = tokio::try_join!(
            self.safe_items::<Trophy>(&progress_url, access_token, "trophies"),
            self.safe_items::<Trophy>(&definitions_url, access_token, "trophies"),
            self.safe_items::<RawTrophyGroup>(&groups_url, access_token, "trophyGroups"),
        )?;
        Ok(TitleDetail {
            trophies: resolve_detail(progress, definitions),
            groups,
        })
    }

    /// Account trophy summary.
    pub async fn trophy_summary(
        &self,
        account_id: &str,
        access_token: &str,
    ) -> UpstreamResult<TrophySummary> {
        let url = self.api(&format!("/api/trophy/v1/users/{account_id}/trophySummary"));
        let payload = self.get_json(&url, access_token).await?;
        serde_json::from_value(payload).map_err(|err| UpstreamError::Decode {
            url,
            message: err.to_string(),
        })
    }

    /// Raw profile document.
    pub async fn profile(&self, account_id: &str, access_token: &str) -> UpstreamResult<Value> {
        let url = self.api(&format!(
            "/api/userProfile/v1/internal/users/{account_id}/profiles"
        ));
        self.get_json(&url, access_token).await
    }

    /// NPSSO cookie -> authorization code -> tokens -> account id and profile.
    pub async fn exchange_npsso(&self, npsso: &str) -> UpstreamResult<PsnSession> {
        let code = self.authorization_code(npsso).await?;
        let raw = self
            .token_request([
                ("code", code.as_str()),
                ("redirect_uri", REDIRECT_URI),
                ("grant_type", "authorization_code"),
                ("token_format", "jwt"),
            ])
            .await?;
        let id_token = raw.id_token.clone().unwrap_or_else(|| raw.access_token.clone());
        let account_id = account_id_from_token(&id_token)?;
        let tokens = TokenPair {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in,
        };

        let profile = match self.profile(&account_id, &tokens.access_token).await {
            Ok(payload) => serde_json::from_value::<RawProfile>(payload).unwrap_or_default(),
            Err(err) => {
                warn!(%account_id, error = %err, "profile lookup failed after login");
                RawProfile::default()
            }
        };
        let avatar_url = profile
            .avatars
            .iter()
            .find(|avatar| avatar.size == "l")
            .or_else(|| profile.avatars.first())
            .map(|avatar| avatar.url.clone());

        info!(%account_id, "npsso exchanged");
        Ok(PsnSession {
            tokens,
            account_id,
            online_id: profile.online_id,
            avatar_url,
        })
    }

    /// Rotate both tokens.
    pub async fn refresh(&self, refresh_token: &str) -> UpstreamResult<TokenPair> {
        let raw = self
            .token_request([
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("token_format", "jwt"),
                ("scope", SCOPE),
            ])
            .await?;
        Ok(TokenPair {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in,
        })
    }

    async fn authorization_code(&self, npsso: &str) -> UpstreamResult<String> {
        let endpoint = self.auth("/api/authz/v3/oauth/authorize");
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("access_type", "offline"),
                ("client_id", CLIENT_ID),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
                ("scope", SCOPE),
            ],
        )
        .map_err(|err| UpstreamError::Decode {
            url: endpoint.clone(),
            message: err.to_string(),
        })?;
        let response = self
            .http
            .fetch(FetchRequest::get(url.as_str()).header("Cookie", format!("npsso={npsso}")))
            .await?;
        if !(response.status.is_redirection() || response.is_ok()) {
            return Err(UpstreamError::from_status(&endpoint, response.status, &response.body));
        }
        response
            .header("location")
            .and_then(|location| Url::parse(location).ok())
            .and_then(|location| {
                location
                    .query_pairs()
                    .find(|(key, _)| key == "code")
                    .map(|(_, value)| value.into_owned())
            })
            .ok_or_else(|| UpstreamError::Rejected {
                reason: "npsso did not yield an authorization code".into(),
            })
    }

    async fn token_request<const N: usize>(
        &self,
        form: [(&str, &str); N],
    ) -> UpstreamResult<RawTokenResponse> {
        let url = self.auth("/api/authz/v3/oauth/token");
        let request = FetchRequest::post(&url)
            .header("Authorization", CLIENT_BASIC_AUTH)
            .form(form);
        let response = self.http.fetch(request).await?;
        if response.status == StatusCode::BAD_REQUEST || response.status == StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::Rejected {
                reason: format!("token endpoint answered {}", response.status),
            });
        }
        let raw: RawTokenResponse = response.error_for_status()?.json()?;
        if raw.access_token.is_empty() {
            return Err(UpstreamError::Rejected {
                reason: "token endpoint returned no access token".into(),
            });
        }
        Ok(raw)
    }
}
