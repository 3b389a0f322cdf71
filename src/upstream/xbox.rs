//! Xbox Live client: OAuth code to XSTS token chain and title history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{config::UpstreamConfig, engine::model::XboxTitle};

use super::{
    error::{UpstreamError, UpstreamResult},
    http::{FetchRequest, FetchResponse, HttpFetch},
};

const OAUTH_SCOPE: &str = "XboxLive.Signin offline_access";

/// Signed-in Xbox identity plus the tokens needed for title history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct XboxSession {
    pub gamertag: String,
    pub gamerpic: String,
    pub xuid: String,
    pub xsts_token: String,
    pub user_hash: String,
    pub access_token: String,
}

/// Title history of one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct XboxTitleList {
    #[serde(default)]
    pub xuid: String,
    #[serde(default)]
    pub titles: Vec<XboxTitle>,
}

#[derive(Debug, Deserialize)]
struct OAuthToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XblToken {
    token: String,
    #[serde(default)]
    display_claims: Option<DisplayClaims>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayClaims {
    #[serde(default)]
    xui: Vec<UserClaim>,
}

#[derive(Debug, Default, Deserialize)]
struct UserClaim {
    #[serde(default)]
    uhs: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProfileResponse {
    profile_users: Vec<ProfileUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileUser {
    id: String,
    settings: Vec<ProfileSetting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileSetting {
    id: String,
    value: String,
}

impl ProfileUser {
    fn setting(&self, id: &str) -> String {
        self.settings
            .iter()
            .find(|setting| setting.id == id)
            .map(|setting| setting.value.clone())
            .unwrap_or_default()
    }
}

/// `XBL3.0 x=<hash>;<token>` authorization header value.
pub fn xbl_authorization(user_hash: &str, xsts_token: &str) -> String {
    format!("XBL3.0 x={user_hash};{xsts_token}")
}

/// Client for the Xbox Live endpoints.
#[derive(Clone)]
pub struct XboxClient {
    http: Arc<dyn HttpFetch>,
    config: UpstreamConfig,
}

impl XboxClient {
    /// Build a client over the given fetch primitive.
    pub fn new(http: Arc<dyn HttpFetch>, config: UpstreamConfig) -> Self {
        Self { http, config }
    }

    /// OAuth code (PKCE) -> user token -> XSTS token -> profile.
    pub async fn exchange(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> UpstreamResult<XboxSession> {
        let oauth_request = FetchRequest::post(&self.config.xbox_oauth_token_url).form([
            ("client_id", self.config.azure_client_id.as_str()),
            ("scope", OAUTH_SCOPE),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code_verifier", code_verifier),
        ]);
        let response = self.http.fetch(oauth_request).await?;
        if !response.is_ok() {
            let reason = response
                .json::<Value>()
                .ok()
                .and_then(|body| body.get("error_description")?.as_str().map(str::to_string))
                .unwrap_or_else(|| "OAuth failed".to_string());
            return Err(UpstreamError::Rejected { reason });
        }
        let oauth: OAuthToken = response.json()?;

        let user_token: XblToken = self
            .post_json(
                &self.config.xbox_user_auth_url,
                json!({
                    "Properties": {
                        "AuthMethod": "RPS",
                        "SiteName": "user.auth.xboxlive.com",
                        "RpsTicket": format!("d={}", oauth.access_token),
                    },
                    "RelyingParty": "http://auth.xboxlive.com",
                    "TokenType": "JWT",
                }),
                "XBL auth failed",
            )
            .await?
            .json()?;

        let xsts: XblToken = self
            .post_json(
                &self.config.xbox_xsts_url,
                json!({
                    "Properties": {"SandboxId": "RETAIL", "UserTokens": [user_token.token]},
                    "RelyingParty": "http://xboxlive.com",
                    "TokenType": "JWT",
                }),
                "XSTS auth failed",
            )
            .await?
            .json()?;
        let user_hash = xsts
            .display_claims
            .as_ref()
            .and_then(|claims| claims.xui.first())
            .map(|claim| claim.uhs.clone())
            .filter(|hash| !hash.is_empty())
            .ok_or_else(|| UpstreamError::Rejected {
                reason: "XSTS response carried no user hash".into(),
            })?;

        let profile_url = format!(
            "{}/users/me/profile/settings?settings=Gamertag,GameDisplayPicRaw",
            self.config.xbox_profile_base.trim_end_matches('/')
        );
        let profile: ProfileResponse = self
            .http
            .fetch(self.xbl_get(&profile_url, &user_hash, &xsts.token))
            .await?
            .error_for_status()?
            .json()?;
        let user = profile
            .profile_users
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Decode {
                url: profile_url,
                message: "profile response had no users".into(),
            })?;

        info!(xuid = %user.id, "xbox sign-in exchanged");
        Ok(XboxSession {
            gamertag: user.setting("Gamertag"),
            gamerpic: user.setting("GameDisplayPicRaw"),
            xuid: user.id,
            xsts_token: xsts.token,
            user_hash,
            access_token: oauth.access_token,
        })
    }

    /// Title history with achievement summaries.
    pub async fn titles(
        &self,
        xuid: &str,
        xsts_token: &str,
        user_hash: &str,
    ) -> UpstreamResult<XboxTitleList> {
        let url = format!(
            "{}/users/xuid({xuid})/titles/titlehistory/decoration/scid,image,detail",
            self.config.xbox_titlehub_base.trim_end_matches('/')
        );
        let list: XboxTitleList = self
            .http
            .fetch(self.xbl_get(&url, user_hash, xsts_token))
            .await?
            .error_for_status()?
            .json()?;
        info!(%xuid, titles = list.titles.len(), "xbox titles fetched");
        Ok(list)
    }

    fn xbl_get(&self, url: &str, user_hash: &str, xsts_token: &str) -> FetchRequest {
        FetchRequest::get(url)
            .header("x-xbl-contract-version", "2")
            .header("Authorization", xbl_authorization(user_hash, xsts_token))
            .header("Accept-Language", "en-US")
    }

    async fn post_json(
        &self,
        url: &str,
        body: Value,
        failure: &str,
    ) -> UpstreamResult<FetchResponse> {
        let request = FetchRequest::post(url)
            .header("Accept", "application/json")
            .json(body);
        let response = self.http.fetch(request).await?;
        if let Some(code) = response.header("x-err").map(str::to_string).or_else(|| {
            response
                .json::<Value>()
                .ok()
                .and_then(|body| body.get("XErr").map(Value::to_string))
        }) {
            warn!(%url, xerr = %code, "xbox live refused the token");
            return Err(UpstreamError::Rejected {
                reason: format!("{failure} (XErr {code})"),
            });
        }
        if !response.is_ok() {
            return Err(UpstreamError::Rejected {
                reason: format!("{failure} ({})", response.status),
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::test_support::FakeFetch;
    use crate::upstream::http::RequestBody;
    use reqwest::StatusCode;

    fn client(fake: &Arc<FakeFetch>) -> XboxClient {
        XboxClient::new(fake.clone(), UpstreamConfig::default())
    }

    fn happy_path(request: &FetchRequest) -> FetchResponse {
        let body = if request.url.contains("login.microsoftonline.com") {
            json!({"access_token": "ms-token"})
        } else if request.url.contains("user.auth.xboxlive.com") {
            json!({"Token": "user-token"})
        } else if request.url.contains("xsts.auth.xboxlive.com") {
            json!({"Token": "xsts-token", "DisplayClaims": {"xui": [{"uhs": "hash"}]}})
        } else {
            json!({"profileUsers": [{"id": "2533", "settings": [
                {"id": "Gamertag", "value": "Chief"},
                {"id": "GameDisplayPicRaw", "value": "pic.png"}
            ]}]})
        };
        FetchResponse::new(&request.url, StatusCode::OK, body.to_string())
    }

    #[tokio::test]
    async fn exchange_chains_every_token() {
        let fake = FakeFetch::new(happy_path);
        let session = client(&fake).exchange("code", "app://cb", "verifier").await.unwrap();
        assert_eq!(session.gamertag, "Chief");
        assert_eq!(session.xuid, "2533");
        assert_eq!(session.user_hash, "hash");
        assert_eq!(session.xsts_token, "xsts-token");
        assert_eq!(session.access_token, "ms-token");

        let requests = fake.requests();
        assert_eq!(requests.len(), 4);
        assert!(matches!(
            &requests[0].body,
            Some(RequestBody::Form(pairs)) if pairs.iter().any(|(k, v)| k == "code_verifier" && v == "verifier")
        ));
        assert_eq!(
            requests[3].header_value("authorization"),
            Some("XBL3.0 x=hash;xsts-token")
        );
    }

    #[tokio::test]
    async fn xsts_refusal_is_rejected() {
        let fake = FakeFetch::new(|request| {
            if request.url.contains("xsts.auth.xboxlive.com") {
                FetchResponse::new(&request.url, StatusCode::UNAUTHORIZED, r#"{"XErr":2148916233}"#)
            } else {
                happy_path(request)
            }
        });
        let err = client(&fake).exchange("code", "app://cb", "v").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Rejected { ref reason } if reason.contains("2148916233")));
    }

    #[tokio::test]
    async fn oauth_failure_surfaces_description() {
        let fake = FakeFetch::new(|request| {
            FetchResponse::new(
                &request.url,
                StatusCode::BAD_REQUEST,
                r#"{"error_description":"code expired"}"#,
            )
        });
        let err = client(&fake).exchange("code", "app://cb", "v").await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Rejected {
                reason: "code expired".into()
            }
        );
    }

    #[tokio::test]
    async fn titles_decode_partial_records() {
        let fake = FakeFetch::new(|request| {
            let body = json!({"xuid": "1", "titles": [
                {"titleId": "42", "name": "Halo", "achievement": {"currentGamerscore": 10, "totalGamerscore": null}},
                {"titleId": "43", "name": "Forza"}
            ]});
            FetchResponse::new(&request.url, StatusCode::OK, body.to_string())
        });
        let list = client(&fake).titles("1", "tok", "hash").await.unwrap();
        assert_eq!(list.titles.len(), 2);
        assert_eq!(list.titles[0].achievement.current_gamerscore, 10);
        assert_eq!(list.titles[0].achievement.total_gamerscore, 0);
        assert!(fake.urls()[0].contains("xuid(1)"));
    }

    #[tokio::test]
    async fn expired_xsts_token_is_auth_expired() {
        let fake = FakeFetch::new(|request| FetchResponse::new(&request.url, StatusCode::UNAUTHORIZED, ""));
        let err = client(&fake).titles("1", "tok", "hash").await.unwrap_err();
        assert!(err.is_auth_expired());
    }
}
