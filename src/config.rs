//! Application-level configuration loading: listen port and upstream tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TROPHY_HUB_CONFIG_PATH";
/// Port used when neither the file nor the environment sets one.
const DEFAULT_PORT: u16 = 4000;

/// Console network hosts.
pub const PSN_API_BASE: &str = "https://m.np.playstation.com";
/// Console network authorization host.
pub const PSN_AUTH_BASE: &str = "https://ca.account.sony.com";
/// Microsoft consumer OAuth token endpoint.
pub const XBOX_OAUTH_TOKEN_URL: &str =
    "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
/// Xbox Live user token endpoint.
pub const XBOX_USER_AUTH_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
/// Xbox Live XSTS endpoint.
pub const XBOX_XSTS_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
/// Xbox profile host.
pub const XBOX_PROFILE_BASE: &str = "https://profile.xboxlive.com";
/// Xbox title history host.
pub const XBOX_TITLEHUB_BASE: &str = "https://titlehub.xboxlive.com";
/// Azure application registered for the Xbox sign-in flow.
pub const DEFAULT_AZURE_CLIENT_ID: &str = "5e278654-b281-411b-85f4-eb7fb056e5ba";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Tunables shared by the upstream clients.
pub struct UpstreamConfig {
    pub psn_api_base: String,
    pub psn_auth_base: String,
    pub xbox_oauth_token_url: String,
    pub xbox_user_auth_url: String,
    pub xbox_xsts_url: String,
    pub xbox_profile_base: String,
    pub xbox_titlehub_base: String,
    /// Azure application id used for the Microsoft OAuth code exchange.
    pub azure_client_id: String,
    /// Items requested per page when draining paginated lists.
    pub page_size: usize,
    /// Fixed pause after a rate-limit answer.
    pub rate_limit_delay: Duration,
    /// Attempts per unit of work before a rate limit is surfaced.
    pub max_rate_limit_attempts: u32,
    pub http_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            psn_api_base: PSN_API_BASE.into(),
            psn_auth_base: PSN_AUTH_BASE.into(),
            xbox_oauth_token_url: XBOX_OAUTH_TOKEN_URL.into(),
            xbox_user_auth_url: XBOX_USER_AUTH_URL.into(),
            xbox_xsts_url: XBOX_XSTS_URL.into(),
            xbox_profile_base: XBOX_PROFILE_BASE.into(),
            xbox_titlehub_base: XBOX_TITLEHUB_BASE.into(),
            azure_client_id: DEFAULT_AZURE_CLIENT_ID.into(),
            page_size: 200,
            rate_limit_delay: Duration::from_secs(5),
            max_rate_limit_attempts: 3,
            http_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub port: u16,
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Load the configuration from disk, then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply `PORT`/`SERVER_PORT` and `AZURE_CLIENT_ID` from `lookup`.
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = lookup("PORT")
            .or_else(|| lookup("SERVER_PORT"))
            .and_then(|value| value.parse::<u16>().ok())
        {
            self.port = port;
        }
        if let Some(client_id) = lookup("AZURE_CLIENT_ID").filter(|value| !value.is_empty()) {
            self.upstream.azure_client_id = client_id;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upstream: UpstreamConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    port: Option<u16>,
    psn_api_base: Option<String>,
    psn_auth_base: Option<String>,
    azure_client_id: Option<String>,
    page_size: Option<usize>,
    rate_limit_delay_ms: Option<u64>,
    max_rate_limit_attempts: Option<u32>,
    http_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = UpstreamConfig::default();
        Self {
            port: value.port.unwrap_or(DEFAULT_PORT),
            upstream: UpstreamConfig {
                psn_api_base: value.psn_api_base.unwrap_or(defaults.psn_api_base),
                psn_auth_base: value.psn_auth_base.unwrap_or(defaults.psn_auth_base),
                azure_client_id: value
                    .azure_client_id
                    .filter(|id| !id.is_empty())
                    .unwrap_or(defaults.azure_client_id.clone()),
                page_size: value.page_size.filter(|size| *size > 0).unwrap_or(defaults.page_size),
                rate_limit_delay: value
                    .rate_limit_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.rate_limit_delay),
                max_rate_limit_attempts: value
                    .max_rate_limit_attempts
                    .filter(|attempts| *attempts > 0)
                    .unwrap_or(defaults.max_rate_limit_attempts),
                http_timeout: value
                    .http_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.http_timeout),
                ..defaults
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
