//! Client-side session layer for apps talking to the trophy proxy.

use std::{env, time::Duration};

pub mod credentials;
pub mod detail;
pub mod refresh;
pub mod session;
pub mod watchdog;

pub use credentials::{CredentialStore, MemoryCredentialStore, SessionVault};
pub use refresh::{ApiClient, RefreshError, SessionHooks};
pub use session::{GameDetail, TrophySession};
pub use watchdog::{AppActivity, WatchdogSupervisor};

/// Proxy used when `TROPHY_HUB_PROXY_URL` is unset.
const DEFAULT_PROXY_URL: &str = "http://localhost:4000";

/// Where the proxy lives and how often the watchdog polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub proxy_base_url: String,
    pub watchdog_interval: Duration,
}

impl ClientConfig {
    /// Defaults overridden by `TROPHY_HUB_PROXY_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = env::var("TROPHY_HUB_PROXY_URL")
            .ok()
            .filter(|url| !url.is_empty())
        {
            config.proxy_base_url = url;
        }
        config
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: DEFAULT_PROXY_URL.into(),
            watchdog_interval: watchdog::DEFAULT_INTERVAL,
        }
    }
}
