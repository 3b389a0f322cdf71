//! Background poller that detects newly earned trophies.

use std::{sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::upstream::{UpstreamResult, psn::TrophySummary};

use super::refresh::ApiClient;

/// Default polling period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Foreground state reported by the host application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppActivity {
    #[default]
    Active,
    Inactive,
    Background,
}

/// What a single summary observation meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First total seen; nothing to compare against.
    Baselined(u32),
    /// Total not above the baseline.
    Unchanged,
    /// Total rose past the baseline, which now equals `current`.
    Triggered { previous: u32, current: u32 },
}

/// Last known earned total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Baseline {
    total: Option<u32>,
}

impl Baseline {
    /// Compare `total` with the baseline and advance it on increase.
    pub fn observe(&mut self, total: u32) -> Observation {
        match self.total {
            None => {
                self.total = Some(total);
                Observation::Baselined(total)
            }
            Some(previous) if total > previous => {
                self.total = Some(total);
                Observation::Triggered {
                    previous,
                    current: total,
                }
            }
            Some(_) => Observation::Unchanged,
        }
    }

    /// Adopt `total` directly, e.g. after a manual refresh.
    pub fn override_with(&mut self, total: u32) {
        self.total = Some(total);
    }

    /// Current baseline, if any.
    pub fn current(&self) -> Option<u32> {
        self.total
    }
}

/// Source of the account-wide earned total.
pub trait SummarySource: Send + Sync {
    /// Earned trophy total across all tiers.
    fn earned_total<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, UpstreamResult<u32>>;
}

impl SummarySource for ApiClient {
    fn earned_total<'a>(&'a self, account_id: &'a str) -> BoxFuture<'a, UpstreamResult<u32>> {
        async move {
            let summary: TrophySummary = self
                .get_json(&format!("/api/user/summary/{account_id}"))
                .await?;
            Ok(summary.earned_trophies.total())
        }
        .boxed()
    }
}

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Observed(Observation),
    /// Authorization expired; this cycle is skipped without touching the baseline.
    Paused,
    /// Transient failure; retry on the next tick.
    Failed,
}

/// Invoked with `(previous, current)` whenever new trophies are detected.
pub type DetectionHandler = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Fetch the summary once and fold it into `baseline`.
pub async fn poll_once(
    source: &dyn SummarySource,
    account_id: &str,
    baseline: &Mutex<Baseline>,
) -> PollOutcome {
    match source.earned_total(account_id).await {
        Ok(total) => PollOutcome::Observed(baseline.lock().await.observe(total)),
        Err(err) if err.is_auth_expired() => {
            info!("summary poll unauthorized; skipping this cycle");
            PollOutcome::Paused
        }
        Err(err) => {
            warn!(error = %err, "summary poll failed");
            PollOutcome::Failed
        }
    }
}

/// Inputs that decide whether the watchdog runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchdogDeps {
    pub access_token: Option<String>,
    pub account_id: Option<String>,
    /// Initial data has loaded.
    pub ready: bool,
}

struct RunningWatchdog {
    access_token: String,
    account_id: String,
    handle: JoinHandle<()>,
}

/// Owns the polling task and restarts it whenever its dependencies change.
pub struct WatchdogSupervisor {
    source: Arc<dyn SummarySource>,
    baseline: Arc<Mutex<Baseline>>,
    interval: Duration,
    activity: watch::Receiver<AppActivity>,
    on_detect: DetectionHandler,
    running: Option<RunningWatchdog>,
}

impl WatchdogSupervisor {
    /// Stopped supervisor; call [`WatchdogSupervisor::reconfigure`] to start it.
    pub fn new(
        source: Arc<dyn SummarySource>,
        interval: Duration,
        activity: watch::Receiver<AppActivity>,
        on_detect: DetectionHandler,
    ) -> Self {
        Self {
            source,
            baseline: Arc::new(Mutex::new(Baseline::default())),
            interval,
            activity,
            on_detect,
            running: None,
        }
    }

    /// Apply new dependencies. Returns whether a poller is running afterwards.
    pub async fn reconfigure(&mut self, deps: WatchdogDeps) -> bool {
        let WatchdogDeps {
            access_token: Some(access_token),
            account_id: Some(account_id),
            ready: true,
        } = deps
        else {
            self.stop();
            return false;
        };

        if let Some(running) = &self.running {
            let unchanged =
                running.access_token == access_token && running.account_id == account_id;
            if unchanged && !running.handle.is_finished() {
                return true;
            }
            if running.account_id != account_id {
                *self.baseline.lock().await = Baseline::default();
            }
        }
        self.stop();

        let run_id = Uuid::new_v4();
        let span = info_span!("trophy_watchdog", %run_id, %account_id);
        let handle = tokio::spawn(
            run(
                self.source.clone(),
                account_id.clone(),
                self.baseline.clone(),
                self.interval,
                self.activity.clone(),
                self.on_detect.clone(),
            )
            .instrument(span),
        );
        self.running = Some(RunningWatchdog {
            access_token,
            account_id,
            handle,
        });
        true
    }

    /// Abort the poller, if any.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
            debug!(account_id = %running.account_id, "watchdog stopped");
        }
    }

    /// Whether a poller task is alive.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Adopt a known total so a manual refresh does not re-trigger.
    pub async fn override_baseline(&self, total: u32) {
        self.baseline.lock().await.override_with(total);
    }

    /// Current baseline.
    pub async fn baseline(&self) -> Option<u32> {
        self.baseline.lock().await.current()
    }
}

impl Drop for WatchdogSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    source: Arc<dyn SummarySource>,
    account_id: String,
    baseline: Arc<Mutex<Baseline>>,
    interval: Duration,
    activity: watch::Receiver<AppActivity>,
    on_detect: DetectionHandler,
) {
    info!("watchdog started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_activity = *activity.borrow();
    let mut activity = Some(activity);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(now) = next_activity(&mut activity) => {
                let resumed = last_activity != AppActivity::Active && now == AppActivity::Active;
                last_activity = now;
                if !resumed {
                    continue;
                }
                debug!("app returned to foreground; polling now");
            }
        }

        match poll_once(source.as_ref(), &account_id, &baseline).await {
            PollOutcome::Observed(Observation::Triggered { previous, current }) => {
                info!(previous, current, "new trophies detected");
                on_detect(previous, current);
            }
            PollOutcome::Observed(Observation::Baselined(total)) => {
                debug!(total, "watchdog baseline established");
            }
            PollOutcome::Observed(Observation::Unchanged)
            | PollOutcome::Paused
            | PollOutcome::Failed => {}
        }
    }
}

/// Next foreground state; never resolves once the sender is gone.
async fn next_activity(receiver: &mut Option<watch::Receiver<AppActivity>>) -> Option<AppActivity> {
    let Some(rx) = receiver.as_mut() else {
        return std::future::pending().await;
    };
    if rx.changed().await.is_ok() {
        Some(*rx.borrow_and_update())
    } else {
        *receiver = None;
        std::future::pending().await
    }
}
