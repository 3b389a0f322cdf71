//! Per-title detail fetches that ignore answers for titles no longer on screen.

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;
use tracing::debug;

use crate::upstream::{UpstreamError, UpstreamResult};

/// Identity of one fetch: what it was for and when it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTag {
    pub subject: String,
    pub generation: u64,
}

/// Outcome of a tagged fetch.
#[derive(Debug)]
pub enum DetailOutcome<T> {
    /// Still current; apply it.
    Applied(T),
    /// Superseded by a newer fetch or subject; discard.
    Stale,
    Failed(UpstreamError),
}

/// Tracks the latest fetch so late answers for earlier titles are dropped.
#[derive(Debug, Default)]
pub struct DetailLoader {
    generation: AtomicU64,
    current: RwLock<Option<DetailTag>>,
}

impl DetailLoader {
    /// Fresh loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for `subject`, superseding any in flight.
    pub async fn begin(&self, subject: &str) -> DetailTag {
        let tag = DetailTag {
            subject: subject.to_string(),
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        };
        *self.current.write().await = Some(tag.clone());
        tag
    }

    /// Whether `tag` still names the latest fetch.
    pub async fn is_current(&self, tag: &DetailTag) -> bool {
        self.current.read().await.as_ref() == Some(tag)
    }

    /// Forget the current subject; every outstanding answer becomes stale.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    /// Run `fetch` tagged with `subject`.
    pub async fn load<T, F>(&self, subject: &str, fetch: F) -> DetailOutcome<T>
    where
        F: Future<Output = UpstreamResult<T>>,
    {
        let tag = self.begin(subject).await;
        let result = fetch.await;
        if !self.is_current(&tag).await {
            debug!(subject = %tag.subject, generation = tag.generation, "discarding stale detail");
            return DetailOutcome::Stale;
        }
        match result {
            Ok(value) => DetailOutcome::Applied(value),
            Err(err) => DetailOutcome::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn late_answer_for_previous_title_is_dropped() {
        let loader = DetailLoader::new();
        let slow = loader.load("A", async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok("detail A")
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load("B", async { Ok("detail B") }).await
        };
        let (a, b) = tokio::join!(slow, fast);
        assert!(matches!(a, DetailOutcome::Stale));
        assert!(matches!(b, DetailOutcome::Applied("detail B")));
    }

    #[tokio::test]
    async fn refetching_same_title_supersedes_older_fetch() {
        let loader = DetailLoader::new();
        let first = loader.begin("A").await;
        let second = loader.begin("A").await;
        assert!(!loader.is_current(&first).await);
        assert!(loader.is_current(&second).await);
        loader.clear().await;
        assert!(!loader.is_current(&second).await);
    }

    #[tokio::test]
    async fn failures_are_reported_when_current() {
        let loader = DetailLoader::new();
        let outcome: DetailOutcome<()> = loader
            .load("A", async {
                Err(UpstreamError::NotFound { url: "u".into() })
            })
            .await;
        assert!(matches!(outcome, DetailOutcome::Failed(UpstreamError::NotFound { .. })));
    }
}
