//! Aggregate statistics over the owned tiered titles.

use serde::Serialize;
use utoipa::ToSchema;

use super::model::{PsnTitle, TierCounts};

/// Earned trophies per tier across every owned tiered title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(flatten)]
    pub earned: TierCounts,
    pub total: u32,
}

/// Sum earned tier counts across `titles`.
pub fn user_stats(titles: &[PsnTitle]) -> UserStats {
    let mut earned = TierCounts::default();
    for title in titles {
        earned += title.earned_trophies;
    }
    UserStats {
        total: earned.total(),
        earned,
    }
}
