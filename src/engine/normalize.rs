//! Per-platform normalizers: raw owned records into [`GameVersion`].

use super::model::{GameCounts, GameVersion, Platform, PsnTitle, RawTitleRecord, XboxTitle};

/// Normalize any raw owned record.
pub fn normalize(record: &RawTitleRecord) -> GameVersion {
    match record {
        RawTitleRecord::Tiered(title) => normalize_tiered(title),
        RawTitleRecord::Flat(title) => normalize_flat(title),
    }
}

/// Tiered platform: tier counts map one to one, earned capped by defined.
pub fn normalize_tiered(title: &PsnTitle) -> GameVersion {
    GameVersion {
        id: title.np_communication_id.trim().to_string(),
        platform: Platform::normalize(&title.trophy_title_platform),
        region: None,
        progress: title.progress.min(100),
        last_played: title
            .last_updated_date_time
            .clone()
            .or_else(|| title.earned_date_time.clone()),
        counts: GameCounts::tiered(title.defined_trophies, title.earned_trophies),
        master_stats: None,
        is_owned: true,
    }
}

/// Flat platform: gamerscore goes into `earned`/`total`, tiers stay at zero.
///
/// `last_played` stays empty when upstream has no timestamp so the library
/// sorts the title as oldest rather than newest.
pub fn normalize_flat(title: &XboxTitle) -> GameVersion {
    let summary = &title.achievement;
    GameVersion {
        id: title.title_id.trim().to_string(),
        platform: Platform::Xbox,
        region: None,
        progress: clamp_percent(summary.progress_percentage),
        last_played: title.last_unlock.clone().or_else(|| {
            title
                .title_history
                .as_ref()
                .and_then(|history| history.last_time_played.clone())
        }),
        counts: GameCounts::flat(
            summary.current_gamerscore.min(summary.total_gamerscore),
            summary.total_gamerscore,
        ),
        master_stats: None,
        is_owned: true,
    }
}

/// Round a percentage into `0..=100`, mapping NaN to zero.
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// `round(earned / total * 100)`, zero when nothing is defined.
pub fn percent(earned: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    clamp_percent(f64::from(earned) / f64::from(total) * 100.0)
}
