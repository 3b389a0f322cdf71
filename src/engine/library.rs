//! Library aggregator: owned records from both platforms plus (optionally)
//! the unowned catalog, merged into one deduplicated, filtered, sorted list.

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

use super::{
    catalog_index::{CatalogIndex, base_id},
    model::{CatalogEntry, GameCounts, GameVersion, Platform, PsnTitle, TierCounts, XboxTitle},
    normalize::{normalize_flat, normalize_tiered},
};

/// Which rows the library shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OwnershipMode {
    /// Only rows with at least one owned version.
    #[default]
    Owned,
    /// Only catalog rows the user owns no version of.
    Unowned,
    /// Owned rows and the whole catalog.
    Global,
}

/// Progress-based status filter; a row passes if any version matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    InProgress,
    Completed,
    NotStarted,
}

impl StatusFilter {
    fn matches(self, progress: u8) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::InProgress => progress > 0 && progress < 100,
            StatusFilter::Completed => progress == 100,
            StatusFilter::NotStarted => progress == 0,
        }
    }
}

/// Sort key of the library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortMode {
    Title,
    Progress,
    #[default]
    LastPlayed,
}

/// Direction applied to the sort key; pins and tie-breaks ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Library view options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryOptions {
    pub ownership_mode: OwnershipMode,
    /// Enabled platform labels. Applies to owned and unowned versions alike.
    pub platform_filter: BTreeSet<Platform>,
    pub include_low_quality: bool,
    pub search_text: String,
    pub status_filter: StatusFilter,
    pub sort_mode: SortMode,
    pub sort_direction: SortDirection,
    pub pinned_ids: HashSet<String>,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            ownership_mode: OwnershipMode::default(),
            platform_filter: Platform::ALL.into_iter().collect(),
            include_low_quality: false,
            search_text: String::new(),
            status_filter: StatusFilter::default(),
            sort_mode: SortMode::default(),
            sort_direction: SortDirection::default(),
            pinned_ids: HashSet::new(),
        }
    }
}

/// One library row ("stack"): a canonical game and every version of it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRow {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art_url: Option<String>,
    pub tags: BTreeSet<String>,
    pub versions: Vec<GameVersion>,
    pub pinned: bool,
}

impl LibraryRow {
    fn owns_any(&self) -> bool {
        self.versions.iter().any(|v| v.is_owned)
    }

    /// Highest progress across versions.
    pub fn max_progress(&self) -> u8 {
        self.versions.iter().map(|v| v.progress).max().unwrap_or(0)
    }

    /// Most recent parsable `lastPlayed` across versions.
    pub fn last_played(&self) -> Option<OffsetDateTime> {
        self.versions
            .iter()
            .filter_map(|v| v.last_played.as_deref())
            .filter_map(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
            .max()
    }
}

/// Merge owned records with the catalog into sorted library rows.
pub fn aggregate(
    owned_tiered: &[PsnTitle],
    owned_flat: &[XboxTitle],
    index: &CatalogIndex,
    options: &LibraryOptions,
) -> Vec<LibraryRow> {
    let enabled = |platform: Platform| options.platform_filter.contains(&platform);
    let mut buckets: IndexMap<String, LibraryRow> = IndexMap::new();

    for title in owned_tiered {
        let mut version = normalize_tiered(title);
        if version.id.is_empty() || !enabled(version.platform) {
            continue;
        }
        let entry = index.lookup(&version.id);
        version.master_stats = entry.and_then(|e| e.fallback_stats(&version.id));
        let key = entry
            .map(|e| e.canonical_id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| version.id.clone());
        buckets
            .entry(key)
            .or_insert_with_key(|key| tiered_row(key, title, entry))
            .versions
            .push(version);
    }

    for title in owned_flat {
        let mut version = normalize_flat(title);
        if version.id.is_empty() || !enabled(version.platform) {
            continue;
        }
        let entry = index.lookup(&version.id);
        version.master_stats = entry.and_then(|e| e.fallback_stats(&version.id));
        let key = entry
            .map(|e| e.canonical_id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("xbox_{}", version.id));
        buckets
            .entry(key)
            .or_insert_with_key(|key| flat_row(key, title, entry))
            .versions
            .push(version);
    }

    if options.ownership_mode != OwnershipMode::Owned {
        for entry in index.entries().iter() {
            if entry.canonical_id.is_empty() {
                continue;
            }
            let row = buckets
                .entry(entry.canonical_id.clone())
                .or_insert_with_key(|key| catalog_row(key, entry));
            for variant in entry.all_variants() {
                let present = row
                    .versions
                    .iter()
                    .any(|v| v.id == variant.id || base_id(&v.id) == variant.id);
                if variant.id.is_empty() || present {
                    continue;
                }
                let platform = Platform::normalize(variant.platform.as_deref().unwrap_or_default());
                if !enabled(platform) {
                    continue;
                }
                let stats = variant.stats.or(entry.stats);
                row.versions.push(GameVersion {
                    id: variant.id.clone(),
                    platform,
                    region: variant.region.clone(),
                    progress: 0,
                    last_played: None,
                    counts: GameCounts::tiered(stats.unwrap_or_default(), TierCounts::default()),
                    master_stats: stats,
                    is_owned: false,
                });
            }
        }
    }

    let needle = options.search_text.trim().to_lowercase();
    let mut rows: Vec<LibraryRow> = buckets
        .into_values()
        .filter(|row| !row.versions.is_empty())
        .filter(|row| match options.ownership_mode {
            OwnershipMode::Unowned => !row.owns_any(),
            OwnershipMode::Owned | OwnershipMode::Global => true,
        })
        .filter(|row| options.include_low_quality || !row.tags.contains(super::model::LOW_QUALITY_TAG))
        .filter(|row| needle.is_empty() || row.title.to_lowercase().contains(&needle))
        .filter(|row| row.versions.iter().any(|v| options.status_filter.matches(v.progress)))
        .map(|mut row| {
            row.pinned = row.versions.iter().any(|v| options.pinned_ids.contains(&v.id));
            order_versions(&mut row.versions);
            row
        })
        .collect();

    rows.sort_by(|a, b| compare_rows(a, b, options.sort_mode, options.sort_direction));
    rows
}

/// PS5 versions first; the remaining order is left as inserted.
fn order_versions(versions: &mut [GameVersion]) {
    versions.sort_by_key(|v| v.platform != Platform::Ps5);
}

fn compare_rows(a: &LibraryRow, b: &LibraryRow, mode: SortMode, direction: SortDirection) -> Ordering {
    let by_mode = match mode {
        SortMode::Title => compare_titles(a, b),
        SortMode::Progress => a.max_progress().cmp(&b.max_progress()),
        SortMode::LastPlayed => a.last_played().cmp(&b.last_played()),
    };
    let by_mode = match direction {
        SortDirection::Asc => by_mode,
        SortDirection::Desc => by_mode.reverse(),
    };
    b.pinned
        .cmp(&a.pinned)
        .then(by_mode)
        .then_with(|| compare_titles(a, b))
        .then_with(|| a.id.cmp(&b.id))
}

fn compare_titles(a: &LibraryRow, b: &LibraryRow) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

fn row(key: &str, title: String, entry: Option<&CatalogEntry>) -> LibraryRow {
    LibraryRow {
        id: key.to_string(),
        title: entry
            .map(|e| e.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or(title),
        icon_url: None,
        art_url: None,
        tags: entry.map(|e| e.tags.clone()).unwrap_or_default(),
        versions: Vec::new(),
        pinned: false,
    }
}

fn tiered_row(key: &str, title: &PsnTitle, entry: Option<&CatalogEntry>) -> LibraryRow {
    let art = entry.map(|e| &e.art);
    let icon_url = art
        .and_then(|a| a.store_square.clone())
        .or_else(|| title.trophy_title_icon_url.clone())
        .or_else(|| art.and_then(|a| a.icon.clone()))
        .or_else(|| art.and_then(|a| a.square.clone()));
    let art_url = art
        .and_then(|a| a.hero.clone())
        .or_else(|| title.game_art_url.clone())
        .or_else(|| art.and_then(|a| a.master.clone()))
        .or_else(|| icon_url.clone());
    LibraryRow {
        icon_url,
        art_url,
        ..row(key, title.trophy_title_name.clone(), entry)
    }
}

fn flat_row(key: &str, title: &XboxTitle, entry: Option<&CatalogEntry>) -> LibraryRow {
    let icon_url = title
        .display_image
        .clone()
        .or_else(|| entry.and_then(|e| e.art.icon.clone()));
    LibraryRow {
        art_url: icon_url.clone(),
        icon_url,
        ..row(key, title.name.clone(), entry)
    }
}

fn catalog_row(key: &str, entry: &CatalogEntry) -> LibraryRow {
    let art = &entry.art;
    let icon_url = art
        .store_square
        .clone()
        .or_else(|| art.square.clone())
        .or_else(|| art.icon.clone())
        .or_else(|| entry.icon_url.clone());
    let art_url = art
        .hero
        .clone()
        .or_else(|| art.master.clone())
        .or_else(|| icon_url.clone());
    LibraryRow {
        icon_url,
        art_url,
        ..row(key, entry.display_name.clone(), Some(entry))
    }
}
