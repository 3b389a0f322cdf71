//! Game identifier: one raw id into a [`UnifiedGame`] for the detail screen.
//!
//! Everything is recomputed from the inputs on every call; a fresh owned
//! snapshot after a refresh changes the result without any invalidation.

use super::{
    catalog_index::{CatalogIndex, base_id},
    model::{
        CatalogEntry, GameSource, Gamerscore, OwnedRecords, PsnTitle, TierCounts, UnifiedGame,
        XboxTitle,
    },
    normalize::clamp_percent,
};

/// Platform label shown for catalog-only identifications without a variant label.
const DEFAULT_MASTER_PLATFORM: &str = "PlayStation";

/// Outcome of [`identify`]. Both halves empty means "unknown game".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identification {
    pub unified: Option<UnifiedGame>,
    pub catalog_entry: Option<CatalogEntry>,
}

impl Identification {
    /// Neither ownership nor catalog matched.
    pub fn is_unknown(&self) -> bool {
        self.unified.is_none()
    }
}

/// Resolve `raw_id` against the catalog and the owned records.
///
/// Precedence: owned tiered record (full or base id), owned flat record
/// (full id), then a zero-progress catalog placeholder.
pub fn identify(raw_id: &str, index: &CatalogIndex, owned: &OwnedRecords) -> Identification {
    let clean_id = raw_id.trim();
    if clean_id.is_empty() {
        return Identification::default();
    }
    let base = base_id(clean_id);
    let catalog_entry = index.lookup(clean_id).cloned();

    if let Some(title) = find_tiered(&owned.tiered, clean_id, base) {
        return Identification {
            unified: Some(from_tiered(title, catalog_entry.clone())),
            catalog_entry,
        };
    }

    if let Some(title) = owned.flat.iter().find(|t| t.title_id.trim() == clean_id) {
        return Identification {
            unified: Some(from_flat(title, catalog_entry.clone())),
            catalog_entry,
        };
    }

    let unified = catalog_entry
        .as_ref()
        .map(|entry| from_catalog(clean_id, entry));
    Identification {
        unified,
        catalog_entry,
    }
}

fn find_tiered<'a>(titles: &'a [PsnTitle], clean_id: &str, base: &str) -> Option<&'a PsnTitle> {
    titles
        .iter()
        .find(|t| t.np_communication_id.trim() == clean_id)
        .or_else(|| titles.iter().find(|t| t.np_communication_id.trim() == base))
}

fn from_tiered(title: &PsnTitle, master: Option<CatalogEntry>) -> UnifiedGame {
    UnifiedGame {
        source: GameSource::User,
        id: title.np_communication_id.clone(),
        title: title.trophy_title_name.clone(),
        platform: title.trophy_title_platform.clone(),
        icon_url: title.trophy_title_icon_url.clone(),
        trophy_list: title.trophies.clone(),
        defined_trophies: title.defined_trophies,
        earned_trophies: title.earned_trophies.capped_by(&title.defined_trophies),
        progress: title.progress.min(100),
        gamerscore: None,
        master_data: master,
    }
}

fn from_flat(title: &XboxTitle, master: Option<CatalogEntry>) -> UnifiedGame {
    let summary = &title.achievement;
    UnifiedGame {
        source: GameSource::Xbox,
        id: title.title_id.clone(),
        title: title.name.clone(),
        platform: "XBOX".into(),
        icon_url: title.display_image.clone(),
        trophy_list: Vec::new(),
        defined_trophies: TierCounts::default(),
        earned_trophies: TierCounts::default(),
        progress: clamp_percent(summary.progress_percentage),
        gamerscore: Some(Gamerscore {
            earned: summary.current_gamerscore,
            total: summary.total_gamerscore,
        }),
        master_data: master,
    }
}

fn from_catalog(clean_id: &str, entry: &CatalogEntry) -> UnifiedGame {
    let platform = entry
        .variant(clean_id)
        .or_else(|| entry.variant(base_id(clean_id)))
        .and_then(|variant| variant.platform.clone())
        .unwrap_or_else(|| DEFAULT_MASTER_PLATFORM.to_string());
    let defined = entry
        .variant(clean_id)
        .or_else(|| entry.variant(base_id(clean_id)))
        .and_then(|variant| variant.stats)
        .or(entry.stats)
        .unwrap_or_default();

    UnifiedGame {
        source: GameSource::Master,
        id: clean_id.to_string(),
        title: entry.display_name.clone(),
        platform,
        icon_url: entry
            .icon_url
            .clone()
            .or_else(|| entry.art.icon.clone())
            .or_else(|| entry.art.store_square.clone()),
        trophy_list: entry.trophies.iter().map(|t| t.to_unearned()).collect(),
        defined_trophies: defined,
        earned_trophies: TierCounts::default(),
        progress: 0,
        gamerscore: None,
        master_data: Some(entry.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{CatalogTrophy, VariantRecord, XboxAchievementSummary};
    use std::sync::Arc;

    fn catalog() -> CatalogIndex {
        let mut entry = CatalogEntry {
            canonical_id: "g1".into(),
            display_name: "Game One".into(),
            stats: Some(TierCounts {
                bronze: 5,
                ..TierCounts::default()
            }),
            trophies: vec![CatalogTrophy {
                id: 0,
                name: Some("First".into()),
                tier: Some("gold".into()),
                ..CatalogTrophy::default()
            }],
            ..CatalogEntry::default()
        };
        entry.platforms.insert(
            "playstation".into(),
            vec![
                VariantRecord {
                    id: "A".into(),
                    platform: Some("PS4".into()),
                    stats: Some(TierCounts {
                        bronze: 9,
                        gold: 1,
                        ..TierCounts::default()
                    }),
                    ..VariantRecord::default()
                },
                VariantRecord {
                    id: "B".into(),
                    platform: Some("PS5".into()),
                    ..VariantRecord::default()
                },
            ],
        );
        CatalogIndex::build(Arc::new(vec![entry]))
    }

    fn owned_b(progress: u8) -> OwnedRecords {
        OwnedRecords {
            tiered: vec![PsnTitle {
                np_communication_id: "B".into(),
                trophy_title_name: "Game One".into(),
                trophy_title_platform: "PS5".into(),
                progress,
                ..PsnTitle::default()
            }],
            flat: Vec::new(),
        }
    }

    #[test]
    fn unowned_variant_is_master_with_zero_progress() {
        let result = identify("A", &catalog(), &owned_b(40));
        let unified = result.unified.unwrap();
        assert_eq!(unified.source, GameSource::Master);
        assert_eq!(unified.progress, 0);
        assert_eq!(unified.platform, "PS4");
        assert_eq!(unified.defined_trophies.bronze, 9);
        assert!(unified.trophy_list.iter().all(|t| !t.earned));
        assert_eq!(result.catalog_entry.unwrap().canonical_id, "g1");
    }

    #[test]
    fn owned_record_wins_over_catalog() {
        let result = identify("B", &catalog(), &owned_b(40));
        let unified = result.unified.unwrap();
        assert_eq!(unified.source, GameSource::User);
        assert_eq!(unified.progress, 40);
        assert!(unified.master_data.is_some());
    }

    #[test]
    fn base_id_matches_owned_tiered_record() {
        let result = identify(" B_00 ", &catalog(), &owned_b(10));
        assert_eq!(result.unified.unwrap().source, GameSource::User);
    }

    #[test]
    fn flat_ownership_requires_full_id() {
        let owned = OwnedRecords {
            tiered: Vec::new(),
            flat: vec![XboxTitle {
                title_id: "777".into(),
                name: "Halo".into(),
                achievement: XboxAchievementSummary {
                    current_gamerscore: 50,
                    total_gamerscore: 1000,
                    progress_percentage: 5.0,
                    ..XboxAchievementSummary::default()
                },
                ..XboxTitle::default()
            }],
        };
        let hit = identify("777", &catalog(), &owned).unified.unwrap();
        assert_eq!(hit.source, GameSource::Xbox);
        assert_eq!(hit.gamerscore, Some(Gamerscore { earned: 50, total: 1000 }));
        assert!(identify("777_1", &catalog(), &owned).is_unknown());
    }

    #[test]
    fn reflects_new_owned_snapshot() {
        let index = catalog();
        assert_eq!(identify("B", &index, &owned_b(40)).unified.unwrap().progress, 40);
        assert_eq!(identify("B", &index, &owned_b(85)).unified.unwrap().progress, 85);
    }

    #[test]
    fn unknown_id_is_not_an_error() {
        let result = identify("NOPE", &catalog(), &OwnedRecords::default());
        assert!(result.is_unknown());
        assert!(result.catalog_entry.is_none());
        assert!(identify("   ", &catalog(), &OwnedRecords::default()).is_unknown());
    }
}
