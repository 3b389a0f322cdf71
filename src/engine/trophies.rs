//! Flat trophy list processing for the detail screen: source selection,
//! search, sorting and rarity classification.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

use super::{
    library::SortDirection,
    model::{CatalogEntry, Trophy, UnifiedGame},
};

/// Which input the processed list was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrophySource {
    /// Per-game fetch with live earned state.
    Api,
    /// Catalog definitions, all unearned.
    Master,
    /// Trophy list embedded in the identification.
    Context,
    /// Nothing available.
    None,
}

/// Sort key of a trophy list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrophySortMode {
    #[default]
    Id,
    Rarity,
    DateEarned,
}

/// Rarity bucket derived from the earned rate percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RarityTier {
    UltraRare,
    VeryRare,
    Rare,
    Common,
}

impl RarityTier {
    /// Classify a percentage string; anything unparsable is common.
    pub fn from_rate(rate: &str) -> Self {
        match rate.trim().parse::<f64>() {
            Ok(p) if p.is_nan() => RarityTier::Common,
            Ok(p) if p <= 5.0 => RarityTier::UltraRare,
            Ok(p) if p <= 15.0 => RarityTier::VeryRare,
            Ok(p) if p <= 50.0 => RarityTier::Rare,
            _ => RarityTier::Common,
        }
    }
}

/// Pick the best available trophy list: live fetch, then catalog
/// definitions, then whatever the identification carried.
pub fn select_source(
    fetched: &[Trophy],
    catalog: Option<&CatalogEntry>,
    unified: Option<&UnifiedGame>,
) -> (TrophySource, Vec<Trophy>) {
    if !fetched.is_empty() {
        return (TrophySource::Api, fetched.to_vec());
    }
    if let Some(entry) = catalog.filter(|entry| !entry.trophies.is_empty()) {
        return (
            TrophySource::Master,
            entry.trophies.iter().map(|t| t.to_unearned()).collect(),
        );
    }
    match unified {
        Some(game) => (TrophySource::Context, game.trophy_list.clone()),
        None => (TrophySource::None, Vec::new()),
    }
}

/// Filter by case-insensitive name and sort.
pub fn process(
    mut trophies: Vec<Trophy>,
    search_text: &str,
    mode: TrophySortMode,
    direction: SortDirection,
) -> Vec<Trophy> {
    let needle = search_text.trim().to_lowercase();
    if !needle.is_empty() {
        trophies.retain(|t| {
            t.trophy_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        });
    }
    let apply = |ord: Ordering| match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };
    match mode {
        TrophySortMode::Id => trophies.sort_by(|a, b| apply(a.trophy_id.cmp(&b.trophy_id))),
        TrophySortMode::Rarity => {
            trophies.sort_by(|a, b| apply(earned_rate(a).total_cmp(&earned_rate(b))))
        }
        TrophySortMode::DateEarned => trophies.sort_by(|a, b| {
            match (earned_at(a), earned_at(b)) {
                (Some(x), Some(y)) => apply(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.trophy_id.cmp(&b.trophy_id))
        }),
    }
    trophies
}

fn earned_rate(trophy: &Trophy) -> f64 {
    trophy
        .trophy_earned_rate
        .as_deref()
        .and_then(|rate| rate.trim().parse::<f64>().ok())
        .filter(|rate| !rate.is_nan())
        .unwrap_or(100.0)
}

fn earned_at(trophy: &Trophy) -> Option<OffsetDateTime> {
    if !trophy.earned {
        return None;
    }
    trophy
        .earned_date_time
        .as_deref()
        .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::CatalogTrophy;

    fn trophy(id: u32, name: &str, rate: Option<&str>, earned_at: Option<&str>) -> Trophy {
        Trophy {
            trophy_id: id,
            trophy_name: Some(name.into()),
            trophy_earned_rate: rate.map(str::to_string),
            earned: earned_at.is_some(),
            earned_date_time: earned_at.map(str::to_string),
            ..Trophy::default()
        }
    }

    #[test]
    fn source_priority() {
        let entry = CatalogEntry {
            trophies: vec![CatalogTrophy {
                id: 3,
                ..CatalogTrophy::default()
            }],
            ..CatalogEntry::default()
        };
        let live = vec![trophy(1, "a", None, None)];
        assert_eq!(select_source(&live, Some(&entry), None).0, TrophySource::Api);
        let (source, list) = select_source(&[], Some(&entry), None);
        assert_eq!(source, TrophySource::Master);
        assert_eq!(list[0].trophy_earned_rate.as_deref(), Some("0.0"));
        assert_eq!(select_source(&[], None, None).0, TrophySource::None);
    }

    #[test]
    fn search_and_rarity_sort() {
        let list = vec![
            trophy(1, "Common Win", Some("80.5"), None),
            trophy(2, "Rare Win", Some("2.1"), None),
            trophy(3, "Mystery", None, None),
            trophy(4, "Another win", Some("30"), None),
        ];
        let sorted = process(list.clone(), "WIN", TrophySortMode::Rarity, SortDirection::Asc);
        let ids: Vec<u32> = sorted.iter().map(|t| t.trophy_id).collect();
        assert_eq!(ids, [2, 4, 1]);

        let sorted = process(list, "", TrophySortMode::Rarity, SortDirection::Desc);
        assert_eq!(sorted[0].trophy_id, 3);
    }

    #[test]
    fn date_sort_keeps_unearned_last() {
        let list = vec![
            trophy(1, "a", None, None),
            trophy(2, "b", None, Some("2023-01-01T00:00:00Z")),
            trophy(3, "c", None, Some("2024-01-01T00:00:00Z")),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sorted = process(list.clone(), "", TrophySortMode::DateEarned, direction);
            assert_eq!(sorted[2].trophy_id, 1);
        }
        let desc = process(list, "", TrophySortMode::DateEarned, SortDirection::Desc);
        assert_eq!(desc[0].trophy_id, 3);
    }

    #[test]
    fn rarity_tiers() {
        assert_eq!(RarityTier::from_rate("4.9"), RarityTier::UltraRare);
        assert_eq!(RarityTier::from_rate("5"), RarityTier::UltraRare);
        assert_eq!(RarityTier::from_rate("15.0"), RarityTier::VeryRare);
        assert_eq!(RarityTier::from_rate("49"), RarityTier::Rare);
        assert_eq!(RarityTier::from_rate("77"), RarityTier::Common);
        assert_eq!(RarityTier::from_rate("n/a"), RarityTier::Common);
    }
}
