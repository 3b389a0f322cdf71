//! Data model shared by the identity resolution and merge engine.
//!
//! Raw upstream shapes ([`PsnTitle`], [`XboxTitle`], [`Trophy`],
//! [`RawTrophyGroup`]) default every missing or `null` count to zero at
//! deserialization time so nothing past the normalizer boundary has to care
//! about partial payloads.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;

/// Tag used by the catalog curators to flag low quality releases.
pub const LOW_QUALITY_TAG: &str = "shovelware";

/// Trophy grade on the tiered platform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TrophyTier {
    /// Lowest grade, also used for unknown grades.
    #[default]
    Bronze,
    /// Second grade.
    Silver,
    /// Third grade.
    Gold,
    /// Completion trophy.
    Platinum,
}

impl TrophyTier {
    /// All tiers in ascending order.
    pub const ALL: [TrophyTier; 4] = [
        TrophyTier::Bronze,
        TrophyTier::Silver,
        TrophyTier::Gold,
        TrophyTier::Platinum,
    ];

    /// Parse a tier label, treating anything unknown as bronze.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "silver" => TrophyTier::Silver,
            "gold" => TrophyTier::Gold,
            "platinum" => TrophyTier::Platinum,
            _ => TrophyTier::Bronze,
        }
    }
}

impl From<String> for TrophyTier {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Count of trophies per tier.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TierCounts {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub bronze: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub silver: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub gold: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub platinum: u32,
}

impl TierCounts {
    /// Sum across every tier, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.bronze
            .saturating_add(self.silver)
            .saturating_add(self.gold)
            .saturating_add(self.platinum)
    }

    /// Count for a single tier.
    pub fn get(&self, tier: TrophyTier) -> u32 {
        match tier {
            TrophyTier::Bronze => self.bronze,
            TrophyTier::Silver => self.silver,
            TrophyTier::Gold => self.gold,
            TrophyTier::Platinum => self.platinum,
        }
    }

    /// Increment the counter for `tier`.
    pub fn bump(&mut self, tier: TrophyTier) {
        match tier {
            TrophyTier::Bronze => self.bronze = self.bronze.saturating_add(1),
            TrophyTier::Silver => self.silver = self.silver.saturating_add(1),
            TrophyTier::Gold => self.gold = self.gold.saturating_add(1),
            TrophyTier::Platinum => self.platinum = self.platinum.saturating_add(1),
        }
    }

    /// Clamp every tier to the matching tier in `defined`.
    pub fn capped_by(&self, defined: &TierCounts) -> TierCounts {
        TierCounts {
            bronze: self.bronze.min(defined.bronze),
            silver: self.silver.min(defined.silver),
            gold: self.gold.min(defined.gold),
            platinum: self.platinum.min(defined.platinum),
        }
    }
}

impl std::ops::AddAssign for TierCounts {
    fn add_assign(&mut self, rhs: Self) {
        // Counts come from upstream JSON; never panic on absurd values.
        self.bronze = self.bronze.saturating_add(rhs.bronze);
        self.silver = self.silver.saturating_add(rhs.silver);
        self.gold = self.gold.saturating_add(rhs.gold);
        self.platinum = self.platinum.saturating_add(rhs.platinum);
    }
}

/// A single trophy as returned by the per-title endpoints.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trophy {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_icon_url: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_type: TrophyTier,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_hidden: bool,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub earned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_date_time: Option<String>,
    /// Share of players owning the trophy, as a decimal string (e.g. `"12.5"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_earned_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_group_id: Option<String>,
}

/// Trophy definition embedded in a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrophy {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default, rename = "type")]
    pub tier: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl CatalogTrophy {
    /// Project the catalog definition into an unearned [`Trophy`].
    pub fn to_unearned(&self) -> Trophy {
        Trophy {
            trophy_id: self.id,
            trophy_name: self.name.clone(),
            trophy_detail: self.detail.clone(),
            trophy_icon_url: self.icon_url.clone(),
            trophy_type: self
                .tier
                .as_deref()
                .map(TrophyTier::parse)
                .unwrap_or_default(),
            trophy_hidden: false,
            earned: false,
            earned_date_time: None,
            trophy_earned_rate: Some(self.rarity.clone().unwrap_or_else(|| "0.0".into())),
            trophy_group_id: self.group_id.clone(),
        }
    }
}

/// Group (base game or DLC) descriptor as delivered by upstream or the catalog.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawTrophyGroup {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_group_icon_url: Option<String>,
    /// Explicit membership list. Missing on most live responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_ids: Option<Vec<u32>>,
}

/// Artwork references carried by a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<String>,
    #[serde(default, alias = "storesquare", skip_serializing_if = "Option::is_none")]
    pub store_square: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,
}

/// One platform/region release of a canonical game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Fallback trophy counts used when no per-user data exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TierCounts>,
}

/// Canonical game record from the curated catalog.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub canonical_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub art: ArtSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TierCounts>,
    /// Variants keyed by platform family (e.g. `playstation`, `xbox`).
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub platforms: BTreeMap<String, Vec<VariantRecord>>,
    /// Flat variant list used by catalog documents that predate `platforms`.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantRecord>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_groups: Option<Vec<RawTrophyGroup>>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trophies: Vec<CatalogTrophy>,
}

impl CatalogEntry {
    /// Every variant of the entry: the per-platform map first (in key order),
    /// then the legacy flat list.
    pub fn all_variants(&self) -> impl Iterator<Item = &VariantRecord> {
        self.platforms.values().flatten().chain(self.variants.iter())
    }

    /// Variant whose id matches `id` exactly.
    pub fn variant(&self, id: &str) -> Option<&VariantRecord> {
        self.all_variants().find(|variant| variant.id == id)
    }

    /// Fallback stats for `variant_id`: the variant's own stats, else the entry's.
    pub fn fallback_stats(&self, variant_id: &str) -> Option<TierCounts> {
        self.variant(variant_id)
            .and_then(|variant| variant.stats)
            .or(self.stats)
    }

    /// Whether curators flagged the entry as low quality.
    pub fn is_low_quality(&self) -> bool {
        self.tags.contains(LOW_QUALITY_TAG)
    }
}

/// Owned title record from the tiered platform (trophy list endpoint).
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PsnTitle {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub np_communication_id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_title_name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub trophy_title_platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trophy_title_icon_url: Option<String>,
    /// Large artwork attached by the game-list enrichment pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_art_url: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub defined_trophies: TierCounts,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub earned_trophies: TierCounts,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_date_time: Option<String>,
    /// Full trophy list when the payload embeds one.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trophies: Vec<Trophy>,
}

/// Achievement totals of a flat-platform title.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct XboxAchievementSummary {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub current_achievements: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub total_achievements: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub current_gamerscore: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub total_gamerscore: u32,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub progress_percentage: f64,
}

/// Play history attached to a flat-platform title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct XboxTitleHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time_played: Option<String>,
}

/// Owned title record from the flat (gamerscore) platform.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct XboxTitle {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub title_id: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_image: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub achievement: XboxAchievementSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_unlock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_history: Option<XboxTitleHistory>,
}

/// Raw per-platform owned record, validated at the normalizer boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTitleRecord {
    /// Bronze/silver/gold/platinum platform.
    Tiered(PsnTitle),
    /// Gamerscore platform.
    Flat(XboxTitle),
}

/// The user's owned records on both platforms, replaced wholesale on refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedRecords {
    #[serde(default)]
    pub tiered: Vec<PsnTitle>,
    #[serde(default)]
    pub flat: Vec<XboxTitle>,
}

impl OwnedRecords {
    /// Whether neither platform has any record.
    pub fn is_empty(&self) -> bool {
        self.tiered.is_empty() && self.flat.is_empty()
    }
}

/// Closed set of platform labels used across the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Ps5,
    Ps4,
    Ps3,
    #[serde(rename = "PSVITA")]
    PsVita,
    Xbox,
    Unknown,
}

impl Platform {
    /// Every platform label, in display order.
    pub const ALL: [Platform; 6] = [
        Platform::Ps5,
        Platform::Ps4,
        Platform::Ps3,
        Platform::PsVita,
        Platform::Xbox,
        Platform::Unknown,
    ];

    /// Collapse a free-form platform label (`"PS4 Pro"`, `"PS Vita"`,
    /// `"PS5,PSPC"`) into the closed set.
    pub fn normalize(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        if upper.is_empty() {
            Platform::Unknown
        } else if upper.contains("PS5") {
            Platform::Ps5
        } else if upper.contains("PS4") {
            Platform::Ps4
        } else if upper.contains("VITA") {
            Platform::PsVita
        } else if upper.contains("PS3") {
            Platform::Ps3
        } else if upper.contains("XBOX") {
            Platform::Xbox
        } else {
            Platform::Unknown
        }
    }
}

/// Trophy or achievement counts for one game version.
///
/// Tiered platforms fill the tier fields and leave `earned` empty; flat
/// platforms fill `total`/`earned` with gamerscore and keep every tier at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameCounts {
    pub total: u32,
    pub bronze: u32,
    pub silver: u32,
    pub gold: u32,
    pub platinum: u32,
    pub earned_bronze: u32,
    pub earned_silver: u32,
    pub earned_gold: u32,
    pub earned_platinum: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned: Option<u32>,
}

impl GameCounts {
    /// Build tiered counts from defined and earned tier sets.
    pub fn tiered(defined: TierCounts, earned: TierCounts) -> Self {
        let earned = earned.capped_by(&defined);
        Self {
            total: defined.total(),
            bronze: defined.bronze,
            silver: defined.silver,
            gold: defined.gold,
            platinum: defined.platinum,
            earned_bronze: earned.bronze,
            earned_silver: earned.silver,
            earned_gold: earned.gold,
            earned_platinum: earned.platinum,
            earned: None,
        }
    }

    /// Build flat counts (gamerscore-style) with every tier left at zero.
    pub fn flat(earned: u32, total: u32) -> Self {
        Self {
            total,
            earned: Some(earned),
            ..Self::default()
        }
    }

    /// Earned trophies summed across tiers, or the flat earned value.
    pub fn earned_total(&self) -> u32 {
        self.earned.unwrap_or_else(|| {
            self.earned_bronze
                .saturating_add(self.earned_silver)
                .saturating_add(self.earned_gold)
                .saturating_add(self.earned_platinum)
        })
    }
}

/// Normalized per-platform, per-variant view of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameVersion {
    pub id: String,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Completion percentage in `0..=100`.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<String>,
    pub counts: GameCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_stats: Option<TierCounts>,
    pub is_owned: bool,
}

/// Where a [`UnifiedGame`] got its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameSource {
    /// Owned on the tiered platform; live data.
    User,
    /// Not owned; catalog placeholder.
    Master,
    /// Owned on the flat platform; live data.
    Xbox,
}

/// Gamerscore pair for flat-platform identifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Gamerscore {
    pub earned: u32,
    pub total: u32,
}

/// Result of identifying a single game for the detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedGame {
    pub source: GameSource,
    pub id: String,
    pub title: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub trophy_list: Vec<Trophy>,
    pub defined_trophies: TierCounts,
    pub earned_trophies: TierCounts,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamerscore: Option<Gamerscore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_data: Option<CatalogEntry>,
}

/// Resolved trophy group (base game or one DLC pack).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrophyGroup {
    pub id: String,
    pub name: String,
    pub is_base_game: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub trophies: Vec<Trophy>,
    pub counts: TierCounts,
    pub earned_counts: TierCounts,
    pub progress: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parse_defaults_to_bronze() {
        assert_eq!(TrophyTier::parse("GOLD"), TrophyTier::Gold);
        assert_eq!(TrophyTier::parse(" platinum "), TrophyTier::Platinum);
        assert_eq!(TrophyTier::parse("mystery"), TrophyTier::Bronze);
        assert_eq!(TrophyTier::parse(""), TrophyTier::Bronze);
    }

    #[test]
    fn tier_totals_saturate_instead_of_overflowing() {
        let defined = TierCounts {
            bronze: u32::MAX,
            platinum: 1,
            ..TierCounts::default()
        };
        assert_eq!(defined.total(), u32::MAX);

        let counts = GameCounts::tiered(defined, defined);
        assert_eq!(counts.total, u32::MAX);
        assert_eq!(counts.earned_total(), u32::MAX);

        let mut full = defined;
        full.bump(TrophyTier::Bronze);
        assert_eq!(full.bronze, u32::MAX);
    }

    #[test]
    fn partial_title_payload_defaults_counts() {
        let title: PsnTitle = serde_json::from_str(
            r#"{"npCommunicationId":"NPWR1","definedTrophies":{"bronze":3,"gold":null},"progress":null}"#,
        )
        .unwrap();
        assert_eq!(title.defined_trophies.bronze, 3);
        assert_eq!(title.defined_trophies.gold, 0);
        assert_eq!(title.earned_trophies, TierCounts::default());
        assert_eq!(title.progress, 0);
    }

    #[test]
    fn catalog_entry_accepts_legacy_art_key_and_flat_variants() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{
                "canonicalId": "g1",
                "displayName": "Game",
                "art": {"storesquare": "sq.png"},
                "variants": [{"id": "NPWR9", "platform": "PS3"}],
                "tags": ["shovelware"]
            }"#,
        )
        .unwrap();
        assert_eq!(entry.art.store_square.as_deref(), Some("sq.png"));
        assert_eq!(entry.all_variants().count(), 1);
        assert!(entry.is_low_quality());
    }

    #[test]
    fn trophy_type_tolerates_unknown_and_null() {
        let trophy: Trophy =
            serde_json::from_str(r#"{"trophyId":4,"trophyType":"unobtainium"}"#).unwrap();
        assert_eq!(trophy.trophy_type, TrophyTier::Bronze);
        let trophy: Trophy = serde_json::from_str(r#"{"trophyId":5,"trophyType":null}"#).unwrap();
        assert_eq!(trophy.trophy_type, TrophyTier::Bronze);
    }

    #[test]
    fn platform_normalization_collapses_variants() {
        assert_eq!(Platform::normalize("PS4 Pro"), Platform::Ps4);
        assert_eq!(Platform::normalize("PS5,PSPC"), Platform::Ps5);
        assert_eq!(Platform::normalize("PS Vita"), Platform::PsVita);
        assert_eq!(Platform::normalize("psvita"), Platform::PsVita);
        assert_eq!(Platform::normalize("ps3"), Platform::Ps3);
        assert_eq!(Platform::normalize("Dreamcast"), Platform::Unknown);
        assert_eq!(Platform::normalize(""), Platform::Unknown);
    }
}
