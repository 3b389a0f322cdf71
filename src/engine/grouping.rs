//! Base game vs DLC grouping of a resolved trophy list.

use std::{cmp::Ordering, collections::BTreeMap};

use super::{
    model::{RawTrophyGroup, TierCounts, Trophy, TrophyGroup},
    normalize::percent,
};

/// Group ids that denote the base game.
pub const BASE_GROUP_IDS: [&str; 3] = ["default", "0", "-1"];

/// Group assigned to trophies that carry no group tag.
const UNTAGGED_GROUP_ID: &str = "default";

/// Whether `group_id` is one of the base game sentinels.
pub fn is_base_group(group_id: &str) -> bool {
    BASE_GROUP_IDS.contains(&group_id.trim())
}

/// Display name: explicit fields first, then the sentinel default.
pub fn group_name(group: &RawTrophyGroup) -> String {
    [&group.trophy_group_name, &group.group_name, &group.name]
        .into_iter()
        .flatten()
        .map(|name| name.trim())
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_group_name(&group.trophy_group_id))
}

fn default_group_name(group_id: &str) -> String {
    if is_base_group(group_id) {
        "Base Game".to_string()
    } else {
        format!("DLC {}", group_id.trim())
    }
}

/// Group `trophies` using live groups, else catalog groups.
///
/// Returns `None` when no group metadata exists or when fewer than two
/// non-empty groups remain.
pub fn group(
    raw_groups: Option<&[RawTrophyGroup]>,
    catalog_groups: Option<&[RawTrophyGroup]>,
    trophies: &[Trophy],
) -> Option<Vec<TrophyGroup>> {
    let groups = raw_groups
        .filter(|groups| !groups.is_empty())
        .or_else(|| catalog_groups.filter(|groups| !groups.is_empty()))?;

    let has_membership = groups
        .iter()
        .any(|g| g.trophy_ids.as_ref().is_some_and(|ids| !ids.is_empty()));

    let mut resolved: Vec<TrophyGroup> = if has_membership {
        groups
            .iter()
            .filter_map(|g| {
                let ids = g.trophy_ids.as_deref().unwrap_or_default();
                let members: Vec<Trophy> = trophies
                    .iter()
                    .filter(|t| ids.contains(&t.trophy_id))
                    .cloned()
                    .collect();
                build_group(g, members)
            })
            .collect()
    } else {
        self_heal(groups, trophies)
    };

    resolved.sort_by(|a, b| {
        b.is_base_game
            .cmp(&a.is_base_game)
            .then_with(|| natural_cmp(&a.id, &b.id))
    });

    (resolved.len() > 1).then_some(resolved)
}

/// Rebuild membership from each trophy's own group tag, keeping any
/// supplied descriptor whose id matches.
fn self_heal(groups: &[RawTrophyGroup], trophies: &[Trophy]) -> Vec<TrophyGroup> {
    let mut buckets: BTreeMap<String, Vec<Trophy>> = BTreeMap::new();
    for trophy in trophies {
        let tag = trophy
            .trophy_group_id
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .unwrap_or(UNTAGGED_GROUP_ID);
        buckets.entry(tag.to_string()).or_default().push(trophy.clone());
    }

    buckets
        .into_iter()
        .filter_map(|(id, members)| {
            let descriptor = groups
                .iter()
                .find(|g| g.trophy_group_id.trim() == id)
                .cloned()
                .unwrap_or_else(|| RawTrophyGroup {
                    trophy_group_id: id,
                    ..RawTrophyGroup::default()
                });
            build_group(&descriptor, members)
        })
        .collect()
}

fn build_group(descriptor: &RawTrophyGroup, members: Vec<Trophy>) -> Option<TrophyGroup> {
    if members.is_empty() {
        return None;
    }
    let mut counts = TierCounts::default();
    let mut earned_counts = TierCounts::default();
    for trophy in &members {
        counts.bump(trophy.trophy_type);
        if trophy.earned {
            earned_counts.bump(trophy.trophy_type);
        }
    }
    let name = group_name(descriptor);
    let id = match descriptor.trophy_group_id.trim() {
        "" => name.clone(),
        id => id.to_string(),
    };
    Some(TrophyGroup {
        is_base_game: is_base_group(&id),
        progress: percent(earned_counts.total(), members.len() as u32),
        id,
        name,
        icon_url: descriptor.trophy_group_icon_url.clone(),
        trophies: members,
        counts,
        earned_counts,
    })
}

/// Case-insensitive comparison treating digit runs as numbers (`"2" < "10"`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let l_trim = l_num.trim_start_matches('0');
                let r_trim = r_num.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::TrophyTier;

    fn trophy(id: u32, tier: TrophyTier, earned: bool, group: Option<&str>) -> Trophy {
        Trophy {
            trophy_id: id,
            trophy_type: tier,
            earned,
            trophy_group_id: group.map(str::to_string),
            ..Trophy::default()
        }
    }

    fn raw(id: &str, ids: Option<Vec<u32>>) -> RawTrophyGroup {
        RawTrophyGroup {
            trophy_group_id: id.into(),
            trophy_ids: ids,
            ..RawTrophyGroup::default()
        }
    }

    #[test]
    fn zero_or_single_group_is_none() {
        let trophies = vec![trophy(0, TrophyTier::Gold, true, Some("default"))];
        assert!(group(None, None, &trophies).is_none());
        assert!(group(Some(&[]), Some(&[]), &trophies).is_none());
        let single = [raw("default", Some(vec![0]))];
        assert!(group(Some(&single), None, &trophies).is_none());
    }

    #[test]
    fn membership_groups_sort_base_first_then_natural() {
        let trophies = vec![
            trophy(0, TrophyTier::Platinum, true, None),
            trophy(1, TrophyTier::Bronze, true, None),
            trophy(2, TrophyTier::Bronze, false, None),
            trophy(3, TrophyTier::Gold, false, None),
            trophy(4, TrophyTier::Silver, true, None),
        ];
        let groups = [
            raw("010", Some(vec![4])),
            raw("002", Some(vec![3])),
            raw("default", Some(vec![0, 1, 2])),
            raw("003", Some(vec![99])),
        ];
        let result = group(Some(&groups), None, &trophies).unwrap();
        let ids: Vec<&str> = result.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["default", "002", "010"]);

        let base = &result[0];
        assert!(base.is_base_game);
        assert_eq!(base.name, "Base Game");
        assert_eq!(base.counts.bronze, 2);
        assert_eq!(base.earned_counts.platinum, 1);
        assert_eq!(base.progress, 67);
        assert_eq!(result[1].name, "DLC 002");
        assert_eq!(result[1].progress, 0);
    }

    #[test]
    fn live_groups_take_precedence_over_catalog() {
        let trophies = vec![
            trophy(0, TrophyTier::Bronze, false, None),
            trophy(1, TrophyTier::Bronze, false, None),
        ];
        let live = [
            RawTrophyGroup {
                trophy_group_name: Some("Main".into()),
                ..raw("0", Some(vec![0]))
            },
            raw("001", Some(vec![1])),
        ];
        let catalog = [raw("default", Some(vec![0, 1])), raw("009", Some(vec![1]))];
        let result = group(Some(&live), Some(&catalog), &trophies).unwrap();
        assert_eq!(result[0].name, "Main");
        assert_eq!(result[1].id, "001");
    }

    #[test]
    fn self_heals_from_trophy_tags() {
        let trophies = vec![
            trophy(0, TrophyTier::Bronze, true, Some("default")),
            trophy(1, TrophyTier::Bronze, false, None),
            trophy(2, TrophyTier::Gold, true, Some("001")),
        ];
        let groups = [RawTrophyGroup {
            name: Some("Expansion".into()),
            ..raw("001", None)
        }];
        let result = group(Some(&groups), None, &trophies).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "default");
        assert_eq!(result[0].trophies.len(), 2);
        assert_eq!(result[1].name, "Expansion");
        assert_eq!(result[1].progress, 100);
    }

    #[test]
    fn name_precedence() {
        let mut g = raw("-1", None);
        assert_eq!(group_name(&g), "Base Game");
        g.name = Some("n".into());
        g.group_name = Some("gn".into());
        assert_eq!(group_name(&g), "gn");
        g.trophy_group_name = Some("tgn".into());
        assert_eq!(group_name(&g), "tgn");
        assert_eq!(group_name(&raw("7", None)), "DLC 7");
    }

    #[test]
    fn natural_ordering() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("dlc9", "DLC10"), Ordering::Less);
        assert_eq!(natural_cmp("001", "1"), Ordering::Equal);
        assert_eq!(natural_cmp("b", "A"), Ordering::Greater);
    }
}
