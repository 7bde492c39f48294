//! Summary standardization.
//!
//! Parsers copy header fields as written. This pass turns them into one
//! shape regardless of dialect: a resolved faction, its family, a stable
//! faction key and a point total.

use tracing::debug;

use crate::factions::{detect_chapter, lookup_faction, FactionInfo, SPACE_MARINES};
use crate::models::ArmyList;
use crate::text::name_key;

/// Split a faction keyword into its dash-separated segments.
///
/// `"Imperium - Adeptus Astartes – Ultramarines"` gives three segments.
pub fn faction_segments(keyword: &str) -> Vec<String> {
    keyword
        .replace('–', " - ")
        .split(" - ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the most specific known faction in a keyword, searching from the
/// last segment backwards.
pub fn resolve_faction(keyword: &str) -> Option<&'static FactionInfo> {
    faction_segments(keyword)
        .iter()
        .rev()
        .find_map(|segment| lookup_faction(segment))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Standardize `list.summary` in place.
///
/// - `displayFaction` becomes `"<Family> - <Faction>"` for a known faction,
///   otherwise the last keyword segment (plus `" - <detachment>"`)
/// - a generic Space Marines list is narrowed to its chapter when the raw
///   text gives it away
/// - `factionKey` is the identifier form of the resolved faction
/// - a missing total is filled from the sum of unit points
pub fn standardize_summary(list: &mut ArmyList, raw_text: &str) {
    let computed_total = list.total_points();
    let summary = &mut list.summary;

    summary.list_title = summary.list_title.trim().to_string();
    summary.faction_keyword = trimmed(summary.faction_keyword.take());
    summary.detachment = trimmed(summary.detachment.take());

    let keyword = summary.faction_keyword.clone().unwrap_or_default();
    match resolve_faction(&keyword) {
        Some(info) => {
            let resolved = if info.name == SPACE_MARINES {
                detect_chapter(raw_text)
                    .and_then(lookup_faction)
                    .unwrap_or(info)
            } else {
                info
            };
            summary.display_faction = format!("{} - {}", resolved.family, resolved.name);
            summary.faction_key = name_key(resolved.name);
        }
        None => {
            let last = faction_segments(&keyword).pop().unwrap_or_default();
            summary.display_faction = match (&summary.detachment, last.is_empty()) {
                (Some(detachment), false) => format!("{} - {}", last, detachment),
                (Some(detachment), true) => detachment.clone(),
                (None, _) => last,
            };
            summary.faction_key = name_key(&keyword);
        }
    }

    if summary.total_points_value().is_none() && computed_total > 0 {
        summary.set_total_points(computed_total);
    }

    debug!(
        "Standardized summary: '{}' ({})",
        summary.display_faction, summary.faction_key
    );
}
