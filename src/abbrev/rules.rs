//! Skippable wargear rules.
//!
//! Loaded by the caller (usually from JSON) and passed in explicitly:
//!
//! ```json
//! {
//!   "Space Marines": {
//!     "Intercessor Squad": ["bolt pistol", "close combat weapon"],
//!     "Rhino": true,
//!     "*": ["astartes chainsword"]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::factions::{inherited_rule_sets, lookup_faction, FactionInfo, FACTIONS};
use crate::models::Summary;
use crate::standardize::resolve_faction;
use crate::text::{name_key, names_match, normalize_name};

/// Wildcard unit key, applies to every unit of the faction.
pub const ANY_UNIT: &str = "*";

/// What to hide on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkipRule {
    /// `true` hides every wargear item
    All(bool),
    /// Names of the items to hide
    Items(Vec<String>),
}

impl SkipRule {
    /// Whether this rule hides `item`.
    pub fn hides(&self, item: &str) -> bool {
        match self {
            SkipRule::All(all) => *all,
            SkipRule::Items(names) => {
                let wanted = normalize_name(item);
                names.iter().any(|n| normalize_name(n) == wanted)
            }
        }
    }
}

/// Faction name → unit name → rule.
pub type SkippableWargearRules = IndexMap<String, IndexMap<String, SkipRule>>;

/// Rules for one faction.
pub type RuleSet = IndexMap<String, SkipRule>;

fn faction_of(summary: &Summary) -> Option<&'static FactionInfo> {
    if !summary.faction_key.is_empty() {
        if let Some(info) = FACTIONS.iter().find(|f| name_key(f.name) == summary.faction_key) {
            return Some(info);
        }
    }
    summary.faction_keyword.as_deref().and_then(resolve_faction)
}

fn find_set<'a>(rules: &'a SkippableWargearRules, faction: &str) -> Option<&'a RuleSet> {
    let wanted = normalize_name(faction);
    let key = name_key(faction);
    rules.iter().find_map(|(name, set)| {
        let matches = normalize_name(name) == wanted
            || name_key(name) == key
            || lookup_faction(name).is_some_and(|info| normalize_name(info.name) == wanted);
        matches.then_some(set)
    })
}

/// Rule sets that apply to a list: its own faction's, then inherited ones.
pub fn applicable_rule_sets<'a>(rules: &'a SkippableWargearRules, summary: &Summary) -> Vec<&'a RuleSet> {
    let mut sets = Vec::new();
    match faction_of(summary) {
        Some(info) => {
            sets.extend(find_set(rules, info.name));
            for inherited in inherited_rule_sets(info) {
                sets.extend(find_set(rules, inherited));
            }
        }
        None => {
            if !summary.faction_key.is_empty() {
                sets.extend(find_set(rules, &summary.faction_key.replace('_', " ")));
            }
        }
    }
    sets
}

/// Whether any applicable rule hides `item` on `unit_name`.
pub fn is_skipped(sets: &[&RuleSet], unit_name: &str, item: &str) -> bool {
    sets.iter().any(|set| {
        set.iter().any(|(unit_key, rule)| {
            (unit_key == ANY_UNIT || names_match(unit_key, unit_name)) && rule.hides(item)
        })
    })
}
