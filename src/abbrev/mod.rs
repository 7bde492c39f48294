//! Wargear abbreviation index.
//!
//! Every distinct wargear name in a list gets a short code that is unique
//! within the list. Wargear hidden by a skip rule (or overridden with
//! `"NULL"`) is mapped to [`HIDDEN`] instead.

mod rules;
mod table;

pub use rules::{applicable_rule_sets, is_skipped, RuleSet, SkipRule, SkippableWargearRules, ANY_UNIT};
pub use table::{decompose, word_code};

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ArmyList, Item};
use crate::text::{initials, normalize_name};

/// Code for hidden wargear.
pub const HIDDEN: &str = "NULL";

/// Attempts at a camel prefix before falling back to the full CamelCase name.
const MAX_PREFIX_TRIES: usize = 16;

/// Longest code produced by vowel removal.
const MAX_CONSONANT_CODE: usize = 4;

/// Caller-supplied abbreviation inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbbreviationConfig {
    /// Wargear to hide, per faction and unit
    pub skippable: SkippableWargearRules,
    /// Fixed codes by wargear name; `"NULL"` hides the item
    pub overrides: IndexMap<String, String>,
}

impl AbbreviationConfig {
    fn override_for(&self, name: &str) -> Option<&str> {
        let wanted = normalize_name(name);
        self.overrides
            .iter()
            .find(|(key, _)| normalize_name(key) == wanted)
            .map(|(_, code)| code.as_str())
    }
}

/// Abbreviations for one list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbbreviationIndex {
    /// Normalized wargear name → code, in first-seen order
    pub flat_abbreviations: IndexMap<String, String>,
    /// Faction key → (normalized wargear name → code)
    pub by_faction: IndexMap<String, IndexMap<String, String>>,
}

impl AbbreviationIndex {
    /// Code for a wargear name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.flat_abbreviations
            .get(&normalize_name(name))
            .map(String::as_str)
    }

    /// Whether a wargear name is hidden.
    pub fn is_hidden(&self, name: &str) -> bool {
        self.lookup(name) == Some(HIDDEN)
    }
}

/// Distinct wargear of a list with the skip verdict of its first unit
/// (any later unit that hides it also hides it).
fn collect_wargear(list: &ArmyList, config: &AbbreviationConfig) -> IndexMap<String, (String, bool)> {
    let sets = applicable_rule_sets(&config.skippable, &list.summary);
    let mut seen: IndexMap<String, (String, bool)> = IndexMap::new();

    let mut visit = |unit_name: &str, item: &Item| {
        if !item.is_wargear() {
            return;
        }
        let hidden = is_skipped(&sets, unit_name, item.name());
        seen.entry(item.key())
            .and_modify(|(_, h)| *h |= hidden)
            .or_insert_with(|| (item.name().to_string(), hidden));
    };

    for unit in list.units() {
        for item in &unit.items {
            visit(&unit.name, item);
            for child in item.children() {
                visit(&unit.name, child);
            }
        }
    }
    seen
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Initials with `and` written as `&`.
fn word_initials<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(|word| {
            if word.eq_ignore_ascii_case("and") {
                "&".to_string()
            } else {
                initials(word)
            }
        })
        .collect()
}

/// First letter plus consonants, doubles collapsed, capped and uppercased.
fn consonant_code(word: &str) -> String {
    let mut letters = word.chars().filter(|c| c.is_alphanumeric());
    let Some(first) = letters.next() else {
        return String::new();
    };
    let mut code = vec![first];
    for c in letters {
        if "aeiouAEIOU".contains(c) || code.last() == Some(&c) {
            continue;
        }
        code.push(c);
    }
    code.into_iter()
        .take(MAX_CONSONANT_CODE)
        .flat_map(char::to_uppercase)
        .collect()
}

/// Base abbreviation of a wargear name, before collision handling.
pub fn base_abbreviation(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => String::new(),
        [word] if word.chars().count() > 3 => {
            if let Some(code) = word_code(word) {
                return code.to_string();
            }
            let lower = word.to_lowercase();
            if let Some(fragments) = decompose(&lower).filter(|f| f.len() >= 2) {
                return word_initials(fragments);
            }
            if word.contains('-') {
                return initials(word);
            }
            consonant_code(word)
        }
        _ => word_initials(words.iter().copied()),
    }
}

/// Next free code for a name whose base abbreviation is taken.
fn resolve_collision(name: &str, taken: &HashSet<String>) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let first: Vec<char> = words
        .first()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect())
        .unwrap_or_default();
    let rest = word_initials(words.iter().skip(1).copied());

    for k in (2..=first.len()).take(MAX_PREFIX_TRIES) {
        let prefix: String = first[..k].iter().collect();
        let candidate = format!("{}{}", capitalize(&prefix), rest);
        if !taken.contains(&candidate) {
            return candidate;
        }
    }

    let camel: String = words
        .iter()
        .map(|w| capitalize(&w.chars().filter(|c| c.is_alphanumeric()).collect::<String>()))
        .collect();
    if !taken.contains(&camel) {
        return camel;
    }
    (2..)
        .map(|n| format!("{}{}", camel, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(camel)
}

/// Build the abbreviation index for a list.
pub fn build_abbreviation_index(list: &ArmyList, config: &AbbreviationConfig) -> AbbreviationIndex {
    let wargear = collect_wargear(list, config);

    // The sentinel is never a generated code.
    let mut taken: HashSet<String> = HashSet::from([HIDDEN.to_string()]);
    let mut codes: IndexMap<String, (String, Option<String>)> = IndexMap::new();

    // Overrides and hidden items first so generated codes never shadow them.
    for (key, (name, hidden)) in &wargear {
        let fixed = match config.override_for(name) {
            Some(code) => Some(code.to_string()),
            None if *hidden => Some(HIDDEN.to_string()),
            None => None,
        };
        if let Some(code) = &fixed {
            taken.insert(code.clone());
        }
        codes.insert(key.clone(), (name.clone(), fixed));
    }

    let mut flat = IndexMap::new();
    for (key, (name, fixed)) in codes {
        let code = match fixed {
            Some(code) => code,
            None => {
                let base = base_abbreviation(&name);
                let code = if base.is_empty() || taken.contains(&base) {
                    resolve_collision(&name, &taken)
                } else {
                    base
                };
                taken.insert(code.clone());
                code
            }
        };
        flat.insert(key, code);
    }

    let faction = if list.summary.faction_key.is_empty() {
        "unknown".to_string()
    } else {
        list.summary.faction_key.clone()
    };
    debug!("Built {} abbreviations for '{}'", flat.len(), faction);

    AbbreviationIndex {
        by_faction: IndexMap::from([(faction, flat.clone())]),
        flat_abbreviations: flat,
    }
}
