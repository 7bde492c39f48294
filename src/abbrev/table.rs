//! Static abbreviation tables for single-word wargear names.

/// Whole-word codes (lowercase word → code).
pub static WORD_CODES: &[(&str, &str)] = &[
    ("autocannon", "AC"),
    ("autogun", "AG"),
    ("autopistol", "AP"),
    ("boltgun", "BG"),
    ("bolter", "BT"),
    ("chainaxe", "CA"),
    ("chainblade", "CB"),
    ("chainsword", "CS"),
    ("choppa", "CH"),
    ("deathspitter", "DS"),
    ("devourer", "DV"),
    ("flamer", "FL"),
    ("fleshborer", "FB"),
    ("lascannon", "LC"),
    ("lasgun", "LG"),
    ("laspistol", "LP"),
    ("meltagun", "MG"),
    ("multi-laser", "ML"),
    ("multi-melta", "MM"),
    ("plasmagun", "PG"),
    ("shoota", "SH"),
    ("shotgun", "SG"),
    ("shuriken", "SHK"),
    ("slugga", "SL"),
    ("stormbolter", "SB"),
];

/// Fragments used to split compound words (`thunderhammer` → `TH`).
pub static FRAGMENTS: &[&str] = &[
    "auto", "axe", "blade", "bolt", "bone", "borer", "cannon", "chain", "claw", "death", "fist",
    "flesh", "glaive", "gun", "hammer", "kombi", "las", "launcher", "lightning", "melta",
    "pistol", "plasma", "power", "rifle", "rokkit", "shield", "spear", "spitter", "storm",
    "sword", "talon", "thunder", "venom",
];

/// Code for a whole word, if listed.
pub fn word_code(word: &str) -> Option<&'static str> {
    let word = word.to_lowercase();
    WORD_CODES
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, code)| *code)
}

/// Split a lowercase word into known fragments covering it completely.
pub fn decompose(word: &str) -> Option<Vec<&'static str>> {
    if word.is_empty() {
        return Some(Vec::new());
    }
    let mut candidates: Vec<&'static str> = FRAGMENTS
        .iter()
        .copied()
        .filter(|f| word.starts_with(f))
        .collect();
    candidates.sort_by_key(|f| std::cmp::Reverse(f.len()));

    candidates.into_iter().find_map(|fragment| {
        decompose(&word[fragment.len()..]).map(|mut tail| {
            tail.insert(0, fragment);
            tail
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_code_case_insensitive() {
        assert_eq!(word_code("Chainsword"), Some("CS"));
        assert_eq!(word_code("Multi-melta"), Some("MM"));
        assert_eq!(word_code("Klaw"), None);
    }

    #[test]
    fn test_decompose() {
        assert_eq!(decompose("thunderhammer"), Some(vec!["thunder", "hammer"]));
        assert_eq!(decompose("stormshield"), Some(vec!["storm", "shield"]));
        assert_eq!(decompose("plasma"), Some(vec!["plasma"]));
        assert_eq!(decompose("warp"), None);
    }

    #[test]
    fn test_tables_are_lowercase() {
        assert!(WORD_CODES.iter().all(|(w, _)| *w == w.to_lowercase()));
        assert!(FRAGMENTS.iter().all(|f| *f == f.to_lowercase()));
    }
}
