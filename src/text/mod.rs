//! Text utilities shared by the classifier, the dialect parsers and the
//! abbreviation builder.
//!
//! Everything here is a pure function over `&str`:
//! - name normalization for comparison (diacritics, apostrophes, casing)
//! - quantity tokens (`"3x Foo"`) and `"N with a, b"` clauses
//! - fuzzy singular/plural matching of unit names

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// `"3x Bolt pistol"`, `"3 x Bolt pistol"`, `"3× Bolt pistol"`.
static RE_QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*[xX×]\s+(.+)$").expect("Invalid regex"));

/// `"2 with Plasma pistol, Chainsword"`.
static RE_WITH_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s+with\s+(.+)$").expect("Invalid regex"));

/// Normalize a name for comparison.
///
/// Strips diacritics, maps typographic apostrophes to `'`, lowercases and
/// collapses whitespace. `"Emperor’s Children"` and `"emperor's  children"`
/// normalize to the same string.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '`' | '\u{00b4}' => '\'',
            other => other,
        })
        .collect();

    folded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifier form of a name: `"T'au Empire"` → `"tau_empire"`.
pub fn name_key(name: &str) -> String {
    let normalized = normalize_name(name).replace('\'', "");
    let mut key = String::with_capacity(normalized.len());
    let mut pending_sep = false;

    for c in normalized.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(c);
        } else {
            pending_sep = true;
        }
    }

    key
}

/// Split a quantity token into `(quantity, name, explicit)`.
///
/// A leading `"<N>x "` is optional; without it the quantity defaults to 1 and
/// `explicit` is false. Zero is clamped to 1.
pub fn parse_quantity_token(token: &str) -> (u32, String, bool) {
    let token = token.trim();
    match RE_QUANTITY.captures(token) {
        Some(caps) => {
            let qty: u32 = caps[1].parse().unwrap_or(1);
            (qty.max(1), caps[2].trim().to_string(), true)
        }
        None => (1, token.to_string(), false),
    }
}

/// Parse a `"<N> with a, b, ..."` clause into `(N, [a, b, ...])`.
pub fn parse_with_clause(text: &str) -> Option<(u32, Vec<String>)> {
    let caps = RE_WITH_CLAUSE.captures(text.trim())?;
    let count: u32 = caps[1].parse().ok()?;
    let items = split_top_level(&caps[2], ',');
    Some((count.max(1), items))
}

/// Split on `sep`, ignoring separators nested inside `()` or `[]`.
///
/// Empty pieces are dropped and every piece is trimmed.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for c in text.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = (depth - 1).max(0),
            _ => {}
        }
        if c == sep && depth == 0 {
            let piece = current.trim();
            if !piece.is_empty() {
                parts.push(piece.to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }

    let piece = current.trim();
    if !piece.is_empty() {
        parts.push(piece.to_string());
    }
    parts
}

/// Reduce an English plural to its singular form (best effort).
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(stem) = lower.strip_suffix("men") {
        return format!("{}man", stem);
    }
    if let Some(stem) = lower.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for ending in ["ses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(ending) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && lower.len() > 3 {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

/// Fuzzy unit-name match, tolerant of singular/plural on the final word.
///
/// `"Intercessor"` matches `"Intercessors"`, `"Carnifex"` matches
/// `"Carnifexes"`, `"Ratling"` does not match `"Ratlings Squad"`.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a == b {
        return true;
    }
    singular_form(&a) == singular_form(&b)
}

fn singular_form(normalized: &str) -> String {
    match normalized.rsplit_once(' ') {
        Some((head, last)) => format!("{} {}", head, singularize(last)),
        None => singularize(normalized),
    }
}

/// Initials of each word (split on whitespace and hyphens), uppercased.
pub fn initials(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Split raw text into lines on `\r\n`, `\r` or `\n`.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .flat_map(|line| line.split('\r'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_diacritics_and_apostrophes() {
        assert_eq!(normalize_name("Emperor’s Children"), "emperor's children");
        assert_eq!(normalize_name("  Kâhl   Warden "), "kahl warden");
        assert_eq!(normalize_name("Vulkan He`stan"), "vulkan he'stan");
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_key("T'au Empire"), "tau_empire");
        assert_eq!(name_key("World Eaters"), "world_eaters");
        assert_eq!(name_key("  Chaos - Death Guard "), "chaos_death_guard");
    }

    #[test]
    fn test_parse_quantity_token() {
        assert_eq!(
            parse_quantity_token("3x Bolt pistol"),
            (3, "Bolt pistol".to_string(), true)
        );
        assert_eq!(
            parse_quantity_token("Bolt pistol"),
            (1, "Bolt pistol".to_string(), false)
        );
        assert_eq!(
            parse_quantity_token("2 x Heavy flamer"),
            (2, "Heavy flamer".to_string(), true)
        );
        assert_eq!(parse_quantity_token("0x Nothing").0, 1);
    }

    #[test]
    fn test_parse_with_clause() {
        let (n, items) = parse_with_clause("2 with Plasma Pistol, Chainsword").unwrap();
        assert_eq!(n, 2);
        assert_eq!(items, vec!["Plasma Pistol", "Chainsword"]);
        assert!(parse_with_clause("Plasma Pistol").is_none());
    }

    #[test]
    fn test_split_top_level_respects_parens() {
        let parts = split_top_level("Bolt pistol, Enhancement: Relic (+10 pts, unique), Warlord", ',');
        assert_eq!(
            parts,
            vec!["Bolt pistol", "Enhancement: Relic (+10 pts, unique)", "Warlord"]
        );
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("Intercessors"), "intercessor");
        assert_eq!(singularize("Carnifexes"), "carnifex");
        assert_eq!(singularize("Harpies"), "harpy");
        assert_eq!(singularize("Kommandos"), "kommando");
        assert_eq!(singularize("Guardsmen"), "guardsman");
        assert_eq!(singularize("Boss"), "boss");
    }

    #[test]
    fn test_names_match() {
        assert!(names_match("Intercessor", "Intercessors"));
        assert!(names_match("Wave Serpent", "wave serpents"));
        assert!(names_match("Cadian Shock Troops", "Cadian Shock Troop"));
        assert!(!names_match("Captain", "Chaplain"));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Berzerker Glaive"), "BG");
        assert_eq!(initials("Wolf-tail talisman"), "WTT");
    }

    #[test]
    fn test_split_lines_mixed_endings() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
    }
}
