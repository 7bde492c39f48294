//! Faction and family tables.
//!
//! Read-only lookup data: which broader family (Imperium, Chaos, Xenos) a
//! faction belongs to, which factions are Space Marine chapters, and which
//! skip-rule sets a faction inherits.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::normalize_name;

/// Generic Space Marines faction name.
pub const SPACE_MARINES: &str = "Space Marines";

/// A known faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactionInfo {
    /// Canonical faction name
    pub name: &'static str,
    /// Broader family label
    pub family: &'static str,
    /// Space Marine chapter (inherits the generic Space Marines rules)
    pub is_chapter: bool,
    /// Alternative spellings seen in exports
    pub aliases: &'static [&'static str],
}

const fn faction(
    name: &'static str,
    family: &'static str,
    aliases: &'static [&'static str],
) -> FactionInfo {
    FactionInfo {
        name,
        family,
        is_chapter: false,
        aliases,
    }
}

const fn chapter(name: &'static str, aliases: &'static [&'static str]) -> FactionInfo {
    FactionInfo {
        name,
        family: "Imperium",
        is_chapter: true,
        aliases,
    }
}

/// Every faction the standardizer knows about.
pub static FACTIONS: &[FactionInfo] = &[
    faction(SPACE_MARINES, "Imperium", &["Adeptus Astartes", "Astartes"]),
    chapter("Blood Angels", &[]),
    chapter("Dark Angels", &[]),
    chapter("Space Wolves", &[]),
    chapter("Black Templars", &[]),
    chapter("Deathwatch", &[]),
    chapter("Ultramarines", &[]),
    chapter("Iron Hands", &[]),
    chapter("Salamanders", &[]),
    chapter("Raven Guard", &[]),
    chapter("White Scars", &[]),
    chapter("Imperial Fists", &[]),
    chapter("Crimson Fists", &[]),
    chapter("Flesh Tearers", &[]),
    faction("Grey Knights", "Imperium", &[]),
    faction("Adepta Sororitas", "Imperium", &["Sisters of Battle"]),
    faction("Adeptus Custodes", "Imperium", &["Custodes"]),
    faction("Adeptus Mechanicus", "Imperium", &["Admech", "Adeptus Mechanicus Forge World"]),
    faction("Astra Militarum", "Imperium", &["Imperial Guard"]),
    faction("Imperial Knights", "Imperium", &["Questor Imperialis"]),
    faction("Agents of the Imperium", "Imperium", &["Imperial Agents"]),
    faction("Chaos Space Marines", "Chaos", &["Heretic Astartes"]),
    faction("Death Guard", "Chaos", &[]),
    faction("Thousand Sons", "Chaos", &[]),
    faction("World Eaters", "Chaos", &[]),
    faction("Emperor's Children", "Chaos", &[]),
    faction("Chaos Daemons", "Chaos", &["Legiones Daemonica"]),
    faction("Chaos Knights", "Chaos", &["Questor Traitoris"]),
    faction("Aeldari", "Xenos", &["Craftworlds", "Asuryani", "Eldar"]),
    faction("Drukhari", "Xenos", &["Dark Eldar"]),
    faction("Tyranids", "Xenos", &[]),
    faction("Genestealer Cults", "Xenos", &["Genestealer Cult"]),
    faction("Leagues of Votann", "Xenos", &["Votann"]),
    faction("Necrons", "Xenos", &[]),
    faction("Orks", "Xenos", &[]),
    faction("T'au Empire", "Xenos", &["Tau Empire", "Tau"]),
];

/// Look up a faction by name or alias (case, diacritic and apostrophe insensitive).
pub fn lookup_faction(name: &str) -> Option<&'static FactionInfo> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return None;
    }
    FACTIONS.iter().find(|f| {
        normalize_name(f.name) == wanted || f.aliases.iter().any(|a| normalize_name(a) == wanted)
    })
}

/// Skip-rule sets a faction inherits beyond its own.
///
/// Space Marines and every chapter inherit the generic Space Marines set plus
/// the Imperial allies; other Imperium factions inherit only the allies.
pub fn inherited_rule_sets(info: &FactionInfo) -> Vec<&'static str> {
    let sets: &[&'static str] = if info.is_chapter || info.name == SPACE_MARINES {
        &[SPACE_MARINES, "Imperial Knights", "Agents of the Imperium"]
    } else if info.family == "Imperium" {
        &["Agents of the Imperium", "Imperial Knights"]
    } else {
        &[]
    };
    sets.iter()
        .copied()
        .filter(|set| *set != info.name)
        .collect()
}

static RE_CHAPTER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Space Marines\s*\n\s*(\w[\w ]+?)\s*$").expect("Invalid regex"));

static RE_CHAPTER_ASTARTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Adeptus Astartes\s*-\s*(\w[\w ]+?)(?:\s*-|\s*\n|\s*\[|\s*$)").expect("Invalid regex")
});

static RE_CHAPTER_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Space Marines\s*\((\w[\w ]+?)\)").expect("Invalid regex"));

/// Chapter-specific detachments.
static CHAPTER_DETACHMENTS: &[(&str, &str)] = &[
    ("Blade of Ultramar", "Ultramarines"),
    ("Anvil Siege Force", "Iron Hands"),
    ("Firestorm Assault Force", "Salamanders"),
    ("Forgefather's Seekers", "Salamanders"),
    ("Stormlance Task Force", "White Scars"),
    ("Emperor's Shield", "Imperial Fists"),
];

/// Named characters unique to a chapter.
static CHAPTER_CHARACTERS: &[(&str, &str)] = &[
    ("Marneus Calgar", "Ultramarines"),
    ("Cato Sicarius", "Ultramarines"),
    ("Roboute Guilliman", "Ultramarines"),
    ("Uriel Ventris", "Ultramarines"),
    ("Kayvaan Shrike", "Raven Guard"),
    ("Iron Father Feirros", "Iron Hands"),
    ("Adrax Agatone", "Salamanders"),
    ("Vulkan He'stan", "Salamanders"),
    ("Tor Garadon", "Imperial Fists"),
    ("Darnath Lysander", "Imperial Fists"),
    ("Pedro Kantor", "Crimson Fists"),
    ("Kor'sarro Khan", "White Scars"),
];

fn as_chapter(candidate: &str) -> Option<&'static str> {
    lookup_faction(candidate)
        .filter(|f| f.is_chapter)
        .map(|f| f.name)
}

/// Detect the Space Marine chapter of a generic "Space Marines" list.
///
/// Checks, in order: a chapter line right below "Space Marines",
/// `"Adeptus Astartes - <Chapter>"`, `"Space Marines (<Chapter>)"`,
/// chapter-specific detachments, then named characters.
pub fn detect_chapter(raw_text: &str) -> Option<&'static str> {
    for re in [&*RE_CHAPTER_LINE, &*RE_CHAPTER_ASTARTES, &*RE_CHAPTER_PARENS] {
        if let Some(chapter) = re
            .captures(raw_text)
            .and_then(|caps| as_chapter(caps[1].trim()))
        {
            return Some(chapter);
        }
    }

    let text = normalize_name(raw_text);
    CHAPTER_DETACHMENTS
        .iter()
        .chain(CHAPTER_CHARACTERS.iter())
        .find(|(marker, _)| text.contains(&normalize_name(marker)))
        .map(|&(_, chapter)| chapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_faction_by_alias_and_apostrophe() {
        assert_eq!(lookup_faction("Adeptus Astartes").unwrap().name, SPACE_MARINES);
        assert_eq!(lookup_faction("Emperor’s Children").unwrap().family, "Chaos");
        assert_eq!(lookup_faction("tau empire").unwrap().name, "T'au Empire");
        assert!(lookup_faction("Squats").is_none());
        assert!(lookup_faction("").is_none());
    }

    #[test]
    fn test_inherited_rule_sets() {
        let wolves = lookup_faction("Space Wolves").unwrap();
        assert_eq!(
            inherited_rule_sets(wolves),
            vec![SPACE_MARINES, "Imperial Knights", "Agents of the Imperium"]
        );

        let generic = lookup_faction(SPACE_MARINES).unwrap();
        assert_eq!(
            inherited_rule_sets(generic),
            vec!["Imperial Knights", "Agents of the Imperium"]
        );

        let guard = lookup_faction("Astra Militarum").unwrap();
        assert_eq!(
            inherited_rule_sets(guard),
            vec!["Agents of the Imperium", "Imperial Knights"]
        );

        let orks = lookup_faction("Orks").unwrap();
        assert!(inherited_rule_sets(orks).is_empty());
    }

    #[test]
    fn test_detect_chapter_line_after_sm() {
        let raw = "My List (2000 Points)\n\nSpace Marines\nSalamanders\nStrike Force (2000 Points)\n";
        assert_eq!(detect_chapter(raw), Some("Salamanders"));
    }

    #[test]
    fn test_detect_chapter_astartes_dash() {
        let raw = "+ FACTION KEYWORD: Imperium - Adeptus Astartes - Iron Hands\n";
        assert_eq!(detect_chapter(raw), Some("Iron Hands"));
    }

    #[test]
    fn test_detect_chapter_parens() {
        assert_eq!(
            detect_chapter("Faction: Space Marines (Raven Guard)"),
            Some("Raven Guard")
        );
    }

    #[test]
    fn test_detect_chapter_from_detachment_and_character() {
        assert_eq!(
            detect_chapter("DETACHMENT: Blade of Ultramar"),
            Some("Ultramarines")
        );
        assert_eq!(
            detect_chapter("Char1: 1x Kayvaan Shrike (100 pts)"),
            Some("Raven Guard")
        );
    }

    #[test]
    fn test_detect_chapter_generic_sm() {
        let raw = "FACTION KEYWORD: Space Marines\nDETACHMENT: Ironstorm Spearhead\nTechmarine (65 points)\n";
        assert_eq!(detect_chapter(raw), None);
    }
}
