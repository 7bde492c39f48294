//! NewRecruit export in app style.
//!
//! ```text
//! Angels of Death - Space Marines - Blood Angels - Liberator Assault Group (280 Points)
//!
//! BATTLELINE
//!
//! Assault Intercessor Squad (75 Points)
//!   • 4x Assault Intercessor (Heavy bolt pistol, Astartes chainsword)
//! ```
//!
//! The body follows the app layout, except that a bullet ending in a
//! parenthesised list is a subunit carrying that wargear.

use std::sync::LazyLock;

use regex::Regex;

use super::body::{parse_body, BodyGrammar, EntryLine, Line, UnitLine};
use super::builder::ListBuilder;
use super::gw_app::{scan_gw_header, EXPORT_FOOTER};
use super::{canonical_section, split_dashed_title, DialectParser};
use crate::models::{ArmyList, FormatId};
use crate::text::{parse_quantity_token, split_top_level};

/// `Title - Faction - Detachment (N Points)`
static RE_DASHED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+ - .+?)\s*\((\d+)\s*(?:[Pp]oints|pts)\)\s*$").expect("Invalid regex")
});

/// `[Nx ]Name (P Points|pts)`
static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)x\s+)?(.+?)\s*\((\d+)\s*(?:[Pp]oints|pts)\)\s*$").expect("Invalid regex")
});

/// `4x Name (a, b)`
static RE_FOLDED_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\(([^()]+)\)$").expect("Invalid regex"));

static RE_COST_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\+?\s*\d+\s*(?:pts?|points?)?$").expect("Invalid regex")
});

/// Fold `Nx Name (a, b)` into a subunit entry carrying `a` and `b`.
fn folded_entry(text: &str) -> Option<EntryLine> {
    let caps = RE_FOLDED_ENTRY.captures(text)?;
    let content = caps[2].trim();
    if RE_COST_ONLY.is_match(content) {
        return None;
    }
    let (quantity, name, explicit) = parse_quantity_token(&caps[1]);
    Some(EntryLine {
        quantity,
        name,
        explicit,
        inline: split_top_level(content, ','),
    })
}

/// Parser for NewRecruit's app-style export.
#[derive(Debug, Clone, Copy, Default)]
pub struct NrGwParser;

impl BodyGrammar for NrGwParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if text.starts_with(EXPORT_FOOTER) {
            return Line::Stop;
        }
        if !bulleted {
            if let Some(section) = canonical_section(text) {
                return Line::Section(section.to_string());
            }
            if let Some(caps) = RE_UNIT.captures(text) {
                return Line::Unit(UnitLine {
                    quantity: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                    name: caps[2].trim().to_string(),
                    points: caps[3].parse().unwrap_or(0),
                    ..Default::default()
                });
            }
            return Line::Entry(EntryLine::parse(text));
        }
        Line::Entry(folded_entry(text).unwrap_or_else(|| EntryLine::parse(text)))
    }
}

impl DialectParser for NrGwParser {
    fn format(&self) -> FormatId {
        FormatId::NrGw
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();

        let first = lines.iter().position(|l| !l.trim().is_empty());
        let dashed = first.and_then(|i| RE_DASHED_TITLE.captures(lines[i].trim()).map(|c| (i, c)));

        let start = match dashed {
            Some((i, caps)) => {
                let (title, faction, detachment) = split_dashed_title(&caps[1]);
                let summary = builder.summary_mut();
                summary.list_title = title;
                summary.faction_keyword = faction;
                summary.detachment = detachment;
                if let Ok(total) = caps[2].parse() {
                    summary.set_total_points(total);
                }
                let (header, offset) = scan_gw_header(&lines[i + 1..], false);
                header.apply(builder.summary_mut(), true);
                i + 1 + offset
            }
            None => {
                let (header, start) = scan_gw_header(lines, true);
                header.apply(builder.summary_mut(), false);
                start
            }
        };

        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Quantity};
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = include_str!("../../tests/fixtures/nr_gw.txt");

    #[test]
    fn test_folded_entry() {
        let entry = folded_entry("4x Assault Intercessor (Heavy bolt pistol, Astartes chainsword)").unwrap();
        assert_eq!(entry.quantity, 4);
        assert_eq!(entry.name, "Assault Intercessor");
        assert_eq!(entry.inline, vec!["Heavy bolt pistol", "Astartes chainsword"]);

        assert!(folded_entry("Gift of Foresight (+25 pts)").is_none());
        assert!(folded_entry("1x Bolt pistol").is_none());
    }

    #[test]
    fn test_parse_fixture_summary() {
        let list = NrGwParser.parse_text(FIXTURE);
        assert_eq!(list.summary.list_title, "Angels of Death");
        assert_eq!(
            list.summary.faction_keyword.as_deref(),
            Some("Space Marines - Blood Angels")
        );
        assert_eq!(list.summary.detachment.as_deref(), Some("Liberator Assault Group"));
        assert_eq!(list.summary.total_points_value(), Some(280));
    }

    #[test]
    fn test_parse_fixture_folds_parenthesised_gear() {
        let list = NrGwParser.parse_text(FIXTURE);
        let squad = &list.sections["BATTLELINE"][0];
        assert_eq!(squad.quantity, Quantity::new(5));
        assert!(squad.is_complex);
        assert_eq!(
            squad.items[1],
            Item::Subunit {
                quantity: Quantity::new(4),
                name: "Assault Intercessor".to_string(),
                items: vec![
                    Item::wargear(Quantity::new(4), "Heavy bolt pistol"),
                    Item::wargear(Quantity::new(4), "Astartes chainsword"),
                ],
            }
        );
    }

    #[test]
    fn test_parse_fixture_enhancement_cost_and_flattening() {
        let list = NrGwParser.parse_text(FIXTURE);
        let captain = &list.sections["CHARACTER"][0];
        assert_eq!(
            captain.items[3],
            Item::special("Enhancement: Gift of Foresight", "E: GOF (+25)")
        );

        let guard = &list.sections["OTHER DATASHEETS"][0];
        assert_eq!(guard.quantity, Quantity::new(3));
        assert_eq!(guard.points, 130);
        assert_eq!(
            guard.items,
            vec![
                Item::wargear(Quantity::new(3), "Encarmine blade"),
                Item::wargear(Quantity::new(3), "Angelus boltgun"),
            ]
        );
    }
}
