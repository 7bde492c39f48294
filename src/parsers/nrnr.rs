//! NewRecruit native text export.
//!
//! ```text
//! Swarmlord's Brood - Tyranids - Invasion Fleet - [600pts]
//!
//! ## Configuration [0pts]
//! Detachment: Invasion Fleet
//!
//! ## Battleline [125pts]
//! Termagants [60pts]:
//! • 9x Termagant: 9 with Fleshborer, Chitinous claws and teeth
//!
//! Created with https://www.newrecruit.eu
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::body::{parse_body, BodyGrammar, EntryLine, Line, UnitLine};
use super::builder::ListBuilder;
use super::{canonical_section, first_number, split_dashed_title, DialectParser};
use crate::models::{ArmyList, FormatId};
use crate::text::split_top_level;

/// `Title - Faction - Detachment - [Npts]`
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+-\s+\[(\d+)\s*pts\]\s*$").expect("Invalid regex"));

/// `## Label [Npts]`
static RE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{2,}\s*(.+?)\s*(?:\[\d+\s*pts\])?\s*$").expect("Invalid regex"));

/// `[Nx ]Name [Ppts][: items]`
static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)x\s+)?(.+?)\s*\[(\d+)\s*pts\]\s*(?::\s*(.*))?$").expect("Invalid regex")
});

static RE_KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z /]*?)\s*:\s*(.+)$").expect("Invalid regex"));

const FOOTER: &str = "Created with";
const CONFIGURATION: &str = "configuration";

fn section_label(text: &str) -> Option<String> {
    let caps = RE_SECTION.captures(text)?;
    Some(caps[1].to_string())
}

/// Parser for NewRecruit's native export.
#[derive(Debug, Clone, Copy, Default)]
pub struct NrnrParser;

impl NrnrParser {
    /// Read the title line and the configuration block. Returns the index of
    /// the first body section.
    fn parse_header(&self, lines: &[&str], builder: &mut ListBuilder) -> usize {
        let mut in_configuration = false;

        for (i, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(label) = section_label(line) {
                if label.eq_ignore_ascii_case(CONFIGURATION) {
                    in_configuration = true;
                    continue;
                }
                return i;
            }
            if let Some(caps) = RE_TITLE.captures(line) {
                let (title, faction, detachment) = split_dashed_title(&caps[1]);
                let summary = builder.summary_mut();
                summary.list_title = title;
                summary.faction_keyword = faction;
                summary.detachment = detachment;
                if let Ok(total) = caps[2].parse() {
                    summary.set_total_points(total);
                }
                continue;
            }
            if in_configuration {
                if let Some(caps) = RE_KEY_VALUE.captures(line) {
                    let value = caps[2].trim().to_string();
                    let summary = builder.summary_mut();
                    match caps[1].to_lowercase().as_str() {
                        "detachment" if summary.detachment.is_none() => summary.detachment = Some(value),
                        "faction" if summary.faction_keyword.is_none() => {
                            summary.faction_keyword = Some(value)
                        }
                        "total" | "points" if summary.total_army_points.is_none() => {
                            if let Some(total) = first_number(&value) {
                                summary.set_total_points(total);
                            }
                        }
                        key => trace!("Ignoring configuration key '{}'", key),
                    }
                }
                continue;
            }
            if RE_UNIT.is_match(line) {
                return i;
            }
        }
        lines.len()
    }
}

impl BodyGrammar for NrnrParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if text.starts_with(FOOTER) {
            return Line::Stop;
        }
        if bulleted {
            return Line::Entry(EntryLine::parse(text));
        }
        if let Some(label) = section_label(text) {
            if label.eq_ignore_ascii_case(CONFIGURATION) {
                return Line::Skip;
            }
            let section = canonical_section(&label)
                .map(str::to_string)
                .unwrap_or_else(|| label.to_uppercase());
            return Line::Section(section);
        }
        if let Some(caps) = RE_UNIT.captures(text) {
            return Line::Unit(UnitLine {
                slot: None,
                quantity: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                name: caps[2].trim().to_string(),
                points: caps[3].parse().unwrap_or(0),
                inline: caps
                    .get(4)
                    .map(|m| split_top_level(m.as_str(), ','))
                    .unwrap_or_default(),
            });
        }
        Line::Entry(EntryLine::parse(text))
    }
}

impl DialectParser for NrnrParser {
    fn format(&self) -> FormatId {
        FormatId::Nrnr
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();
        let start = self.parse_header(lines, &mut builder);
        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Quantity};
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = include_str!("../../tests/fixtures/nrnr.txt");

    #[test]
    fn test_section_label() {
        assert_eq!(section_label("## Epic Hero [220pts]").as_deref(), Some("Epic Hero"));
        assert_eq!(section_label("## Configuration").as_deref(), Some("Configuration"));
        assert!(section_label("Termagants [60pts]:").is_none());
    }

    #[test]
    fn test_parse_fixture_summary() {
        let list = NrnrParser.parse_text(FIXTURE);
        assert_eq!(list.summary.list_title, "Swarmlord's Brood");
        assert_eq!(list.summary.faction_keyword.as_deref(), Some("Tyranids"));
        assert_eq!(list.summary.detachment.as_deref(), Some("Invasion Fleet"));
        assert_eq!(list.summary.total_army_points.as_deref(), Some("600pts"));
        assert_eq!(list.total_points(), 600);
    }

    #[test]
    fn test_parse_fixture_sections() {
        let list = NrnrParser.parse_text(FIXTURE);
        assert_eq!(
            list.sections.keys().collect::<Vec<_>>(),
            vec!["CHARACTER", "BATTLELINE", "OTHER DATASHEETS"]
        );
        assert_eq!(
            list.sections["CHARACTER"]
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>(),
            vec!["The Swarmlord", "Winged Hive Tyrant"]
        );
    }

    #[test]
    fn test_parse_fixture_inline_items() {
        let list = NrnrParser.parse_text(FIXTURE);
        let swarmlord = &list.sections["CHARACTER"][0];
        assert_eq!(
            swarmlord.items,
            vec![
                Item::special("Warlord", "Warlord"),
                Item::wargear(Quantity::ONE, "Bone sabres"),
                Item::wargear(Quantity::ONE, "Synaptic pulse"),
            ]
        );

        let tyrant = &list.sections["CHARACTER"][1];
        assert_eq!(
            tyrant.items[2],
            Item::special("Enhancement: Adaptive Biology", "E: AB (+25)")
        );

        let zoanthropes = &list.sections["OTHER DATASHEETS"][0];
        assert_eq!(zoanthropes.quantity, Quantity::new(3));
        assert_eq!(
            zoanthropes.items,
            vec![
                Item::wargear(Quantity::ONE, "Warp blast"),
                Item::wargear(Quantity::new(3), "Chitinous claws and teeth"),
            ]
        );
    }

    #[test]
    fn test_parse_fixture_subunits() {
        let list = NrnrParser.parse_text(FIXTURE);
        let battleline = &list.sections["BATTLELINE"];

        let termagants = &battleline[0];
        assert_eq!(termagants.quantity, Quantity::new(10));
        assert!(termagants.is_complex);
        assert_eq!(termagants.items.len(), 1);
        assert_eq!(
            termagants.items[0].children(),
            &[
                Item::wargear(Quantity::new(9), "Fleshborer"),
                Item::wargear(Quantity::new(10), "Chitinous claws and teeth"),
                Item::wargear(Quantity::ONE, "Devourer"),
            ]
        );

        let warriors = &battleline[1];
        assert_eq!(warriors.quantity, Quantity::new(3));
        assert_eq!(
            warriors.items[0].children(),
            &[
                Item::wargear(Quantity::new(2), "Deathspitter"),
                Item::wargear(Quantity::new(3), "Scything talons"),
                Item::wargear(Quantity::ONE, "Barbed strangler"),
            ]
        );
    }
}
