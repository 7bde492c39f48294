//! WTC export.
//!
//! ```text
//! +++++++++++++++++++++++++++++++++++++++++++++++
//! + FACTION KEYWORD: Imperium - Adeptus Astartes - Ultramarines
//! + DETACHMENT: Gladius Task Force
//! + TOTAL ARMY POINTS: 1995pts
//! + WARLORD: Char1: Captain
//! + ENHANCEMENT: Artificer Armour (on Char1: Captain)
//! +++++++++++++++++++++++++++++++++++++++++++++++
//!
//! CHARACTER
//! Char1: 1x Captain (80 pts)
//! • 1x Bolt pistol
//! ```
//!
//! The `+` header block is shared with WTC-Compact.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::body::{parse_body, BodyGrammar, EntryLine, Line, UnitLine};
use super::builder::ListBuilder;
use super::{canonical_section, first_number, DialectParser};
use crate::models::{ArmyList, FormatId};
use crate::text::split_top_level;

/// `Char1: 1x Captain (80 pts)[: inline items]`
static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z]+\d+):\s*)?(\d+)x\s+(.+?)\s*\((\d+)\s*pts?\)\s*(?::\s*(.*))?$")
        .expect("Invalid regex")
});

/// `+ FACTION KEYWORD: Chaos - World Eaters`
static RE_HEADER_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\s*([A-Za-z][A-Za-z ]*?)\s*:\s*(.*)$").expect("Invalid regex"));

/// Parse a WTC-family unit line.
pub(super) fn wtc_unit_line(text: &str) -> Option<UnitLine> {
    let caps = RE_UNIT.captures(text)?;
    Some(UnitLine {
        slot: caps.get(1).map(|m| m.as_str().to_string()),
        quantity: caps[2].parse().ok(),
        name: caps[3].trim().to_string(),
        points: caps[4].parse().unwrap_or(0),
        inline: caps
            .get(5)
            .map(|m| split_top_level(m.as_str(), ','))
            .unwrap_or_default(),
    })
}

/// Read the `+`/`&` header block and return the index of the first body line.
///
/// A single line before the block is taken as the list title.
pub(super) fn parse_plus_header(lines: &[&str], builder: &mut ListBuilder) -> usize {
    let mut in_block = false;
    let mut titled = false;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('&') {
            builder.pend_enhancement(rest);
            in_block = true;
            continue;
        }
        if line.starts_with('+') {
            in_block = true;
            if let Some(caps) = RE_HEADER_KEY.captures(line) {
                apply_header_key(builder, &caps[1], caps[2].trim());
            }
            continue;
        }
        if in_block || titled || RE_UNIT.is_match(line) || canonical_section(line).is_some() {
            return i;
        }
        builder.summary_mut().list_title = line.to_string();
        titled = true;
    }
    lines.len()
}

fn apply_header_key(builder: &mut ListBuilder, key: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    match key.to_uppercase().as_str() {
        "FACTION KEYWORD" => builder.summary_mut().faction_keyword = Some(value.to_string()),
        "DETACHMENT" => builder.summary_mut().detachment = Some(value.to_string()),
        "TOTAL ARMY POINTS" => {
            if let Some(points) = first_number(value) {
                builder.summary_mut().set_total_points(points);
            }
        }
        "WARLORD" => builder.pend_warlord(value),
        "ENHANCEMENT" | "ENHANCEMENTS" => builder.pend_enhancement(value),
        other => trace!("Ignoring header key '{}'", other),
    }
}

/// Parser for the WTC export.
#[derive(Debug, Clone, Copy, Default)]
pub struct WtcParser;

impl BodyGrammar for WtcParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if !bulleted {
            if let Some(section) = canonical_section(text) {
                return Line::Section(section.to_string());
            }
            if let Some(mut unit) = wtc_unit_line(text) {
                if !unit.inline.is_empty() {
                    trace!("Ignoring inline text on WTC unit line '{}'", text);
                    unit.inline.clear();
                }
                return Line::Unit(unit);
            }
            if text.starts_with('+') || text.starts_with('&') {
                return Line::Skip;
            }
        }
        Line::Entry(EntryLine::parse(text))
    }
}

impl DialectParser for WtcParser {
    fn format(&self) -> FormatId {
        FormatId::Wtc
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();
        let start = parse_plus_header(lines, &mut builder);
        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Quantity};
    use crate::text::split_lines;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = include_str!("../../tests/fixtures/wtc.txt");

    #[test]
    fn test_wtc_unit_line() {
        let unit = wtc_unit_line("Char1: 1x Captain (80 pts)").unwrap();
        assert_eq!(unit.slot.as_deref(), Some("Char1"));
        assert_eq!(unit.quantity, Some(1));
        assert_eq!(unit.name, "Captain");
        assert_eq!(unit.points, 80);

        let unit = wtc_unit_line("5x Intercessor Squad (80 pts)").unwrap();
        assert_eq!(unit.slot, None);
        assert!(wtc_unit_line("Captain (80 Points)").is_none());
    }

    #[test]
    fn test_plus_header() {
        let lines = split_lines(FIXTURE);
        let mut builder = ListBuilder::new();
        let start = parse_plus_header(&lines, &mut builder);
        assert_eq!(lines[start].trim(), "CHARACTER");

        let list = builder.finish();
        assert_eq!(list.summary.list_title, "Hammer of Macragge");
        assert_eq!(
            list.summary.faction_keyword.as_deref(),
            Some("Imperium - Adeptus Astartes - Ultramarines")
        );
        assert_eq!(list.summary.detachment.as_deref(), Some("Gladius Task Force"));
        assert_eq!(list.summary.total_army_points.as_deref(), Some("1000pts"));
    }

    #[test]
    fn test_parse_fixture() {
        let list = WtcParser.parse_text(FIXTURE);
        assert_eq!(
            list.sections.keys().collect::<Vec<_>>(),
            vec!["CHARACTER", "BATTLELINE", "OTHER DATASHEETS"]
        );

        let captain = &list.sections["CHARACTER"][0];
        assert_eq!(captain.name, "Captain");
        assert_eq!(
            captain.items,
            vec![
                Item::special("Warlord", "Warlord"),
                Item::special("Enhancement: Artificer Armour", "E: AA (+10)"),
                Item::wargear(Quantity::ONE, "Bolt pistol"),
                Item::wargear(Quantity::ONE, "Master-crafted power weapon"),
            ]
        );

        let lieutenant = &list.sections["CHARACTER"][1];
        assert_eq!(lieutenant.items[0].name(), "Enhancement: The Imperium's Sword");

        let squad = &list.sections["BATTLELINE"][0];
        assert_eq!(squad.quantity, Quantity::new(10));
        assert!(!squad.is_complex);
        assert_eq!(squad.items.len(), 2);
        let marines = &squad.items[0];
        assert_eq!(marines.name(), "Intercessor");
        assert_eq!(marines.quantity(), Quantity::new(9));
        assert_eq!(
            marines.children(),
            &[
                Item::wargear(Quantity::new(9), "Bolt pistol"),
                Item::wargear(Quantity::new(9), "Bolt rifle"),
                Item::wargear(Quantity::new(9), "Close combat weapon"),
                Item::wargear(Quantity::new(1), "Astartes grenade launcher"),
            ]
        );
        let sergeant = &squad.items[1];
        assert_eq!(sergeant.children()[1], Item::wargear(Quantity::ONE, "Power fist"));

        let dread = &list.sections["OTHER DATASHEETS"][0];
        assert_eq!(dread.name, "Redemptor Dreadnought");
        assert_eq!(dread.points, 210);
        assert_eq!(dread.items.len(), 3);
    }

    #[test]
    fn test_body_without_header() {
        let list = WtcParser.parse_text("1x Rhino (75 pts)\n• 1x Storm bolter\n");
        assert_eq!(list.summary.list_title, "");
        assert_eq!(list.unit_names(), vec!["Rhino"]);
    }
}
