//! ListForge text export.
//!
//! ```text
//! Army Name: Waaagh Skullcrusha
//! Faction: Orks
//! Detachment: War Horde
//! Total Points: 265
//!
//! --- Battleline ---
//! Boyz [85 pts]
//!   - 9x Boy
//!     - 9x Slugga
//!
//! Built with ListForge
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::body::{parse_body, BodyGrammar, EntryLine, Line, UnitLine};
use super::builder::ListBuilder;
use super::{canonical_section, first_number, DialectParser};
use crate::models::{ArmyList, FormatId};

/// `--- Label ---`
static RE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}\s*(.+?)\s*-{3,}$").expect("Invalid regex"));

/// `[Nx ]Name [P pts]`
static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)x\s+)?(.+?)\s*\[(\d+)\s*pts?\]\s*$").expect("Invalid regex")
});

static RE_KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]*?)\s*:\s*(.+)$").expect("Invalid regex"));

fn is_footer(text: &str) -> bool {
    text.to_lowercase().starts_with("built with")
}

/// Parser for the ListForge export.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListForgeParser;

impl ListForgeParser {
    fn parse_header(&self, lines: &[&str], builder: &mut ListBuilder) -> usize {
        for (i, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if RE_SECTION.is_match(line) || RE_UNIT.is_match(line) {
                return i;
            }
            let Some(caps) = RE_KEY_VALUE.captures(line) else {
                trace!("Ignoring header line '{}'", line);
                continue;
            };
            let value = caps[2].trim().to_string();
            let summary = builder.summary_mut();
            match caps[1].to_lowercase().as_str() {
                "army name" | "list name" | "name" => summary.list_title = value,
                "faction" => summary.faction_keyword = Some(value),
                "detachment" => summary.detachment = Some(value),
                "total points" | "points" | "total" => {
                    if let Some(total) = first_number(&value) {
                        summary.set_total_points(total);
                    }
                }
                key => trace!("Ignoring header key '{}'", key),
            }
        }
        lines.len()
    }
}

impl BodyGrammar for ListForgeParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if is_footer(text) {
            return Line::Stop;
        }
        if !bulleted {
            if let Some(caps) = RE_SECTION.captures(text) {
                let label = &caps[1];
                let section = canonical_section(label)
                    .map(str::to_string)
                    .unwrap_or_else(|| label.to_uppercase());
                return Line::Section(section);
            }
            if let Some(caps) = RE_UNIT.captures(text) {
                return Line::Unit(UnitLine {
                    quantity: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                    name: caps[2].trim().to_string(),
                    points: caps[3].parse().unwrap_or(0),
                    ..Default::default()
                });
            }
        }
        Line::Entry(EntryLine::parse(text))
    }
}

impl DialectParser for ListForgeParser {
    fn format(&self) -> FormatId {
        FormatId::Lf
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();
        let start = self.parse_header(lines, &mut builder);
        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}
