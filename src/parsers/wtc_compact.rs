//! WTC-Compact export: one line per unit, gear inline after a colon.
//!
//! ```text
//! + FACTION KEYWORD: Chaos - World Eaters
//! +++
//! Char1: 1x Daemon Prince of Khorne (220 pts): Warlord, Hellforged weapons
//! BL1: 10x Khorne Berzerkers (180 pts):
//! • 9x Khorne Berzerker: 9 with Bolt pistol, Khornate chainblade
//! ```
//!
//! There are no section lines; sections come from slot prefixes.

use super::body::{parse_body, BodyGrammar, EntryLine, Line};
use super::builder::ListBuilder;
use super::wtc::{parse_plus_header, wtc_unit_line};
use super::DialectParser;
use crate::models::{ArmyList, FormatId};

/// Parser for the WTC-Compact export.
#[derive(Debug, Clone, Copy, Default)]
pub struct WtcCompactParser;

impl BodyGrammar for WtcCompactParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if !bulleted {
            if let Some(unit) = wtc_unit_line(text) {
                return Line::Unit(unit);
            }
            if text.starts_with('+') || text.starts_with('&') {
                return Line::Skip;
            }
        }
        Line::Entry(EntryLine::parse(text))
    }
}

impl DialectParser for WtcCompactParser {
    fn format(&self) -> FormatId {
        FormatId::WtcCompact
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();
        let start = parse_plus_header(lines, &mut builder);
        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}
