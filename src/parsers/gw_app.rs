//! Official app export.
//!
//! ```text
//! Hammer of Ultramar (620 Points)
//!
//! Space Marines
//! Ultramarines
//! Strike Force (2000 Points)
//!
//! Gladius Task Force
//!
//! CHARACTERS
//!
//! Captain (80 Points)
//!   • Warlord
//!   • 1x Bolt pistol
//!
//! Exported with App Version: v1.29.0 (74), Data Version: v600
//! ```
//!
//! Unit lines never state a model count, so squads take theirs from the
//! subunit bullets.

use std::sync::LazyLock;

use regex::Regex;

use super::body::{parse_body, BodyGrammar, EntryLine, Line, UnitLine};
use super::builder::ListBuilder;
use super::{canonical_section, DialectParser};
use crate::models::{ArmyList, FormatId, Summary};

/// `Captain (80 Points)`; also the title line.
static RE_POINTS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*\((\d+)\s*(?:[Pp]oints|pts)\)\s*$").expect("Invalid regex")
});

static RE_BATTLE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Combat Patrol|Incursion|Strike Force|Onslaught)\s*\(\d+\s*[Pp]oints\)")
        .expect("Invalid regex")
});

pub(super) const EXPORT_FOOTER: &str = "Exported with";

/// Header fields of an app-style export.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct GwHeader {
    pub title: Option<String>,
    pub total: Option<u32>,
    pub faction_lines: Vec<String>,
    pub battle_size: Option<String>,
    pub detachment: Option<String>,
}

impl GwHeader {
    /// Copy the header into `summary`. With `fill_only`, fields already set
    /// are left alone.
    pub fn apply(self, summary: &mut Summary, fill_only: bool) {
        if let Some(title) = self.title {
            if !fill_only || summary.list_title.is_empty() {
                summary.list_title = title;
            }
        }
        if !self.faction_lines.is_empty() && (!fill_only || summary.faction_keyword.is_none()) {
            summary.faction_keyword = Some(self.faction_lines.join(" - "));
        }
        if self.detachment.is_some() && (!fill_only || summary.detachment.is_none()) {
            summary.detachment = self.detachment;
        }
        if let Some(total) = self.total {
            if !fill_only || summary.total_army_points.is_none() {
                summary.set_total_points(total);
            }
        }
    }
}

fn is_body_start(line: &str) -> bool {
    canonical_section(line).is_some()
        || line.starts_with(['•', '◦'])
        || line.starts_with(EXPORT_FOOTER)
}

/// Scan an app-style header and return it with the index of the first body line.
///
/// Layout: optional `Title (N Points)`, faction line(s), battle size, then
/// the detachment. Without a battle-size line, the last of two or more
/// lines is taken as the detachment.
pub(super) fn scan_gw_header(lines: &[&str], expect_title: bool) -> (GwHeader, usize) {
    let mut header = GwHeader::default();
    let mut before_size: Vec<String> = Vec::new();
    let mut after_size: Vec<String> = Vec::new();
    let mut title_pending = expect_title;
    let mut end = lines.len();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if title_pending {
            title_pending = false;
            if let Some(caps) = RE_POINTS_LINE.captures(line) {
                header.title = Some(caps[1].trim().to_string());
                header.total = caps[2].parse().ok();
                continue;
            }
        }
        if is_body_start(line) {
            end = i;
            break;
        }
        if RE_BATTLE_SIZE.is_match(line) {
            header.battle_size = Some(line.to_string());
            continue;
        }
        if RE_POINTS_LINE.is_match(line) {
            end = i;
            break;
        }
        if header.battle_size.is_some() {
            after_size.push(line.to_string());
        } else {
            before_size.push(line.to_string());
        }
    }

    if header.battle_size.is_some() {
        header.faction_lines = before_size;
        header.detachment = after_size.into_iter().next();
    } else if before_size.len() >= 2 {
        header.detachment = before_size.pop();
        header.faction_lines = before_size;
    } else {
        header.faction_lines = before_size;
    }
    (header, end)
}

/// Parse an app-style unit line, `Name (P Points)`.
pub(super) fn points_unit_line(text: &str) -> Option<UnitLine> {
    let caps = RE_POINTS_LINE.captures(text)?;
    Some(UnitLine {
        name: caps[1].trim().to_string(),
        points: caps[2].parse().unwrap_or(0),
        ..Default::default()
    })
}

/// Parser for the official app export.
#[derive(Debug, Clone, Copy, Default)]
pub struct GwAppParser;

impl BodyGrammar for GwAppParser {
    fn classify(&self, text: &str, bulleted: bool) -> Line {
        if text.starts_with(EXPORT_FOOTER) {
            return Line::Stop;
        }
        if !bulleted {
            if let Some(section) = canonical_section(text) {
                return Line::Section(section.to_string());
            }
            if let Some(unit) = points_unit_line(text) {
                return Line::Unit(unit);
            }
        }
        Line::Entry(EntryLine::parse(text))
    }
}

impl DialectParser for GwAppParser {
    fn format(&self) -> FormatId {
        FormatId::GwApp
    }

    fn parse(&self, lines: &[&str]) -> ArmyList {
        let mut builder = ListBuilder::new();
        let (header, start) = scan_gw_header(lines, true);
        header.apply(builder.summary_mut(), false);
        parse_body(self, &lines[start..], &mut builder);
        builder.finish()
    }
}
