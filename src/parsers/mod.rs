//! Dialect parsers.
//!
//! Every supported export convention implements [`DialectParser`]: ordered
//! source lines in, a canonical [`ArmyList`] out. Parsers never fail; lines
//! they cannot place are skipped (logged at `trace`) and the partial tree is
//! returned.
//!
//! The per-dialect modules only know their header layout and how to recognise
//! their own section and unit lines. Everything below a unit line (bullets,
//! indentation, subunits, `N with` groups, enhancements) is handled by the
//! shared [`body`] engine feeding a [`builder::ListBuilder`].

pub(crate) mod body;
pub(crate) mod builder;
mod gw_app;
mod listforge;
mod nr_gw;
mod nrnr;
mod wtc;
mod wtc_compact;

pub use gw_app::GwAppParser;
pub use listforge::ListForgeParser;
pub use nr_gw::NrGwParser;
pub use nrnr::NrnrParser;
pub use wtc::WtcParser;
pub use wtc_compact::WtcCompactParser;

use crate::models::{ArmyList, FormatId};
use crate::text::split_lines;

pub const CHARACTER: &str = "CHARACTER";
pub const BATTLELINE: &str = "BATTLELINE";
pub const DEDICATED_TRANSPORTS: &str = "DEDICATED TRANSPORTS";
pub const OTHER_DATASHEETS: &str = "OTHER DATASHEETS";
pub const ALLIED_UNITS: &str = "ALLIED UNITS";
pub const FORTIFICATIONS: &str = "FORTIFICATIONS";

/// A parser for one textual list dialect.
pub trait DialectParser: Send + Sync {
    /// Dialect handled by this parser
    fn format(&self) -> FormatId;

    /// Parse ordered source lines into a list
    fn parse(&self, lines: &[&str]) -> ArmyList;

    /// Parse raw text (split on CR/LF)
    fn parse_text(&self, text: &str) -> ArmyList {
        self.parse(&split_lines(text))
    }
}

/// Get the parser for a dialect.
pub fn parser_for(format: FormatId) -> Box<dyn DialectParser> {
    match format {
        FormatId::GwApp => Box::new(GwAppParser),
        FormatId::WtcCompact => Box::new(WtcCompactParser),
        FormatId::Wtc => Box::new(WtcParser),
        FormatId::Nrnr => Box::new(NrnrParser),
        FormatId::NrGw => Box::new(NrGwParser),
        FormatId::Lf => Box::new(ListForgeParser),
    }
}

/// Map a section label to its canonical bucket, if it is one.
pub fn canonical_section(label: &str) -> Option<&'static str> {
    let upper = label.trim().trim_end_matches(':').trim().to_uppercase();
    match upper.as_str() {
        "CHARACTER" | "CHARACTERS" | "EPIC HERO" | "EPIC HEROES" => Some(CHARACTER),
        "BATTLELINE" | "BATTLELINES" => Some(BATTLELINE),
        "DEDICATED TRANSPORT" | "DEDICATED TRANSPORTS" => Some(DEDICATED_TRANSPORTS),
        "OTHER" | "OTHER DATASHEET" | "OTHER DATASHEETS" => Some(OTHER_DATASHEETS),
        "ALLIES" | "ALLIED UNIT" | "ALLIED UNITS" => Some(ALLIED_UNITS),
        "FORTIFICATION" | "FORTIFICATIONS" => Some(FORTIFICATIONS),
        _ => None,
    }
}

/// Section implied by a slot prefix such as `Char1` or `BL2`.
pub fn section_for_slot(slot: &str) -> &'static str {
    let letters: String = slot
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    match letters.as_str() {
        "CHAR" | "EH" | "CH" => CHARACTER,
        "BL" | "BE" => BATTLELINE,
        "DT" => DEDICATED_TRANSPORTS,
        _ => OTHER_DATASHEETS,
    }
}

/// Split `"Title - Faction - Sub Faction - Detachment"` into
/// `(title, faction, detachment)`.
///
/// Two parts give a title and a faction; three or more put the last part in
/// the detachment and join the middle parts back with `" - "`.
pub(crate) fn split_dashed_title(text: &str) -> (String, Option<String>, Option<String>) {
    let parts: Vec<&str> = text
        .split(" - ")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => (String::new(), None, None),
        [title] => (title.to_string(), None, None),
        [title, faction] => (title.to_string(), Some(faction.to_string()), None),
        [title, middle @ .., detachment] => (
            title.to_string(),
            Some(middle.join(" - ")),
            Some(detachment.to_string()),
        ),
    }
}

/// First run of digits in `text` (`"1995pts"` → 1995).
pub(crate) fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse raw text with the parser for `format`.
pub fn parse_text(format: FormatId, text: &str) -> ArmyList {
    parser_for(format).parse_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_every_format() {
        for format in FormatId::PRIORITY {
            assert_eq!(parser_for(format).format(), format);
        }
    }

    #[test]
    fn test_canonical_section_aliases() {
        assert_eq!(canonical_section("CHARACTERS"), Some(CHARACTER));
        assert_eq!(canonical_section("Epic Hero"), Some(CHARACTER));
        assert_eq!(canonical_section("EPIC HEROES"), Some(CHARACTER));
        assert_eq!(canonical_section("Other"), Some(OTHER_DATASHEETS));
        assert_eq!(canonical_section("ALLIES"), Some(ALLIED_UNITS));
        assert_eq!(canonical_section("Dedicated Transport:"), Some(DEDICATED_TRANSPORTS));
        assert_eq!(canonical_section("Captain"), None);
    }

    #[test]
    fn test_section_for_slot() {
        assert_eq!(section_for_slot("Char1"), CHARACTER);
        assert_eq!(section_for_slot("EH2"), CHARACTER);
        assert_eq!(section_for_slot("BL3"), BATTLELINE);
        assert_eq!(section_for_slot("DT1"), DEDICATED_TRANSPORTS);
        assert_eq!(section_for_slot("VE4"), OTHER_DATASHEETS);
    }

    #[test]
    fn test_split_dashed_title() {
        assert_eq!(
            split_dashed_title("Hammer - Space Marines - Ultramarines - Gladius Task Force"),
            (
                "Hammer".to_string(),
                Some("Space Marines - Ultramarines".to_string()),
                Some("Gladius Task Force".to_string())
            )
        );
        assert_eq!(
            split_dashed_title("Hammer - Orks"),
            ("Hammer".to_string(), Some("Orks".to_string()), None)
        );
        assert_eq!(split_dashed_title("Just a title").0, "Just a title");
    }
}
