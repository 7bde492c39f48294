//! Body engine shared by every dialect.
//!
//! A dialect supplies a [`BodyGrammar`] that recognises its own section,
//! unit and terminator lines. Everything else (bullets, nesting by text
//! column, subunit look-ahead, `N with` groups, warlord and enhancement
//! lines) is decided here so all dialects share one set of nesting rules.

use tracing::trace;

use super::builder::{ListBuilder, ENHANCEMENT_LABEL, WARLORD};
use crate::models::{Item, Quantity};
use crate::text::{parse_quantity_token, parse_with_clause, split_top_level};

/// Characters accepted as list bullets.
pub const BULLETS: [char; 5] = ['•', '◦', '-', '*', '–'];

/// A unit header line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitLine {
    /// Slot prefix such as `Char1`
    pub slot: Option<String>,
    /// Model count, `None` when the line does not state one
    pub quantity: Option<u32>,
    pub name: String,
    pub points: u32,
    /// Comma-separated items after a trailing colon
    pub inline: Vec<String>,
}

/// A wargear or subunit line below a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLine {
    pub quantity: u32,
    pub name: String,
    /// Quantity was written out (`"2x"`)
    pub explicit: bool,
    /// Items after a colon (`"4x Intercessor: Bolt rifle, Bolt pistol"`)
    pub inline: Vec<String>,
}

impl EntryLine {
    /// Parse `"[Nx ]Name[: a, b]"`.
    pub fn parse(text: &str) -> Self {
        let (label, rest) = split_label(text);
        let (quantity, name, explicit) = parse_quantity_token(label);
        Self {
            quantity,
            name,
            explicit,
            inline: rest.map(|r| split_top_level(r, ',')).unwrap_or_default(),
        }
    }
}

/// What a body line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Section(String),
    Unit(UnitLine),
    Enhancement(String),
    Warlord,
    With { count: u32, items: Vec<String> },
    Entry(EntryLine),
    Skip,
    Stop,
}

/// Dialect-specific line recognition.
pub trait BodyGrammar {
    /// Classify a line. `text` has indentation and bullet removed.
    ///
    /// Warlord, enhancement and `N with` lines are recognised before this is
    /// called.
    fn classify(&self, text: &str, bulleted: bool) -> Line;
}

#[derive(Debug)]
struct BodyLine<'a> {
    column: usize,
    bulleted: bool,
    text: &'a str,
    line: Line,
}

/// Split `"label: rest"` at the first colon outside brackets.
pub fn split_label(text: &str) -> (&str, Option<&str>) {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ':' if depth == 0 => {
                let rest = text[i + 1..].trim();
                return (text[..i].trim(), (!rest.is_empty()).then_some(rest));
            }
            _ => {}
        }
    }
    (text.trim(), None)
}

/// Measure a raw line: `(text column, bulleted, text)`.
///
/// The text column counts leading whitespace (tab = 4), the bullet and the
/// spaces after it. `-`, `*` and `–` only count as bullets when followed by
/// whitespace.
pub fn measure(raw: &str) -> (usize, bool, &str) {
    let trimmed = raw.trim_start();
    let indent = &raw[..raw.len() - trimmed.len()];
    let mut column: usize = indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum();

    if let Some(bullet) = trimmed.chars().next().filter(|c| BULLETS.contains(c)) {
        let after = &trimmed[bullet.len_utf8()..];
        if matches!(bullet, '•' | '◦') || after.starts_with(char::is_whitespace) {
            let text = after.trim_start();
            column += 1 + after[..after.len() - text.len()].chars().count();
            return (column, true, text.trim_end());
        }
    }
    (column, false, trimmed.trim_end())
}

/// Strip a leading `Enhancement:` label (any case).
pub fn strip_enhancement_label(text: &str) -> Option<&str> {
    let label = text.get(..ENHANCEMENT_LABEL.len())?;
    label
        .eq_ignore_ascii_case(ENHANCEMENT_LABEL)
        .then(|| text[ENHANCEMENT_LABEL.len()..].trim())
}

fn is_warlord(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(WARLORD)
}

fn classify_common(text: &str) -> Option<Line> {
    if is_warlord(text) {
        return Some(Line::Warlord);
    }
    if let Some(rest) = strip_enhancement_label(text) {
        return Some(Line::Enhancement(rest.to_string()));
    }
    parse_with_clause(text).map(|(count, items)| Line::With { count, items })
}

/// Run the body lines through `grammar` into `builder`.
pub fn parse_body<G: BodyGrammar + ?Sized>(grammar: &G, lines: &[&str], builder: &mut ListBuilder) {
    let mut body: Vec<BodyLine> = Vec::new();
    for raw in lines {
        let (column, bulleted, text) = measure(raw);
        if text.is_empty() {
            continue;
        }
        let line = classify_common(text).unwrap_or_else(|| grammar.classify(text, bulleted));
        match line {
            Line::Stop => {
                trace!("End of list at '{}'", text);
                break;
            }
            Line::Skip => trace!("Skipping line '{}'", text),
            line => body.push(BodyLine {
                column,
                bulleted,
                text,
                line,
            }),
        }
    }

    let mut unit_column = 0usize;
    // (text column, index) of the open subunit
    let mut open: Option<(usize, usize)> = None;

    for (i, current) in body.iter().enumerate() {
        let column = current.column;
        match &current.line {
            Line::Section(label) => {
                builder.set_section(label);
                open = None;
            }
            Line::Unit(unit) => {
                builder.start_unit(unit.slot.as_deref(), unit.quantity, &unit.name, unit.points);
                unit_column = column;
                open = None;
                add_tokens(builder, None, &unit.inline, 1);
            }
            Line::Warlord => builder.add_warlord(),
            Line::Enhancement(text) => builder.add_enhancement(text),
            Line::With { count, items } => {
                if !builder.has_unit() {
                    trace!("'{}' outside a unit, ignoring", current.text);
                    continue;
                }
                if open.is_some_and(|(c, _)| column <= c) {
                    open = None;
                }
                let target = open.map(|(_, idx)| idx);
                for item in items {
                    add_with_item(builder, target, *count, item);
                }
            }
            Line::Entry(entry) => {
                if !builder.has_unit() {
                    trace!("'{}' outside a unit, ignoring", current.text);
                    continue;
                }
                if !(current.bulleted || column > unit_column || entry.explicit) {
                    trace!("Not an item line: '{}'", current.text);
                    continue;
                }
                if open.is_some_and(|(c, _)| column <= c) {
                    open = None;
                }

                match open {
                    Some((_, idx)) => {
                        let inherited = builder.subunit_quantity(idx);
                        let quantity = if entry.explicit {
                            entry.quantity
                        } else {
                            inherited
                        };
                        builder.add_item(Some(idx), Item::wargear(Quantity::new(quantity), &entry.name));
                        add_tokens(builder, Some(idx), &entry.inline, inherited);
                    }
                    None if !entry.inline.is_empty() || opens_subunit(&body, i) => {
                        if let Some(idx) = builder.add_subunit(entry.quantity, &entry.name) {
                            open = Some((column, idx));
                            add_tokens(builder, Some(idx), &entry.inline, entry.quantity);
                        }
                    }
                    None => {
                        builder.add_item(None, Item::wargear(Quantity::new(entry.quantity), &entry.name));
                    }
                }
            }
            Line::Skip | Line::Stop => {}
        }
    }
}

/// An entry opens a subunit when the next line is an item line further right.
fn opens_subunit(body: &[BodyLine], i: usize) -> bool {
    let column = body[i].column;
    body.get(i + 1).is_some_and(|next| {
        matches!(next.line, Line::Entry(_) | Line::With { .. } | Line::Warlord) && next.column > column
    })
}

fn add_with_item(builder: &mut ListBuilder, target: Option<usize>, count: u32, item: &str) {
    let (quantity, name, _) = parse_quantity_token(item);
    builder.add_item(
        target,
        Item::wargear(Quantity::new(count.saturating_mul(quantity)), name),
    );
}

/// Add comma-separated inline items.
///
/// A `"N with a"` token starts a group: it and every later token in the same
/// list get `N` times their own quantity. Outside a group an unstated
/// quantity is `inherited` (the subunit's size, or 1 on a unit).
pub fn add_tokens(builder: &mut ListBuilder, target: Option<usize>, tokens: &[String], inherited: u32) {
    let mut group: Option<u32> = None;
    for token in tokens {
        if is_warlord(token) {
            builder.add_warlord();
            continue;
        }
        if let Some(rest) = strip_enhancement_label(token) {
            builder.add_enhancement(rest);
            continue;
        }
        if let Some((count, items)) = parse_with_clause(token) {
            group = Some(count);
            for item in &items {
                add_with_item(builder, target, count, item);
            }
            continue;
        }
        match group {
            Some(count) => add_with_item(builder, target, count, token),
            None => {
                let (quantity, name, explicit) = parse_quantity_token(token);
                let quantity = if explicit { quantity } else { inherited };
                builder.add_item(target, Item::wargear(Quantity::new(quantity), name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArmyList, Unit, DEFAULT_SECTION};
    use std::sync::LazyLock;

    use regex::Regex;

    /// Minimal grammar: `Name (N pts)` units, `== Label ==` sections, `END`.
    struct TestGrammar;

    static RE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^(?:(\d+)x\s+)?(.+?)\s*\((\d+) pts\)$").expect("Invalid regex")
    });

    impl BodyGrammar for TestGrammar {
        fn classify(&self, text: &str, bulleted: bool) -> Line {
            if text == "END" {
                return Line::Stop;
            }
            if let Some(label) = text.strip_prefix("== ").and_then(|t| t.strip_suffix(" ==")) {
                return Line::Section(label.to_string());
            }
            if !bulleted {
                if let Some(caps) = RE_UNIT.captures(text) {
                    return Line::Unit(UnitLine {
                        quantity: caps.get(1).and_then(|m| m.as_str().parse().ok()),
                        name: caps[2].to_string(),
                        points: caps[3].parse().unwrap_or(0),
                        ..Default::default()
                    });
                }
            }
            Line::Entry(EntryLine::parse(text))
        }
    }

    fn run(text: &str) -> ArmyList {
        let lines: Vec<&str> = text.lines().collect();
        let mut builder = ListBuilder::new();
        parse_body(&TestGrammar, &lines, &mut builder);
        builder.finish()
    }

    fn first_unit(list: &ArmyList) -> &Unit {
        list.units().next().unwrap()
    }

    #[test]
    fn test_measure_columns_and_bullets() {
        assert_eq!(measure("• 1x Bolt pistol"), (2, true, "1x Bolt pistol"));
        assert_eq!(measure("  ◦ 1x Bolt pistol"), (4, true, "1x Bolt pistol"));
        assert_eq!(measure("\t- Chainsword"), (6, true, "Chainsword"));
        assert_eq!(measure("--- HQ ---"), (0, false, "--- HQ ---"));
        assert_eq!(measure("-5 pts"), (0, false, "-5 pts"));
        assert_eq!(measure("   "), (3, false, ""));
    }

    #[test]
    fn test_split_label_ignores_bracketed_colons() {
        assert_eq!(
            split_label("4x Intercessor: Bolt rifle, Bolt pistol"),
            ("4x Intercessor", Some("Bolt rifle, Bolt pistol"))
        );
        assert_eq!(split_label("Thing (on Char1: X)"), ("Thing (on Char1: X)", None));
        assert_eq!(split_label("Captain:"), ("Captain", None));
    }

    #[test]
    fn test_with_clause_under_subunit_not_multiplied() {
        let list = run("1x Assault Squad (100 pts)\n\
                        • 5x Assault Marine\n    \
                        2 with Plasma Pistol, Chainsword\n    \
                        3 with Bolt Pistol\n");
        let unit = first_unit(&list);
        let sub = &unit.items[0];
        assert_eq!(sub.name(), "Assault Marine");
        assert_eq!(sub.quantity(), Quantity::new(5));
        assert_eq!(
            sub.children(),
            &[
                Item::wargear(Quantity::new(2), "Plasma Pistol"),
                Item::wargear(Quantity::new(2), "Chainsword"),
                Item::wargear(Quantity::new(3), "Bolt Pistol"),
            ]
        );
    }

    #[test]
    fn test_unstated_item_inherits_subunit_quantity() {
        let list = run("Boyz (85 pts)\n\
                        • 9x Boy\n  \
                        ◦ Slugga\n  \
                        ◦ 1x Big shoota\n\
                        • 1x Boss Nob\n  \
                        ◦ Power klaw\n");
        let unit = first_unit(&list);
        assert_eq!(unit.quantity, Quantity::new(10));
        assert!(unit.is_complex);
        assert_eq!(unit.items[0].children()[0], Item::wargear(Quantity::new(9), "Slugga"));
        assert_eq!(unit.items[0].children()[1], Item::wargear(Quantity::ONE, "Big shoota"));
        assert_eq!(unit.items[1].children()[0], Item::wargear(Quantity::ONE, "Power klaw"));
    }

    #[test]
    fn test_entry_without_children_is_wargear() {
        let list = run("Captain (80 pts)\n• Warlord\n• 1x Bolt pistol\n• Enhancement: Artificer Armour (+10 pts)\n");
        let unit = first_unit(&list);
        assert_eq!(unit.items.len(), 3);
        assert_eq!(unit.items[0].name(), "Warlord");
        assert_eq!(unit.items[1], Item::wargear(Quantity::ONE, "Bolt pistol"));
        assert_eq!(unit.items[2].name(), "Enhancement: Artificer Armour");
    }

    #[test]
    fn test_inline_items_open_subunit() {
        let list = run("Intercessor Squad (80 pts)\n\
                        • 4x Intercessor: 4 with Bolt pistol, Bolt rifle\n\
                        • 1x Intercessor Sergeant: Bolt pistol, 1x Chainsword\n");
        let unit = first_unit(&list);
        assert_eq!(unit.items.len(), 2);
        assert_eq!(unit.items[0].children()[1], Item::wargear(Quantity::new(4), "Bolt rifle"));
        assert_eq!(unit.items[1].children()[0], Item::wargear(Quantity::ONE, "Bolt pistol"));
        assert_eq!(unit.quantity, Quantity::new(5));
    }

    #[test]
    fn test_plain_lines_without_marker_skipped() {
        let list = run("Captain (80 pts)\nSome free text note\n• 1x Bolt pistol\n");
        let unit = first_unit(&list);
        assert_eq!(unit.items, vec![Item::wargear(Quantity::ONE, "Bolt pistol")]);
    }

    #[test]
    fn test_lines_before_first_unit_ignored_and_stop() {
        let list = run("• 1x Stray\n== CHARACTER ==\nCaptain (80 pts)\n• 1x Bolt pistol\nEND\nLieutenant (65 pts)\n");
        assert_eq!(list.unit_names(), vec!["Captain"]);
        assert!(list.sections.contains_key("CHARACTER"));
        assert!(!list.sections.contains_key(DEFAULT_SECTION));
    }

    #[test]
    fn test_dedent_closes_subunit() {
        let list = run("Tactical Squad (140 pts)\n\
                        • 1x Sergeant\n    \
                        ◦ 1x Chainsword\n\
                        • 1x Missile launcher\n");
        let unit = first_unit(&list);
        assert_eq!(unit.items[0].children().len(), 1);
        assert_eq!(unit.items[1], Item::wargear(Quantity::ONE, "Missile launcher"));
    }
}
