//! Incremental list construction shared by all dialect parsers.
//!
//! Parsers feed events (section, unit start, item, subunit, enhancement,
//! warlord) into a [`ListBuilder`]. The builder owns the merge rules:
//! - items merge by normalized name, and an item named like its own unit
//!   (or subunit) is dropped
//! - enhancements are deduplicated by base name across the whole list
//! - header-declared warlord/enhancements wait until their unit appears
//! - a unit is post-processed when it closes: self-named subunits are
//!   flattened, subunits aggregated, and an unstated quantity derived

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, trace};

use super::{section_for_slot, CHARACTER};
use crate::models::{insert_item, ArmyList, Item, Quantity, Summary, Unit, DEFAULT_SECTION};
use crate::text::{initials, names_match, normalize_name};

/// Prefix of every enhancement item name.
pub const ENHANCEMENT_PREFIX: &str = "Enhancement: ";

/// Label that introduces an enhancement line, matched case-insensitively.
pub const ENHANCEMENT_LABEL: &str = "Enhancement:";

/// Name of the warlord marker item.
pub const WARLORD: &str = "Warlord";

/// `(on Char2: Master of Executions)` / `(on Captain)`
static RE_ON_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*on\s+(?:([A-Za-z]+\d+)\s*:\s*)?([^()]*?)\s*\)").expect("Invalid regex")
});

/// `(+15 pts)`, `[+15 pts]`, `(+15)`, `(15 pts)`
static RE_COST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[(\[]\s*(?:\+\s*(\d+)\s*(?:pts?|points?)?|(\d+)\s*(?:pts?|points?))\s*[)\]]",
    )
    .expect("Invalid regex")
});

/// `Char1: Captain` in a `+ WARLORD:` header line.
static RE_SLOT_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([A-Za-z]+\d+)\s*:\s*)?(.*)$").expect("Invalid regex")
});

/// A parsed enhancement declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    /// Base name, without label, cost or target
    pub name: String,
    /// Point cost, when stated
    pub cost: Option<u32>,
    /// Lowercased slot prefix of the target unit (`char2`)
    pub slot: Option<String>,
    /// Target unit name
    pub target: Option<String>,
}

impl Enhancement {
    /// Parse `"X (+15 pts)"`, `"X [+15 pts]"` or `"X (on Char2: Target)"`.
    ///
    /// A leading `"Enhancement:"` label is tolerated. Returns `None` when no
    /// name remains.
    pub fn parse(text: &str) -> Option<Self> {
        let mut rest = text.trim().to_string();

        let mut slot = None;
        let mut target = None;
        if let Some(caps) = RE_ON_TARGET.captures(&rest) {
            slot = caps.get(1).map(|m| m.as_str().to_lowercase());
            target = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|t| !t.is_empty());
            rest = RE_ON_TARGET.replace(&rest, "").into_owned();
        }

        let mut cost = None;
        if let Some(caps) = RE_COST.captures(&rest) {
            cost = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| m.as_str().parse().ok());
            rest = RE_COST.replace(&rest, "").into_owned();
        }

        let mut name = rest.trim().trim_end_matches(':').trim();
        if let Some(label) = name.get(..ENHANCEMENT_LABEL.len()) {
            if label.eq_ignore_ascii_case(ENHANCEMENT_LABEL) {
                name = name[ENHANCEMENT_LABEL.len()..].trim();
            }
        }
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            cost,
            slot,
            target,
        })
    }

    /// Dedup key: normalized base name.
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Short label of an enhancement: `"E: AA (+10)"`, or `"E: AA"` without a cost.
pub fn enhancement_short(name: &str, cost: Option<u32>) -> String {
    match cost {
        Some(cost) => format!("E: {} (+{})", initials(name), cost),
        None => format!("E: {}", initials(name)),
    }
}

#[derive(Debug)]
struct PendingUnit {
    section: String,
    slot: Option<String>,
    stated: bool,
    unit: Unit,
}

#[derive(Debug)]
enum PendingKind {
    Warlord,
    Enhancement(Enhancement),
}

/// A header-declared special waiting for its unit.
#[derive(Debug)]
struct PendingSpecial {
    slot: Option<String>,
    target: Option<String>,
    kind: PendingKind,
}

impl PendingSpecial {
    fn matches(&self, slot: Option<&str>, unit_name: &str) -> bool {
        match (self.slot.as_deref(), slot) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => self
                .target
                .as_deref()
                .is_some_and(|target| names_match(target, unit_name)),
        }
    }
}

/// Builds an [`ArmyList`] from parser events.
#[derive(Debug, Default)]
pub struct ListBuilder {
    list: ArmyList,
    section: Option<String>,
    current: Option<PendingUnit>,
    /// Enhancement base key → best known cost
    enhancements: IndexMap<String, Option<u32>>,
    pending: Vec<PendingSpecial>,
}

impl ListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary_mut(&mut self) -> &mut Summary {
        &mut self.list.summary
    }

    /// Switch to a new section. Closes the current unit.
    pub fn set_section(&mut self, label: &str) {
        self.close_unit();
        self.section = Some(label.to_string());
    }

    pub fn has_unit(&self) -> bool {
        self.current.is_some()
    }

    /// Start a unit, closing the previous one.
    ///
    /// `quantity` is `None` when the source does not state it; the quantity
    /// is then derived from subunits when the unit closes.
    pub fn start_unit(&mut self, slot: Option<&str>, quantity: Option<u32>, name: &str, points: u32) {
        self.close_unit();

        let slot_section = slot.map(section_for_slot);
        let section = match (slot_section, self.section.as_deref()) {
            (Some(CHARACTER), _) => CHARACTER,
            (_, Some(current)) => current,
            (Some(implied), None) => implied,
            (None, None) => DEFAULT_SECTION,
        }
        .to_string();

        let unit = Unit::new(Quantity::new(quantity.unwrap_or(1)), name.trim(), points);
        trace!("Unit '{}' ({} pts) in {}", unit.name, points, section);
        self.current = Some(PendingUnit {
            section,
            slot: slot.map(str::to_lowercase),
            stated: quantity.is_some(),
            unit,
        });
        self.attach_pending();
    }

    /// Add an item to the current unit, or to one of its subunits.
    pub fn add_item(&mut self, subunit: Option<usize>, item: Item) {
        let Some(pending) = self.current.as_mut() else {
            trace!("No unit open, dropping '{}'", item.name());
            return;
        };
        let key = item.key();
        if key.is_empty() {
            return;
        }
        let unit = &mut pending.unit;
        if key == normalize_name(&unit.name) {
            trace!("Dropping self-reference '{}' on unit", item.name());
            return;
        }

        match subunit.and_then(|idx| unit.items.get_mut(idx)) {
            Some(Item::Subunit { name, items, .. }) => {
                if key == normalize_name(name) {
                    trace!("Dropping self-reference '{}' on subunit", item.name());
                    return;
                }
                insert_item(items, item);
            }
            _ => {
                insert_item(&mut unit.items, item);
            }
        }
    }

    /// Append a subunit to the current unit and return its index.
    ///
    /// Same-name subunits are not merged here; that happens when the unit
    /// closes, so later items still land in the right group.
    pub fn add_subunit(&mut self, quantity: u32, name: &str) -> Option<usize> {
        let pending = self.current.as_mut()?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        pending
            .unit
            .items
            .push(Item::subunit(Quantity::new(quantity), name));
        Some(pending.unit.items.len() - 1)
    }

    /// Quantity of a subunit of the current unit (1 if unknown).
    pub fn subunit_quantity(&self, idx: usize) -> u32 {
        self.current
            .as_ref()
            .and_then(|p| p.unit.items.get(idx))
            .map(|item| item.quantity().get())
            .unwrap_or(1)
    }

    /// Mark the current unit as the warlord.
    pub fn add_warlord(&mut self) {
        match self.current.as_mut() {
            Some(pending) => {
                insert_item(&mut pending.unit.items, Item::special(WARLORD, WARLORD));
            }
            None => trace!("Warlord line outside a unit, ignoring"),
        }
    }

    /// Attach an enhancement written in the body to the current unit.
    pub fn add_enhancement(&mut self, text: &str) {
        if self.current.is_none() {
            trace!("Enhancement '{}' outside a unit, ignoring", text);
            return;
        }
        match Enhancement::parse(text) {
            Some(enhancement) => self.attach_enhancement(enhancement),
            None => trace!("Unreadable enhancement '{}'", text),
        }
    }

    /// Hold a header `+ WARLORD: Char1: Name` until its unit appears.
    pub fn pend_warlord(&mut self, declaration: &str) {
        let Some(caps) = RE_SLOT_TARGET.captures(declaration.trim()) else {
            return;
        };
        let slot = caps.get(1).map(|m| m.as_str().to_lowercase());
        let target = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());
        if slot.is_none() && target.is_none() {
            return;
        }
        self.pending.push(PendingSpecial {
            slot,
            target,
            kind: PendingKind::Warlord,
        });
    }

    /// Hold a header enhancement `X (on Char2: Target)` until its unit appears.
    pub fn pend_enhancement(&mut self, declaration: &str) {
        match Enhancement::parse(declaration) {
            Some(enhancement) if enhancement.slot.is_some() || enhancement.target.is_some() => {
                self.pending.push(PendingSpecial {
                    slot: enhancement.slot.clone(),
                    target: enhancement.target.clone(),
                    kind: PendingKind::Enhancement(enhancement),
                });
            }
            _ => trace!("Header enhancement without target: '{}'", declaration),
        }
    }

    /// Close the last unit and return the list.
    pub fn finish(mut self) -> ArmyList {
        self.close_unit();

        for pending in &self.pending {
            trace!(
                "Dropping unattached header special for {:?}",
                pending.target.as_deref().or(pending.slot.as_deref())
            );
        }

        // A cost learned from a later duplicate upgrades the kept entry.
        let costs = &self.enhancements;
        for unit in self.list.sections.values_mut().flatten() {
            for item in unit.items.iter_mut() {
                if let Item::Special { name, nameshort, .. } = item {
                    let Some(base) = name.strip_prefix(ENHANCEMENT_PREFIX) else {
                        continue;
                    };
                    if let Some(Some(cost)) = costs.get(&normalize_name(base)) {
                        *nameshort = enhancement_short(base, Some(*cost));
                    }
                }
            }
        }

        self.list
    }

    fn attach_enhancement(&mut self, enhancement: Enhancement) {
        let Some(pending) = self.current.as_mut() else {
            return;
        };
        let key = enhancement.key();
        if let Some(known) = self.enhancements.get_mut(&key) {
            if known.is_none() {
                *known = enhancement.cost;
            }
            trace!("Duplicate enhancement '{}' dropped", enhancement.name);
            return;
        }
        self.enhancements.insert(key, enhancement.cost);
        insert_item(
            &mut pending.unit.items,
            Item::special(
                format!("{}{}", ENHANCEMENT_PREFIX, enhancement.name),
                enhancement_short(&enhancement.name, enhancement.cost),
            ),
        );
    }

    fn attach_pending(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let slot = current.slot.clone();
        let name = current.unit.name.clone();

        let (matched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.matches(slot.as_deref(), &name));
        self.pending = rest;

        for special in matched {
            match special.kind {
                PendingKind::Warlord => self.add_warlord(),
                PendingKind::Enhancement(enhancement) => self.attach_enhancement(enhancement),
            }
        }
    }

    fn close_unit(&mut self) {
        let Some(PendingUnit {
            section,
            stated,
            mut unit,
            ..
        }) = self.current.take()
        else {
            return;
        };

        let derived = unit.subunit_models();
        flatten_self_named(&mut unit);
        unit.aggregate_subunits();
        if !stated && derived > 0 {
            unit.quantity = Quantity::new(derived);
            unit.is_complex = true;
        }

        debug!(
            "Closed unit '{}' {} ({} items, complex: {})",
            unit.name,
            unit.quantity,
            unit.items.len(),
            unit.is_complex
        );
        self.list.push_unit(&section, unit);
    }
}

/// Fold subunits named like their unit into the unit itself.
fn flatten_self_named(unit: &mut Unit) {
    let items = std::mem::take(&mut unit.items);
    for item in items {
        match item {
            Item::Subunit {
                name,
                items: children,
                ..
            } if normalize_name(&name) == normalize_name(&unit.name) => {
                for child in children {
                    insert_item(&mut unit.items, child);
                }
            }
            subunit @ Item::Subunit { .. } => unit.items.push(subunit),
            other => {
                insert_item(&mut unit.items, other);
            }
        }
    }
}
