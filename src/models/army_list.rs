//! Army list model.
//!
//! The canonical tree every dialect parser produces: a [`Summary`] header plus
//! ordered sections of [`Unit`]s, each carrying [`Item`]s. Items nest at most
//! one level (a unit may hold subunits, a subunit may not).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use tracing::trace;

use crate::text::normalize_name;

/// Section used when a unit appears before any section header.
pub const DEFAULT_SECTION: &str = "OTHER DATASHEETS";

/// A positive model/item count, rendered as `"<n>x"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    /// Create a quantity; zero is clamped to one.
    pub fn new(count: u32) -> Self {
        Self(count.max(1))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Parse `"3x"`, `"3"` or `"3 x"`.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.trim().trim_end_matches(['x', 'X']).trim();
        digits.parse().ok().map(Self::new)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        *self = *self + rhs;
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Quantity::new(n)),
            Raw::Text(s) => Quantity::parse(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity: {}", s))),
        }
    }
}

/// An entry inside a unit (or subunit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    /// A leaf equipment entry.
    Wargear {
        quantity: Quantity,
        name: String,
        #[serde(default)]
        nameshort: String,
    },
    /// Warlord marker or enhancement; never abbreviated like wargear.
    Special {
        quantity: Quantity,
        name: String,
        #[serde(default)]
        nameshort: String,
    },
    /// A named model group inside a unit. Never nests further.
    Subunit {
        quantity: Quantity,
        name: String,
        #[serde(default)]
        items: Vec<Item>,
    },
}

impl Item {
    pub fn wargear(quantity: Quantity, name: impl Into<String>) -> Self {
        Item::Wargear {
            quantity,
            name: name.into(),
            nameshort: String::new(),
        }
    }

    pub fn special(name: impl Into<String>, nameshort: impl Into<String>) -> Self {
        Item::Special {
            quantity: Quantity::ONE,
            name: name.into(),
            nameshort: nameshort.into(),
        }
    }

    pub fn subunit(quantity: Quantity, name: impl Into<String>) -> Self {
        Item::Subunit {
            quantity,
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Wargear { name, .. } | Item::Special { name, .. } | Item::Subunit { name, .. } => {
                name
            }
        }
    }

    pub fn quantity(&self) -> Quantity {
        match self {
            Item::Wargear { quantity, .. }
            | Item::Special { quantity, .. }
            | Item::Subunit { quantity, .. } => *quantity,
        }
    }

    /// Normalized name used for merge decisions.
    pub fn key(&self) -> String {
        normalize_name(self.name())
    }

    pub fn is_wargear(&self) -> bool {
        matches!(self, Item::Wargear { .. })
    }

    pub fn is_subunit(&self) -> bool {
        matches!(self, Item::Subunit { .. })
    }

    /// Children of a subunit; empty for leaf items.
    pub fn children(&self) -> &[Item] {
        match self {
            Item::Subunit { items, .. } => items,
            _ => &[],
        }
    }
}

/// Insert `item` into `items`, merging with an entry of the same normalized name.
///
/// Wargear and subunit quantities are summed (subunit children merged
/// recursively). Specials are the exception: a warlord marker or enhancement
/// is kept once and its quantity never summed. When a subunit meets a plain
/// wargear entry of the same name, the subunit is kept. Returns the index of
/// the entry that now holds the item.
pub fn insert_item(items: &mut Vec<Item>, item: Item) -> usize {
    let key = item.key();
    match items.iter().position(|existing| existing.key() == key) {
        Some(pos) => {
            merge_into(&mut items[pos], item);
            pos
        }
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

fn merge_into(existing: &mut Item, incoming: Item) {
    match (existing, incoming) {
        (Item::Wargear { quantity, .. }, Item::Wargear { quantity: more, .. }) => {
            *quantity += more;
        }
        (
            Item::Subunit {
                quantity, items, ..
            },
            Item::Subunit {
                quantity: more,
                items: incoming_items,
                ..
            },
        ) => {
            *quantity += more;
            for child in incoming_items {
                insert_item(items, child);
            }
        }
        (Item::Special { nameshort, .. }, Item::Special { nameshort: other, .. }) => {
            // Keep the richer short label ("E: BG" < "E: BG (+15)").
            if other.len() > nameshort.len() && other.starts_with(nameshort.as_str()) {
                *nameshort = other;
            }
        }
        (existing, incoming) if existing.is_wargear() && incoming.is_subunit() => {
            trace!(
                "Replacing wargear '{}' with subunit of the same name",
                existing.name()
            );
            *existing = incoming;
        }
        (existing, incoming) => {
            trace!(
                "Dropping '{}': name already used by a different kind of entry ('{}')",
                incoming.name(),
                existing.name()
            );
        }
    }
}

/// A unit in an army list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Number of models
    pub quantity: Quantity,

    /// Unit name
    pub name: String,

    /// Points cost
    #[serde(default)]
    pub points: u32,

    /// Wargear, specials and subunits
    #[serde(default)]
    pub items: Vec<Item>,

    /// Quantity was derived by summing subunits
    #[serde(default)]
    pub is_complex: bool,

    /// Caller-assigned short label
    #[serde(default)]
    pub nameshort: String,
}

impl Unit {
    /// Create a new unit.
    pub fn new(quantity: Quantity, name: impl Into<String>, points: u32) -> Self {
        Self {
            quantity,
            name: name.into(),
            points,
            items: Vec::new(),
            is_complex: false,
            nameshort: String::new(),
        }
    }

    /// Builder method to add items (merging by name).
    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        for item in items {
            insert_item(&mut self.items, item);
        }
        self
    }

    /// Subunits of this unit.
    pub fn subunits(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_subunit())
    }

    /// Sum of subunit quantities (0 when there are none).
    pub fn subunit_models(&self) -> u32 {
        self.subunits().map(|s| s.quantity().get()).sum()
    }

    /// Merge subunits that share a normalized name.
    ///
    /// Quantities are summed and inner items merged by normalized key. Running
    /// it on an already aggregated unit changes nothing.
    pub fn aggregate_subunits(&mut self) {
        let items = std::mem::take(&mut self.items);
        for item in items {
            if item.is_subunit() {
                insert_item(&mut self.items, item);
            } else {
                self.items.push(item);
            }
        }
    }
}

/// Header metadata of a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// List title, may be empty
    #[serde(default)]
    pub list_title: String,

    /// Faction exactly as stated in the source
    pub faction_keyword: Option<String>,

    /// Lowercase canonical faction identifier
    #[serde(default)]
    pub faction_key: String,

    /// `"<Family> - <Faction>"` or a fallback
    #[serde(default)]
    pub display_faction: String,

    /// Detachment name
    pub detachment: Option<String>,

    /// Total as `"<N>pts"`
    pub total_army_points: Option<String>,
}

impl Summary {
    /// Store a total in the canonical `"<N>pts"` form.
    pub fn set_total_points(&mut self, points: u32) {
        self.total_army_points = Some(format!("{}pts", points));
    }

    /// Numeric value of `total_army_points`, if any.
    pub fn total_points_value(&self) -> Option<u32> {
        let digits: String = self
            .total_army_points
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// A normalized army list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmyList {
    /// Header metadata
    pub summary: Summary,

    /// Units grouped by section label, in source order
    pub sections: IndexMap<String, Vec<Unit>>,
}

impl ArmyList {
    /// Create an empty list with the given summary.
    pub fn new(summary: Summary) -> Self {
        Self {
            summary,
            sections: IndexMap::new(),
        }
    }

    /// Append a unit to a section, creating the section on first use.
    pub fn push_unit(&mut self, section: &str, unit: Unit) {
        self.sections.entry(section.to_string()).or_default().push(unit);
    }

    /// All units in section order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.sections.values().flatten()
    }

    /// Get unit names for analysis.
    pub fn unit_names(&self) -> Vec<&str> {
        self.units().map(|u| u.name.as_str()).collect()
    }

    /// Check if list contains a specific unit (singular/plural tolerant).
    pub fn contains_unit(&self, name: &str) -> bool {
        self.units().any(|u| crate::text::names_match(&u.name, name))
    }

    /// Count models of a unit across all entries.
    pub fn count_unit(&self, name: &str) -> u32 {
        self.units()
            .filter(|u| crate::text::names_match(&u.name, name))
            .map(|u| u.quantity.get())
            .sum()
    }

    /// Sum of unit points.
    pub fn total_points(&self) -> u32 {
        self.units().map(|u| u.points).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(|units| units.is_empty())
    }
}
