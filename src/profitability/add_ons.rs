//! Add-on decomposition.
//!
//! A booking stores its add-on selections as a serialized JSON list. Each entry
//! either references the course's add-on catalog by id or is a free-form item
//! carrying its own price and type. Parsing is defensive: anything unreadable
//! contributes nothing and never fails the booking.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::cost::CostPolicy;
use super::models::{AddOnCatalogEntry, Booking};

pub const BUGGY: &str = "buggy";
pub const CLUBS: &str = "clubs";
pub const TROLLEY: &str = "trolley";
pub const OTHER: &str = "other";

/// A course's catalog indexed by entry id.
pub type CatalogIndex<'a> = HashMap<Uuid, &'a AddOnCatalogEntry>;

/// One add-on selection after catalog lookup.
#[derive(Debug, Clone)]
pub enum AddOnLine<'a> {
    /// Selection that references a catalog entry of the booking's course.
    Resolved {
        entry: &'a AddOnCatalogEntry,
        quantity: Decimal,
    },
    /// Free-form item priced on the booking itself.
    Unresolved { addon_type: String, price: Decimal },
}

/// Revenue and cost for one add-on type within a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOnBreakdownItem {
    pub addon_type: String,
    pub revenue: Decimal,
    pub cost: Decimal,
}

/// Add-on totals for a booking, broken out per type in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOnDecomposition {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub breakdown: Vec<AddOnBreakdownItem>,
}

impl AddOnDecomposition {
    /// Fold one line into the totals. Leaves `self` untouched and returns `None`
    /// when any running sum would overflow.
    fn add(&mut self, addon_type: &str, revenue: Decimal, cost: Decimal) -> Option<()> {
        let total_revenue = self.revenue.checked_add(revenue)?;
        let total_cost = self.cost.checked_add(cost)?;

        match self
            .breakdown
            .iter_mut()
            .find(|item| item.addon_type == addon_type)
        {
            Some(item) => {
                let item_revenue = item.revenue.checked_add(revenue)?;
                let item_cost = item.cost.checked_add(cost)?;
                item.revenue = item_revenue;
                item.cost = item_cost;
            }
            None => self.breakdown.push(AddOnBreakdownItem {
                addon_type: addon_type.to_string(),
                revenue,
                cost,
            }),
        }

        self.revenue = total_revenue;
        self.cost = total_cost;
        Some(())
    }
}

/// Map a free-form type tag onto a canonical bucket.
///
/// Tags mentioning buggies, clubs or trolleys map to those buckets; everything else
/// collapses into "other".
pub fn normalize_type(tag: &str) -> &'static str {
    canonical_type(tag).unwrap_or(OTHER)
}

fn canonical_type(tag: &str) -> Option<&'static str> {
    let tag = tag.to_lowercase();
    if tag.contains("buggy") {
        Some(BUGGY)
    } else if tag.contains("club") {
        Some(CLUBS)
    } else if tag.contains("trolley") {
        Some(TROLLEY)
    } else {
        None
    }
}

/// Bucket for a catalog entry. Catalog types outside the canonical set keep their
/// own (lowercased) name so new product lines show up in reports.
pub fn catalog_type(tag: &str) -> String {
    if let Some(canonical) = canonical_type(tag) {
        return canonical.to_string();
    }
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        OTHER.to_string()
    } else {
        tag
    }
}

/// Parse the serialized selection list into raw JSON entries.
///
/// Accepts a JSON array, or a JSON string that itself holds an array (double
/// encoded). Anything else yields no selections.
pub fn parse_selections(booking_id: Uuid, raw: Option<&str>) -> Vec<Value> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };

    let parsed = match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner),
        other => other,
    };

    match parsed {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => Vec::new(),
        Ok(other) => {
            warn!(%booking_id, kind = json_kind(&other), "Add-on data is not a list; ignoring");
            Vec::new()
        }
        Err(e) => {
            warn!(%booking_id, error = %e, "Malformed add-on data; ignoring");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field<'v>(selection: &'v Value, keys: &[&str]) -> Option<&'v Value> {
    keys.iter().find_map(|key| selection.get(*key)).filter(|v| !v.is_null())
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn selection_id(selection: &Value) -> Option<Uuid> {
    match field(selection, &["id", "addon_id", "addonId"])? {
        Value::String(s) => Uuid::parse_str(s.trim()).ok(),
        _ => None,
    }
}

/// Quantity of a selection; missing, unreadable or non-positive values count as one.
fn selection_quantity(selection: &Value) -> Decimal {
    field(selection, &["quantity", "qty"])
        .and_then(decimal_value)
        .filter(|q| *q > Decimal::ZERO)
        .unwrap_or(Decimal::ONE)
}

/// Resolve one raw selection against the course catalog.
///
/// Returns `None` for entries that are neither a catalog reference nor a priced
/// free-form item.
pub fn resolve_selection<'a>(selection: &Value, catalog: &CatalogIndex<'a>) -> Option<AddOnLine<'a>> {
    if !selection.is_object() {
        return None;
    }

    if let Some(entry) = selection_id(selection).and_then(|id| catalog.get(&id).copied()) {
        return Some(AddOnLine::Resolved {
            entry,
            quantity: selection_quantity(selection),
        });
    }

    let price = field(selection, &["price", "amount"]).and_then(decimal_value)?;
    let tag = field(selection, &["type", "addon_type", "name"])
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(AddOnLine::Unresolved {
        addon_type: normalize_type(tag).to_string(),
        price,
    })
}

impl AddOnLine<'_> {
    /// Bucket, revenue and cost for this line. `None` only on arithmetic overflow.
    fn amounts(&self, players: Decimal, policy: &CostPolicy) -> Option<(String, Decimal, Decimal)> {
        match self {
            AddOnLine::Resolved { entry, quantity } => {
                let multiplier = if entry.per_player {
                    quantity.checked_mul(players)?
                } else {
                    *quantity
                };
                let revenue = entry.price.checked_mul(multiplier)?;
                let cost = match entry.cost {
                    Some(unit_cost) => unit_cost.checked_mul(multiplier)?,
                    None => revenue.checked_mul(policy.default_add_on_cost_ratio)?,
                };
                Some((catalog_type(&entry.addon_type), revenue, cost))
            }
            AddOnLine::Unresolved { addon_type, price } => {
                let cost = price.checked_mul(policy.default_add_on_cost_ratio)?;
                Some((addon_type.clone(), *price, cost))
            }
        }
    }
}

/// Decompose a booking's add-on selections into typed revenue and cost.
pub fn decompose(
    booking: &Booking,
    catalog: &CatalogIndex<'_>,
    policy: &CostPolicy,
) -> AddOnDecomposition {
    let players = Decimal::from(booking.players.max(1));
    let mut result = AddOnDecomposition::default();

    for selection in parse_selections(booking.id, booking.add_ons.as_deref()) {
        let Some(line) = resolve_selection(&selection, catalog) else {
            debug!(booking_id = %booking.id, "Skipping unpriced add-on selection");
            continue;
        };

        let added = line
            .amounts(players, policy)
            .and_then(|(addon_type, revenue, cost)| result.add(&addon_type, revenue, cost));
        if added.is_none() {
            warn!(booking_id = %booking.id, "Add-on amount overflowed; ignoring selection");
        }
    }

    result
}
