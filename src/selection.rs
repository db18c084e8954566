//! Turns a raw quantity request into normalized item records.
//!
//! Quantities arrive from operators as text or numbers. Anything that is not
//! a usable integer counts as zero. Identifiers are matched against the
//! catalog by normalized key; unknown identifiers are dropped without error.

use std::collections::HashMap;

use serde::Deserialize;

use crate::identifier::normalize_identifier;
use crate::model::NormalizedItem;
use crate::types::ItemLookup;

/// A requested quantity as received from the caller.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
    /// Any other JSON value (null, bool, list, object); always zero.
    Other(serde_json::Value),
}

impl QuantityInput {
    /// Effective quantity after coercion, clamping and saturation.
    pub fn effective_quantity(&self) -> u32 {
        match self {
            QuantityInput::Number(value) => quantity_from_number(*value),
            QuantityInput::Text(raw) => parse_quantity_text(raw),
            QuantityInput::Other(_) => 0,
        }
    }
}

impl From<u32> for QuantityInput {
    fn from(value: u32) -> Self {
        QuantityInput::Number(f64::from(value))
    }
}

impl From<&str> for QuantityInput {
    fn from(value: &str) -> Self {
        QuantityInput::Text(value.to_string())
    }
}

/// Parses operator text as an integer quantity.
///
/// Unparsable text yields 0, negative values clamp to 0 and values beyond
/// `u32::MAX` saturate. Single underscores between digits group them, so
/// `"1_000"` reads as 1000.
pub fn parse_quantity_text(raw: &str) -> u32 {
    strip_digit_separators(raw.trim())
        .and_then(|digits| digits.parse::<i128>().ok())
        .map_or(0, clamp_quantity)
}

/// Removes `_` separators; `None` when one is not enclosed by digits.
fn strip_digit_separators(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(raw.len());
    let mut previous_is_digit = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            let next_is_digit = chars.peek().is_some_and(char::is_ascii_digit);
            if !(previous_is_digit && next_is_digit) {
                return None;
            }
            previous_is_digit = false;
        } else {
            previous_is_digit = c.is_ascii_digit();
            digits.push(c);
        }
    }
    Some(digits)
}

fn quantity_from_number(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // `as` truncates toward zero and saturates at u32::MAX.
    value.trunc() as u32
}

fn clamp_quantity(value: i128) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// An identifier with its coerced quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestedItem {
    pub identifier: String,
    pub quantity: u32,
}

impl RequestedItem {
    pub fn new(identifier: impl Into<String>, input: &QuantityInput) -> Self {
        Self {
            identifier: identifier.into(),
            quantity: input.effective_quantity(),
        }
    }
}

/// Normalizes a raw request against a catalog.
///
/// # Returns
/// Items in catalog order, each with quantity > 0. Identifiers that fold to
/// the same key have their quantities summed.
pub fn normalize_selection<'a, K, I, L>(requested: I, catalog: &L) -> Vec<NormalizedItem>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, &'a QuantityInput)>,
    L: ItemLookup + ?Sized,
{
    let requested: Vec<RequestedItem> = requested
        .into_iter()
        .map(|(identifier, input)| RequestedItem::new(identifier.as_ref(), input))
        .collect();
    normalize_requested_items(&requested, catalog)
}

/// Normalizes already coerced requests against a catalog.
pub fn normalize_requested_items<L>(requested: &[RequestedItem], catalog: &L) -> Vec<NormalizedItem>
where
    L: ItemLookup + ?Sized,
{
    let mut by_key: HashMap<String, u32> = HashMap::new();
    let mut unknown: Vec<&str> = Vec::new();

    for request in requested {
        if request.quantity == 0 {
            continue;
        }
        let key = normalize_identifier(&request.identifier);
        if catalog.lookup(&key).is_none() {
            unknown.push(request.identifier.as_str());
            continue;
        }
        let total = by_key.entry(key).or_insert(0);
        *total = total.saturating_add(request.quantity);
    }

    if !unknown.is_empty() {
        tracing::debug!(
            dropped = unknown.len(),
            identifiers = ?unknown,
            "Dropping identifiers without catalog entry"
        );
    }

    catalog
        .definitions()
        .iter()
        .filter_map(|def| {
            let quantity = *by_key.get(def.key())?;
            NormalizedItem::from_definition(def, quantity).ok()
        })
        .collect()
}
