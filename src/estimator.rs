//! Volume and stacking-height estimation for one specific box height.
//!
//! How many units of a stackable item fit on top of each other depends on the
//! height of the box they go into, so the required volume is computed per
//! candidate. The model is deliberately coarse:
//! - a non-stackable item needs `quantity × unit volume`;
//! - a stackable item needs one unit volume of floor budget per stack;
//! - different item types stand side by side, so the peak height is the
//!   tallest single pile rather than a sum.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::NormalizedItem;

/// Safety margin added on top of the raw volume.
pub const DEFAULT_SLACK_FACTOR: f64 = 0.15;

/// Layer accounting for a stackable item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct StackingDetail {
    pub layers_per_stack: u32,
    pub stacks: u64,
}

/// Volume and height used by one requested item.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ItemBreakdown {
    pub name: String,
    pub quantity: u32,
    /// Volume contribution in m³, before slack.
    pub volume: f64,
    /// Height of the tallest pile of this item in m.
    pub height_used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<StackingDetail>,
}

impl std::fmt::Display for ItemBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stacking {
            Some(detail) => write!(
                f,
                "{}× {} → {} stack(s), {:.2} m³ (layers/stack={}, height used {:.2} m)",
                self.quantity,
                self.name,
                detail.stacks,
                self.volume,
                detail.layers_per_stack,
                self.height_used
            ),
            None => write!(
                f,
                "{}× {} → {:.2} m³ (not stackable, height {:.2} m)",
                self.quantity, self.name, self.volume, self.height_used
            ),
        }
    }
}

/// Result of a successful estimate for one box height.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct VolumeEstimate {
    /// Required volume in m³ including slack.
    pub total_volume: f64,
    /// Sum of the item contributions before slack.
    pub raw_volume: f64,
    /// Tallest pile across all items in m.
    pub peak_height_used: f64,
    pub slack_factor: f64,
    pub breakdown: Vec<ItemBreakdown>,
}

/// A stackable item whose single unit does not fit the box height.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema, Error)]
#[error("{item} does not fit in height ({unit_height:.2} m) in a box of {container_height:.2} m")]
pub struct HeightInfeasible {
    pub item: String,
    pub unit_height: f64,
    pub container_height: f64,
}

/// Floor division with the exact floating remainder.
///
/// `1.2 / 0.4` rounds to `2.9999999999999996`, while the remainder-based
/// quotient yields exactly 2 whole layers.
fn whole_layers(container_height: f64, unit_height: f64) -> f64 {
    let remainder = container_height % unit_height;
    let quotient = (container_height - remainder) / unit_height;
    let floored = quotient.floor();
    if quotient - floored > 0.5 {
        floored + 1.0
    } else {
        floored
    }
}

/// Number of layers one pile of a stackable item may have in this box.
///
/// # Returns
/// `min(floor(container_height / unit_height), max_stack)`; 0 when not even
/// one unit fits
pub fn layers_per_stack(container_height: f64, unit_height: f64, max_stack: u32) -> u32 {
    let whole = whole_layers(container_height, unit_height);
    if !whole.is_finite() || whole < 1.0 {
        0
    } else if whole >= f64::from(max_stack) {
        max_stack
    } else {
        whole as u32
    }
}

fn breakdown_for(
    item: &NormalizedItem,
    container_height: f64,
) -> Result<ItemBreakdown, HeightInfeasible> {
    let quantity = item.quantity();

    if !item.is_stackable() {
        return Ok(ItemBreakdown {
            name: item.name().to_string(),
            quantity,
            volume: f64::from(quantity) * item.unit_volume(),
            height_used: item.unit_height(),
            stacking: None,
        });
    }

    let layers = layers_per_stack(container_height, item.unit_height(), item.max_stack());
    if layers < 1 {
        return Err(HeightInfeasible {
            item: item.name().to_string(),
            unit_height: item.unit_height(),
            container_height,
        });
    }

    let stacks = u64::from(quantity).div_ceil(u64::from(layers));
    Ok(ItemBreakdown {
        name: item.name().to_string(),
        quantity,
        // One stack consumes one unit volume of floor budget.
        volume: stacks as f64 * item.unit_volume(),
        height_used: f64::from(layers.min(quantity)) * item.unit_height(),
        stacking: Some(StackingDetail {
            layers_per_stack: layers,
            stacks,
        }),
    })
}

/// Estimates the volume a box of the given height must offer.
///
/// # Parameters
/// * `items` - Normalized items, in the order the breakdown should follow
/// * `container_height` - Inner height of the candidate box in m
/// * `slack_factor` - Proportional safety margin, e.g. 0.15
///
/// # Returns
/// The full estimate, or the first stackable item that cannot stand even a
/// single layer high in this box
///
/// # Examples
/// ```
/// use box_sizer::catalog::Catalog;
/// use box_sizer::estimator::estimate_volume;
/// use box_sizer::model::NormalizedItem;
/// use box_sizer::types::ItemLookup;
///
/// let boxes = Catalog::builtin().lookup("caixa_pequena").unwrap();
/// let items = vec![NormalizedItem::from_definition(boxes, 10).unwrap()];
/// let estimate = estimate_volume(&items, 1.0, 0.15).unwrap();
/// assert!((estimate.total_volume - 0.575).abs() < 1e-9);
/// ```
pub fn estimate_volume(
    items: &[NormalizedItem],
    container_height: f64,
    slack_factor: f64,
) -> Result<VolumeEstimate, HeightInfeasible> {
    let mut raw_volume = 0.0;
    let mut peak_height_used: f64 = 0.0;
    let mut breakdown = Vec::with_capacity(items.len());

    for item in items {
        let entry = breakdown_for(item, container_height)?;
        raw_volume += entry.volume;
        peak_height_used = peak_height_used.max(entry.height_used);
        breakdown.push(entry);
    }

    Ok(VolumeEstimate {
        total_volume: raw_volume * (1.0 + slack_factor),
        raw_volume,
        peak_height_used,
        slack_factor,
        breakdown,
    })
}
