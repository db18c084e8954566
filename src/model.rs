//! Data models for box selection.
//!
//! This module defines the fundamental data structures for sizing a storage box:
//! - `ItemDefinition`: Physical metadata of one catalog item
//! - `NormalizedItem`: A requested item joined with its definition
//! - `CandidateBox`: One available storage box with dimensions and capacity
//!
//! All constructors validate their inputs, so every value in circulation
//! satisfies its invariants.

use serde::Serialize;
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::identifier::normalize_identifier;
use crate::types::HasHeight;

/// Validation error for item and box data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid volume: {0}")]
    InvalidVolume(String),
    #[error("Invalid stacking: {0}")]
    InvalidStacking(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

fn validate_positive(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_volume(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidVolume(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Physical metadata of one catalog item.
///
/// # Fields
/// * `name` - Display name as written in the catalog
/// * `key` - Normalized lookup key derived from `name`
/// * `unit_volume` - Volume of a single unit in m³
/// * `stackable` - Whether units may be piled on top of each other
/// * `max_stack` - Maximum number of layers per pile (1 when not stackable)
/// * `unit_height` - Height of a single unit in m
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "name": "caixa pequena",
    "key": "caixa_pequena",
    "unit_volume": 0.10,
    "stackable": true,
    "max_stack": 6,
    "unit_height": 0.40
}))]
pub struct ItemDefinition {
    name: String,
    key: String,
    unit_volume: f64,
    stackable: bool,
    max_stack: u32,
    unit_height: f64,
}

impl ItemDefinition {
    /// Height assumed for items whose catalog entry omits it.
    pub const DEFAULT_UNIT_HEIGHT: f64 = 0.5;

    /// Creates a non-stackable item definition.
    pub fn single(
        name: impl Into<String>,
        unit_volume: f64,
        unit_height: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(name, unit_volume, false, 1, unit_height)
    }

    /// Creates a stackable item definition with a layer limit.
    pub fn stackable(
        name: impl Into<String>,
        unit_volume: f64,
        max_stack: u32,
        unit_height: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(name, unit_volume, true, max_stack, unit_height)
    }

    /// Creates a definition after validating every physical value.
    ///
    /// The stack limit only matters for stackable items; non-stackable
    /// definitions always carry `max_stack == 1`.
    ///
    /// # Examples
    /// ```
    /// use box_sizer::model::ItemDefinition;
    ///
    /// let ok = ItemDefinition::new("caixa media", 0.30, true, 5, 0.50);
    /// assert!(ok.is_ok());
    ///
    /// let zero_stack = ItemDefinition::new("caixa media", 0.30, true, 0, 0.50);
    /// assert!(zero_stack.is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        unit_volume: f64,
        stackable: bool,
        max_stack: u32,
        unit_height: f64,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let key = normalize_identifier(&name);
        if key.is_empty() {
            return Err(ValidationError::InvalidIdentifier(format!(
                "'{}' does not contain any usable characters",
                name
            )));
        }
        validate_volume(unit_volume, "Unit volume")?;
        validate_positive(unit_height, "Unit height")?;
        if stackable && max_stack < 1 {
            return Err(ValidationError::InvalidStacking(format!(
                "{} is stackable but allows {} layers",
                name, max_stack
            )));
        }

        Ok(Self {
            name,
            key,
            unit_volume,
            stackable,
            max_stack: if stackable { max_stack } else { 1 },
            unit_height,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn unit_volume(&self) -> f64 {
        self.unit_volume
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn unit_height(&self) -> f64 {
        self.unit_height
    }
}

/// A requested item with a copy of its catalog metadata.
///
/// Carrying the metadata decouples the estimator from the catalog.
/// The quantity is always greater than zero.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedItem {
    name: String,
    quantity: u32,
    unit_volume: f64,
    stackable: bool,
    max_stack: u32,
    unit_height: f64,
}

impl NormalizedItem {
    /// Joins a definition with a requested quantity.
    ///
    /// # Returns
    /// `Err(ValidationError::InvalidQuantity)` for a quantity of zero
    pub fn from_definition(
        definition: &ItemDefinition,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "{} requested with quantity 0",
                definition.name()
            )));
        }
        Ok(Self {
            name: definition.name().to_string(),
            quantity,
            unit_volume: definition.unit_volume(),
            stackable: definition.is_stackable(),
            max_stack: definition.max_stack(),
            unit_height: definition.unit_height(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_volume(&self) -> f64 {
        self.unit_volume
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn unit_height(&self) -> f64 {
        self.unit_height
    }
}

/// One available storage box.
///
/// # Fields
/// * `id` - Box label as listed in the inventory
/// * `dims` - Dimensions (width, length, height) in m
/// * `capacity` - Usable volume in m³ as stated by the inventory
/// * `area` - Floor area in m², if the inventory lists it
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "B-12",
    "dims": [1.5, 2.0, 2.2],
    "capacity": 6.6,
    "area": 3.0
}))]
pub struct CandidateBox {
    pub id: String,
    #[schema(value_type = [f64; 3], example = json!([1.5, 2.0, 2.2]))]
    pub dims: (f64, f64, f64),
    pub capacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

impl CandidateBox {
    /// Creates a new box after validating dimensions and capacity.
    pub fn new(
        id: impl Into<String>,
        dims: (f64, f64, f64),
        capacity: f64,
    ) -> Result<Self, ValidationError> {
        validate_positive(dims.0, "Box width")?;
        validate_positive(dims.1, "Box length")?;
        validate_positive(dims.2, "Box height")?;
        validate_volume(capacity, "Box capacity")?;
        Ok(Self {
            id: id.into(),
            dims,
            capacity,
            area: None,
        })
    }

    /// Attaches the floor area listed by the inventory.
    pub fn with_area(mut self, area: Option<f64>) -> Self {
        self.area = area.filter(|value| value.is_finite() && *value > 0.0);
        self
    }

    pub fn width(&self) -> f64 {
        self.dims.0
    }

    pub fn length(&self) -> f64 {
        self.dims.1
    }
}

impl HasHeight for CandidateBox {
    fn height(&self) -> f64 {
        self.dims.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_derives_key_from_name() {
        let def = ItemDefinition::single("Máquina de Lavar", 0.30, 1.00).unwrap();
        assert_eq!(def.key(), "maquina_de_lavar");
        assert_eq!(def.name(), "Máquina de Lavar");
    }

    #[test]
    fn non_stackable_definition_forces_single_layer() {
        let def = ItemDefinition::new("sofa", 2.5, false, 9, 1.0).unwrap();
        assert!(!def.is_stackable());
        assert_eq!(def.max_stack(), 1);
    }

    #[test]
    fn definition_rejects_invalid_values() {
        assert!(matches!(
            ItemDefinition::single("sofa", 0.0, 1.0),
            Err(ValidationError::InvalidVolume(_))
        ));
        assert!(matches!(
            ItemDefinition::single("sofa", 2.5, -1.0),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            ItemDefinition::single("sofa", f64::NAN, 1.0),
            Err(ValidationError::InvalidVolume(_))
        ));
        assert!(matches!(
            ItemDefinition::stackable("caixa", 0.1, 0, 0.4),
            Err(ValidationError::InvalidStacking(_))
        ));
        assert!(matches!(
            ItemDefinition::single("???", 1.0, 1.0),
            Err(ValidationError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn normalized_item_copies_metadata() {
        let def = ItemDefinition::stackable("caixa grande", 0.50, 4, 0.60).unwrap();
        let item = NormalizedItem::from_definition(&def, 7).unwrap();
        assert_eq!(item.name(), "caixa grande");
        assert_eq!(item.quantity(), 7);
        assert_eq!(item.unit_volume(), 0.50);
        assert!(item.is_stackable());
        assert_eq!(item.max_stack(), 4);
        assert_eq!(item.unit_height(), 0.60);
    }

    #[test]
    fn normalized_item_rejects_zero_quantity() {
        let def = ItemDefinition::single("tv", 0.41, 0.70).unwrap();
        assert!(matches!(
            NormalizedItem::from_definition(&def, 0),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn candidate_box_validates_dimensions_and_capacity() {
        assert!(CandidateBox::new("A", (1.0, 2.0, 2.5), 5.0).is_ok());
        assert!(CandidateBox::new("A", (0.0, 2.0, 2.5), 5.0).is_err());
        assert!(CandidateBox::new("A", (1.0, 2.0, f64::INFINITY), 5.0).is_err());
        assert!(matches!(
            CandidateBox::new("A", (1.0, 2.0, 2.5), 0.0),
            Err(ValidationError::InvalidVolume(_))
        ));
    }

    #[test]
    fn candidate_box_drops_invalid_area() {
        let b = CandidateBox::new("A", (1.0, 2.0, 2.5), 5.0)
            .unwrap()
            .with_area(Some(-2.0));
        assert_eq!(b.area, None);
        let b = b.with_area(Some(2.0));
        assert_eq!(b.area, Some(2.0));
        assert_eq!(b.height(), 2.5);
    }
}
