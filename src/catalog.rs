//! Item catalog with physical metadata per household item.
//!
//! The catalog is built once at startup, either from the built-in table or
//! from a JSON file, and is read-only afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{ItemDefinition, ValidationError};
use crate::types::ItemLookup;

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse catalog file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid catalog entry '{name}': {source}")]
    InvalidEntry {
        name: String,
        #[source]
        source: ValidationError,
    },
    #[error("Catalog entries '{first}' and '{second}' share the key '{key}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },
    #[error("Catalog is empty")]
    Empty,
}

/// (name, m³, stackable, max layers, unit height in m)
const BUILTIN_ITEMS: &[(&str, f64, bool, u32, f64)] = &[
    ("sofa", 2.50, false, 1, 1.00),
    ("geladeira", 1.20, false, 1, 1.80),
    ("mesa", 1.80, false, 1, 0.75),
    ("cadeira de jantar", 0.50, true, 4, 1.00),
    ("caixa pequena", 0.10, true, 6, 0.40),
    ("caixa media", 0.30, true, 5, 0.50),
    ("caixa grande", 0.50, true, 4, 0.60),
    ("fogao", 0.30, false, 1, 0.90),
    ("cama box", 1.60, false, 1, 0.60),
    ("colchao de casal", 0.80, true, 3, 0.25),
    ("colchao de solteiro", 0.50, true, 3, 0.25),
    ("maquina de lavar", 0.30, false, 1, 1.00),
    ("mesa de jantar", 0.84, false, 1, 0.75),
    ("rack", 0.22, false, 1, 0.55),
    ("sofa 2 lugares", 1.18, false, 1, 0.90),
    ("sofa 3 lugares", 2.34, false, 1, 1.00),
    ("tv", 0.41, false, 1, 0.70),
    ("escrivaninha", 0.41, false, 1, 0.75),
    ("cadeira de escritorio", 0.30, true, 3, 1.00),
    ("poltrona", 0.53, false, 1, 1.00),
];

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

/// Ordered, key-indexed collection of item definitions.
#[derive(Clone, Debug)]
pub struct Catalog {
    definitions: Vec<ItemDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, keeping the given order.
    ///
    /// Two definitions whose names normalize to the same key are rejected.
    pub fn from_definitions(definitions: Vec<ItemDefinition>) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(definitions.len());
        for (position, def) in definitions.iter().enumerate() {
            if let Some(previous) = index.insert(def.key().to_string(), position) {
                return Err(CatalogError::DuplicateKey {
                    key: def.key().to_string(),
                    first: definitions[previous].name().to_string(),
                    second: def.name().to_string(),
                });
            }
        }

        Ok(Self { definitions, index })
    }

    /// The catalog shipped with the service.
    pub fn builtin() -> &'static Catalog {
        BUILTIN.get_or_init(|| {
            let definitions = BUILTIN_ITEMS
                .iter()
                .map(|&(name, volume, stackable, max_stack, height)| {
                    ItemDefinition::new(name, volume, stackable, max_stack, height)
                        .expect("built-in catalog entries must be valid")
                })
                .collect();
            Catalog::from_definitions(definitions).expect("built-in catalog keys must be unique")
        })
    }

    /// Loads a catalog from a JSON array of entries.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| match err {
            CatalogError::Json { source, .. } => CatalogError::Json {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parses a catalog from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(raw).map_err(|source| CatalogError::Json {
                path: "<inline>".to_string(),
                source,
            })?;

        let definitions = entries
            .into_iter()
            .map(CatalogEntry::into_definition)
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_definitions(definitions)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ItemLookup for Catalog {
    fn lookup(&self, key: &str) -> Option<&ItemDefinition> {
        self.index.get(key).map(|&position| &self.definitions[position])
    }

    fn definitions(&self) -> &[ItemDefinition] {
        &self.definitions
    }
}

/// One row of a catalog file.
///
/// Accepts the field names of the original spreadsheet as aliases.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(alias = "nome")]
    name: String,
    #[serde(alias = "m3")]
    volume: f64,
    #[serde(default, alias = "empilhavel")]
    stackable: bool,
    #[serde(default, alias = "max_emp")]
    max_stack: Option<u32>,
    #[serde(default, alias = "altura")]
    height: Option<f64>,
}

impl CatalogEntry {
    fn into_definition(self) -> Result<ItemDefinition, CatalogError> {
        let CatalogEntry {
            name,
            volume,
            stackable,
            max_stack,
            height,
        } = self;

        ItemDefinition::new(
            name.clone(),
            volume,
            stackable,
            max_stack.unwrap_or(1),
            height.unwrap_or(ItemDefinition::DEFAULT_UNIT_HEIGHT),
        )
        .map_err(|source| CatalogError::InvalidEntry { name, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_keeps_declaration_order() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 20);
        let first: Vec<&str> = catalog
            .definitions()
            .iter()
            .take(3)
            .map(|d| d.name())
            .collect();
        assert_eq!(first, vec!["sofa", "geladeira", "mesa"]);
    }

    #[test]
    fn builtin_lookup_by_normalized_key() {
        let catalog = Catalog::builtin();
        let def = catalog.lookup("caixa_pequena").expect("caixa pequena present");
        assert!(def.is_stackable());
        assert_eq!(def.max_stack(), 6);
        assert_eq!(def.unit_height(), 0.40);
        assert!(catalog.lookup("caixa pequena").is_none());
        assert!(catalog.lookup("piano").is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let defs = vec![
            ItemDefinition::single("Fogão", 0.3, 0.9).unwrap(),
            ItemDefinition::single("fogao", 0.3, 0.9).unwrap(),
        ];
        let err = Catalog::from_definitions(defs).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { ref key, .. } if key == "fogao"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            Catalog::from_definitions(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn json_entries_apply_defaults_and_aliases() {
        let raw = r#"[
            {"name": "Piano", "volume": 1.5},
            {"nome": "caixote", "m3": 0.2, "empilhavel": true, "max_emp": 3, "altura": 0.3}
        ]"#;
        let catalog = Catalog::from_json_str(raw).unwrap();

        let piano = catalog.lookup("piano").unwrap();
        assert!(!piano.is_stackable());
        assert_eq!(piano.max_stack(), 1);
        assert_eq!(piano.unit_height(), ItemDefinition::DEFAULT_UNIT_HEIGHT);

        let crate_def = catalog.lookup("caixote").unwrap();
        assert!(crate_def.is_stackable());
        assert_eq!(crate_def.max_stack(), 3);
        assert_eq!(crate_def.unit_height(), 0.3);
    }

    #[test]
    fn stackable_entry_without_limit_defaults_to_single_layer() {
        let catalog = Catalog::from_json_str(r#"[{"name": "caixa", "volume": 0.2, "stackable": true}]"#)
            .unwrap();
        assert_eq!(catalog.lookup("caixa").unwrap().max_stack(), 1);
    }

    #[test]
    fn invalid_json_entry_names_the_item() {
        let err = Catalog::from_json_str(r#"[{"name": "ghost", "volume": 0.0}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEntry { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn loads_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "bicicleta", "volume": 0.6, "height": 1.1}}]"#).unwrap();

        let catalog = Catalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("bicicleta").unwrap().unit_height(), 1.1);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::from_json_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
