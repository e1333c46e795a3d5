use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::domain::error::ProbeError;

/// Embedded segmentation model catalog JSON.
const CATALOG_JSON: &str = include_str!("../../resources/segmenter_catalog.json");

/// Parsed catalog, shared process-wide.
static CATALOG: OnceCell<ModelCatalog> = OnceCell::new();

/// One segmentation model: lexicons plus heuristic switches, loadable by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Unique identifier (e.g., "en-small").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the model's behavior.
    pub description: String,
    /// Language code (ISO 639-1).
    pub language: String,
    /// Lowercased abbreviation stems whose trailing period never ends a sentence.
    pub abbreviations: Vec<String>,
    /// Capitalized words that may open a sentence in unpunctuated text.
    pub sentence_starters: Vec<String>,
    /// Whether to apply the capitalization heuristic to unpunctuated text.
    pub split_unpunctuated: bool,
}

/// Catalog of available segmentation models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    /// Catalog version for compatibility checking.
    pub version: u32,
    /// Available models.
    pub models: Vec<ModelProfile>,
}

impl ModelCatalog {
    /// Get the built-in catalog, parsing the embedded JSON on first use.
    pub fn builtin() -> Result<&'static ModelCatalog, ProbeError> {
        CATALOG.get_or_try_init(|| {
            serde_json::from_str(CATALOG_JSON).map_err(|e| {
                ProbeError::Model(format!("Failed to parse embedded model catalog: {}", e))
            })
        })
    }

    /// Find a model by ID.
    pub fn get(&self, model_id: &str) -> Option<&ModelProfile> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// List all model IDs.
    pub fn model_ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = ModelCatalog::builtin().unwrap();
        assert!(catalog.version >= 1);
        assert!(!catalog.models.is_empty());
    }

    #[test]
    fn test_builtin_catalog_contains_en_small() {
        let catalog = ModelCatalog::builtin().unwrap();
        let model = catalog.get("en-small").expect("en-small must be shipped");
        assert_eq!(model.language, "en");
        assert!(model.split_unpunctuated);
        assert!(!model.sentence_starters.is_empty());
    }

    #[test]
    fn test_catalog_get_unknown_is_none() {
        let catalog = ModelCatalog::builtin().unwrap();
        assert!(catalog.get("xx-giant").is_none());
        assert!(catalog.model_ids().contains(&"en-tiny"));
    }
}
