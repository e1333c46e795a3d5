use crate::domain::{ModelCatalog, ProbeError, SegmentationResult};

/// Port for sentence segmentation.
///
/// Implementations own a loadable model; `segment` requires a model to be
/// loaded first.
pub trait Segmenter: Send + Sync {
    /// The catalog of models this segmenter can load.
    fn catalog(&self) -> &ModelCatalog;

    /// Load a model by catalog identifier, replacing any loaded model.
    fn load_model(&self, model_id: &str) -> Result<(), ProbeError>;

    /// Identifier of the currently loaded model, if any.
    fn loaded_model(&self) -> Option<String>;

    /// Check if a model is currently loaded.
    fn is_model_loaded(&self) -> bool;

    /// Unload the current model to free resources.
    fn unload_model(&self);

    /// Split `text` into sentence spans.
    ///
    /// Empty or whitespace-only input yields zero spans, not an error.
    fn segment(&self, text: &str) -> Result<SegmentationResult, ProbeError>;
}
