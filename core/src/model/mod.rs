//! Tabular classifier contract, serialized artifacts and the model registry
//!
//! The inference pipeline only depends on the [`Classifier`] and [`Scaler`]
//! traits; [`ArtifactLoader`] turns files on disk into trait objects.

mod artifact;
mod classifier;
mod registry;

pub use artifact::{
    ArtifactLoader, CentroidModel, ClassifierArtifact, JsonArtifactLoader, LinearModel, LinearSvm,
    LogisticRegression, ScalerArtifact, StandardScaler,
};
pub use classifier::{Classifier, ConfidenceStrategy, Scaler, DEFAULT_CONFIDENCE};
pub use registry::{
    is_registered, model_names, resolve_model_path, DEFAULT_MODEL_NAME, DEFAULT_SCALER_PATH,
    FALLBACK_MODEL_PATH, MODEL_REGISTRY,
};
