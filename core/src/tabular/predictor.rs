use crate::config::AppConfig;
use crate::error::{DiagnosisError, Result};
use crate::features::{FeatureDeriver, FeatureNormalizer};
use crate::model::{
    resolve_model_path, ArtifactLoader, Classifier, ConfidenceStrategy, JsonArtifactLoader,
    Scaler, DEFAULT_CONFIDENCE,
};
use crate::types::{DerivedFeatureVector, NormalizedVector, PredictionOutcome, RawLabMeasurement};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// A classifier and scaler that were loaded together
struct LoadedModel {
    name: String,
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn Scaler>,
    strategy: ConfidenceStrategy,
}

/// Tabular lab-test predictor
///
/// Owns at most one classifier/scaler pair. [`load_model`](Self::load_model)
/// and [`install`](Self::install) are the only mutators and always replace
/// both halves together.
pub struct TabularPredictor {
    base_path: PathBuf,
    scaler_path: PathBuf,
    loader: Box<dyn ArtifactLoader>,
    normalizer: FeatureNormalizer,
    deriver: FeatureDeriver,
    loaded: Option<LoadedModel>,
}

impl TabularPredictor {
    /// Creates an unloaded predictor reading JSON artifacts
    pub fn new(config: &AppConfig) -> Self {
        Self::with_loader(config, Box::new(JsonArtifactLoader))
    }

    /// Creates an unloaded predictor with a custom artifact loader
    pub fn with_loader(config: &AppConfig, loader: Box<dyn ArtifactLoader>) -> Self {
        Self {
            base_path: config.base_path.clone(),
            scaler_path: config.scaler_path(),
            loader,
            normalizer: FeatureNormalizer::new(),
            deriver: FeatureDeriver::new(),
            loaded: None,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Name of the loaded model, if any
    pub fn model_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|m| m.name.as_str())
    }

    /// Confidence strategy of the loaded model, if any
    pub fn confidence_strategy(&self) -> Option<ConfidenceStrategy> {
        self.loaded.as_ref().map(|m| m.strategy)
    }

    /// Loads a registered model and the shared scaler
    ///
    /// Unknown names fall back to the default artifact. On any failure the
    /// predictor is left unloaded and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Load` if either artifact is missing or corrupt.
    pub fn load_model(&mut self, name: &str) -> Result<()> {
        self.loaded = None;

        let model_path = self.base_path.join(resolve_model_path(name));
        let classifier = self.loader.load_classifier(&model_path)?;
        let scaler = self.loader.load_scaler(&self.scaler_path)?;

        self.install(name, classifier, scaler);
        info!("Model '{}' loaded from {}", name, model_path.display());
        Ok(())
    }

    /// Replaces the loaded pair with already-constructed components
    pub fn install(
        &mut self,
        name: &str,
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn Scaler>,
    ) {
        let strategy = classifier.confidence_strategy();
        debug!("Model '{}' uses {} confidence", name, strategy);
        self.loaded = Some(LoadedModel {
            name: name.to_string(),
            classifier,
            scaler,
            strategy,
        });
    }

    /// Predicts from raw lab values
    ///
    /// Normalizes, derives, scales and classifies.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` if no model is loaded, or the classifier's error.
    pub fn predict(&self, raw: &RawLabMeasurement) -> Result<PredictionOutcome> {
        let normalized = self.normalizer.normalize(raw);
        self.predict_pre_normalized(&normalized)
    }

    /// Predicts from values that are already z-scored
    ///
    /// Skips normalization only; the scaler still runs on the derived features.
    pub fn predict_pre_normalized(
        &self,
        normalized: &NormalizedVector,
    ) -> Result<PredictionOutcome> {
        let model = self.loaded()?;
        let features = self.deriver.derive(normalized);
        Self::classify(model, &features)
    }

    fn loaded(&self) -> Result<&LoadedModel> {
        self.loaded.as_ref().ok_or_else(|| {
            DiagnosisError::NotLoaded("call load_model() before predicting".to_string())
        })
    }

    fn classify(
        model: &LoadedModel,
        features: &DerivedFeatureVector,
    ) -> Result<PredictionOutcome> {
        let scaled = model.scaler.transform(features.as_slice())?;
        let label = model.classifier.predict(&scaled)?;
        let confidence = Self::score_confidence(model, &scaled);
        debug!(
            "Model '{}' predicted {} ({:.1}%)",
            model.name, label, confidence
        );
        Ok(PredictionOutcome::new(label, confidence))
    }

    /// Scores confidence per the model's strategy
    ///
    /// Failures and non-finite scores fall back to [`DEFAULT_CONFIDENCE`].
    fn score_confidence(model: &LoadedModel, scaled: &[f64]) -> f64 {
        let scored = match model.strategy {
            ConfidenceStrategy::Probabilistic => {
                model.classifier.predict_proba(scaled).and_then(|p| {
                    ConfidenceStrategy::from_probabilities(&p).ok_or_else(|| {
                        DiagnosisError::Inference("empty probability vector".to_string())
                    })
                })
            }
            ConfidenceStrategy::MarginBased => model
                .classifier
                .decision_function(scaled)
                .map(ConfidenceStrategy::from_margin),
            ConfidenceStrategy::Fixed => return DEFAULT_CONFIDENCE,
        };

        match scored {
            Ok(confidence) if confidence.is_finite() => confidence,
            Ok(confidence) => {
                warn!("Non-finite confidence {}, using default", confidence);
                DEFAULT_CONFIDENCE
            }
            Err(e) => {
                warn!("Confidence scoring failed, using default: {}", e);
                DEFAULT_CONFIDENCE
            }
        }
    }
}
