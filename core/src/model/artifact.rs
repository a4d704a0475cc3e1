//! Serialized classifier and scaler artifacts
//!
//! Artifacts are JSON documents tagged by `kind`:
//!
//! ```json
//! { "kind": "logistic_regression", "coef": [ ...15 values... ], "intercept": -0.3 }
//! { "kind": "linear_svm", "coef": [ ... ], "intercept": 0.1, "classes": [0, 1] }
//! { "kind": "nearest_centroid", "centroids": [[ ... ], [ ... ]], "classes": [0, 1] }
//! { "kind": "standard_scaler", "mean": [ ... ], "scale": [ ... ] }
//! ```
//!
//! Other formats plug in through the [`ArtifactLoader`] trait.

use crate::error::{DiagnosisError, Result};
use crate::model::classifier::{Classifier, ConfidenceStrategy, Scaler};
use crate::types::FEATURE_COUNT;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Loads classifier and scaler artifacts from disk
pub trait ArtifactLoader: Send + Sync {
    fn load_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>>;
    fn load_scaler(&self, path: &Path) -> Result<Box<dyn Scaler>>;
}

/// Loader for the JSON artifact formats in this module
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArtifactLoader;

impl ArtifactLoader for JsonArtifactLoader {
    fn load_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let artifact: ClassifierArtifact = read_artifact(path)?;
        artifact.validate()?;
        debug!("Loaded {} classifier from {}", artifact.kind(), path.display());
        Ok(artifact.into_classifier())
    }

    fn load_scaler(&self, path: &Path) -> Result<Box<dyn Scaler>> {
        let artifact: ScalerArtifact = read_artifact(path)?;
        let ScalerArtifact::StandardScaler(scaler) = artifact;
        debug!("Loaded standard scaler from {}", path.display());
        Ok(Box::new(scaler.validated()?))
    }
}

fn read_artifact<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| DiagnosisError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| DiagnosisError::Load(format!("{}: {}", path.display(), e)))
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

fn check_width(what: &str, len: usize) -> Result<()> {
    if len != FEATURE_COUNT {
        return Err(DiagnosisError::Load(format!(
            "{} has {} values, expected {}",
            what, len, FEATURE_COUNT
        )));
    }
    Ok(())
}

fn check_row(features: &[f64], expected: usize) -> Result<()> {
    if features.len() != expected {
        return Err(DiagnosisError::InvalidInput(format!(
            "feature row has {} values, expected {}",
            features.len(),
            expected
        )));
    }
    Ok(())
}

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

/// Tagged classifier artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LinearModel),
    LinearSvm(LinearModel),
    NearestCentroid(CentroidModel),
}

impl ClassifierArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierArtifact::LogisticRegression(_) => "logistic_regression",
            ClassifierArtifact::LinearSvm(_) => "linear_svm",
            ClassifierArtifact::NearestCentroid(_) => "nearest_centroid",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ClassifierArtifact::LogisticRegression(m) | ClassifierArtifact::LinearSvm(m) => {
                check_width("coef", m.coef.len())
            }
            ClassifierArtifact::NearestCentroid(m) => {
                if m.centroids.is_empty() || m.centroids.len() != m.classes.len() {
                    return Err(DiagnosisError::Load(format!(
                        "{} centroids for {} classes",
                        m.centroids.len(),
                        m.classes.len()
                    )));
                }
                m.centroids
                    .iter()
                    .try_for_each(|c| check_width("centroid", c.len()))
            }
        }
    }

    fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::LogisticRegression(m) => Box::new(LogisticRegression(m)),
            ClassifierArtifact::LinearSvm(m) => Box::new(LinearSvm(m)),
            ClassifierArtifact::NearestCentroid(m) => Box::new(m),
        }
    }
}

/// Weights of a linear decision function `coef . x + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
    /// Labels for the negative and positive side of the boundary
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
}

impl LinearModel {
    fn decision(&self, features: &[f64]) -> Result<f64> {
        check_row(features, self.coef.len())?;
        Ok(dot(&self.coef, features) + self.intercept)
    }

    fn label(&self, decision: f64) -> i64 {
        if decision > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }
}

/// Logistic regression; exposes class probabilities
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression(pub LinearModel);

impl Classifier for LogisticRegression {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        let decision = self.0.decision(features)?;
        Ok(self.0.label(decision))
    }

    fn confidence_strategy(&self) -> ConfidenceStrategy {
        ConfidenceStrategy::Probabilistic
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let decision = self.0.decision(features)?;
        let positive = 1.0 / (1.0 + (-decision).exp());
        Ok(vec![1.0 - positive, positive])
    }

    fn decision_function(&self, features: &[f64]) -> Result<f64> {
        self.0.decision(features)
    }
}

/// Linear support vector machine without probability calibration
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSvm(pub LinearModel);

impl Classifier for LinearSvm {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        let decision = self.0.decision(features)?;
        Ok(self.0.label(decision))
    }

    fn confidence_strategy(&self) -> ConfidenceStrategy {
        ConfidenceStrategy::MarginBased
    }

    fn decision_function(&self, features: &[f64]) -> Result<f64> {
        self.0.decision(features)
    }
}

/// Nearest-centroid classifier; predicts labels only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Vec<f64>>,
    pub classes: Vec<i64>,
}

impl Classifier for CentroidModel {
    fn predict(&self, features: &[f64]) -> Result<i64> {
        let mut best: Option<(f64, i64)> = None;
        for (centroid, class) in self.centroids.iter().zip(&self.classes) {
            check_row(features, centroid.len())?;
            let distance: f64 = centroid
                .iter()
                .zip(features)
                .map(|(c, x)| (c - x) * (c - x))
                .sum();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, *class));
            }
        }
        best.map(|(_, class)| class)
            .ok_or_else(|| DiagnosisError::Inference("classifier has no centroids".to_string()))
    }

    fn confidence_strategy(&self) -> ConfidenceStrategy {
        ConfidenceStrategy::Fixed
    }
}

/// Tagged scaler artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    StandardScaler(StandardScaler),
}

/// Per-column standardization `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Checks widths and replaces zero scales with 1
    pub fn validated(mut self) -> Result<Self> {
        check_width("scaler mean", self.mean.len())?;
        check_width("scaler scale", self.scale.len())?;
        for s in self.scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(self)
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        check_row(features, self.mean.len())?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}
