use crate::error::{DiagnosisError, Result};
use std::fmt;

/// Confidence returned when a classifier exposes neither probabilities nor margins
pub const DEFAULT_CONFIDENCE: f64 = 85.0;

/// How a classifier's confidence is scored
///
/// Resolved once when a model is loaded, never probed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceStrategy {
    /// `max(predict_proba) * 100`
    Probabilistic,
    /// `min(100, 50 + |decision_function| * 10)`
    MarginBased,
    /// Constant [`DEFAULT_CONFIDENCE`]
    Fixed,
}

impl ConfidenceStrategy {
    /// Scores a probability vector as a percentage
    pub fn from_probabilities(probabilities: &[f64]) -> Option<f64> {
        probabilities
            .iter()
            .copied()
            .reduce(f64::max)
            .map(|p| p * 100.0)
    }

    /// Rescales a decision margin into a pseudo-percentage capped at 100
    ///
    /// # Example
    ///
    /// ```
    /// use pancdx_core::model::ConfidenceStrategy;
    ///
    /// assert_eq!(ConfidenceStrategy::from_margin(2.0), 70.0);
    /// assert_eq!(ConfidenceStrategy::from_margin(-7.5), 100.0);
    /// ```
    pub fn from_margin(decision: f64) -> f64 {
        (50.0 + decision.abs() * 10.0).min(100.0)
    }
}

impl fmt::Display for ConfidenceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceStrategy::Probabilistic => "probabilistic",
            ConfidenceStrategy::MarginBased => "margin",
            ConfidenceStrategy::Fixed => "fixed",
        };
        write!(f, "{}", name)
    }
}

/// A pre-trained binary classifier over the 15 derived features
///
/// Implementations always provide `predict`. `predict_proba` and
/// `decision_function` only need to be overridden when the matching
/// [`ConfidenceStrategy`] is reported.
pub trait Classifier: Send + Sync {
    /// Predicts the class label of one scaled feature row
    fn predict(&self, features: &[f64]) -> Result<i64>;

    /// Which confidence interface this classifier exposes
    fn confidence_strategy(&self) -> ConfidenceStrategy;

    /// Class probabilities of one scaled feature row
    fn predict_proba(&self, _features: &[f64]) -> Result<Vec<f64>> {
        Err(DiagnosisError::Inference(
            "classifier does not expose class probabilities".to_string(),
        ))
    }

    /// Signed distance of one scaled feature row to the decision boundary
    fn decision_function(&self, _features: &[f64]) -> Result<f64> {
        Err(DiagnosisError::Inference(
            "classifier does not expose a decision function".to_string(),
        ))
    }
}

/// A fitted feature scaler applied to derived feature rows
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}
