use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one tabular inference call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionOutcome {
    /// Label returned by the classifier
    pub raw_label: i64,
    /// Whether the label is the positive (cancer) class
    pub is_positive: bool,
    /// Confidence in [0, 100]
    pub confidence_percent: f64,
}

impl PredictionOutcome {
    /// Creates an outcome; the positive class is label 1
    pub fn new(raw_label: i64, confidence_percent: f64) -> Self {
        Self {
            raw_label,
            is_positive: raw_label == 1,
            confidence_percent,
        }
    }

    /// Diagnosis recorded for a lab test
    pub fn diagnosis(&self) -> Diagnosis {
        if self.is_positive {
            Diagnosis::Cancer
        } else {
            Diagnosis::Healthy
        }
    }
}

/// Outcome of one CT image inference call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CtPrediction {
    /// `raw_probability > 0.5`
    pub is_positive: bool,
    /// Always `raw_probability * 100`, also for negative predictions
    pub confidence_percent: f64,
    /// Positive-class probability in [0, 1]
    pub raw_probability: f64,
}

impl CtPrediction {
    /// Creates a prediction from the positive-class probability
    pub fn from_probability(probability: f64) -> Self {
        Self {
            is_positive: probability > 0.5,
            confidence_percent: probability * 100.0,
            raw_probability: probability,
        }
    }

    /// Confidence in the winning class, as shown to the user
    ///
    /// `confidence_percent` keeps the positive-class value; this is the
    /// `100 - p * 100` complement for negative predictions.
    pub fn display_confidence(&self) -> f64 {
        if self.is_positive {
            self.confidence_percent
        } else {
            100.0 - self.confidence_percent
        }
    }

    /// Diagnosis recorded for a CT scan
    pub fn diagnosis(&self) -> Diagnosis {
        if self.is_positive {
            Diagnosis::Cancer
        } else {
            Diagnosis::Normal
        }
    }
}

/// Diagnosis label stored in history and result files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    #[serde(rename = "CANCER")]
    Cancer,
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Diagnosis {
    /// Returns the label written to result files
    pub fn label(&self) -> &'static str {
        match self {
            Diagnosis::Cancer => "CANCER",
            Diagnosis::Healthy => "Healthy",
            Diagnosis::Normal => "Normal",
            Diagnosis::NotAvailable => "N/A",
        }
    }

    pub fn is_cancer(&self) -> bool {
        matches!(self, Diagnosis::Cancer)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which pipeline produced a diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisType {
    #[serde(rename = "Lab Test")]
    LabTest,
    #[serde(rename = "CT Scan")]
    CtScan,
}

impl AnalysisType {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::LabTest => "Lab Test",
            AnalysisType::CtScan => "CT Scan",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
