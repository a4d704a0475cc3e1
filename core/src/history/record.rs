use crate::types::{AnalysisType, Diagnosis};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout used in history exports and listings
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One diagnosis made by either pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// When the record was added (RFC 3339 on disk)
    pub timestamp: DateTime<Local>,

    /// Patient label, or the image file name for CT scans
    pub patient_name: String,

    pub analysis_type: AnalysisType,

    /// Registry name for lab tests, network name for CT scans
    pub model_used: String,

    pub diagnosis: Diagnosis,

    /// Confidence shown to the user, in percent
    pub confidence: f64,

    /// Inputs behind the diagnosis
    #[serde(default)]
    pub input_data: Map<String, Value>,
}

impl HistoryRecord {
    /// Creates a record stamped with the current local time
    pub fn new(
        patient_name: impl Into<String>,
        analysis_type: AnalysisType,
        model_used: impl Into<String>,
        diagnosis: Diagnosis,
        confidence: f64,
        input_data: Map<String, Value>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            patient_name: patient_name.into(),
            analysis_type,
            model_used: model_used.into(),
            diagnosis,
            confidence,
            input_data,
        }
    }

    /// Cells of one history export row
    pub fn to_record(&self) -> [String; 7] {
        [
            self.timestamp.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            self.patient_name.clone(),
            self.analysis_type.label().to_string(),
            self.model_used.clone(),
            self.diagnosis.label().to_string(),
            format!("{:.2}", self.confidence),
            Value::Object(self.input_data.clone()).to_string(),
        ]
    }
}
