use crate::history::{HistoryRecord, DISPLAY_TIMESTAMP_FORMAT};
use crate::imaging::ImageBatchResult;
use crate::tabular::{BatchSummary, RowOutcome};
use crate::types::{CtPrediction, PredictionOutcome};
use std::fmt;
use std::path::Path;

/// Registered lab-test models
pub struct ModelListReport<'a> {
    names: &'a [&'a str],
    default: &'a str,
}

impl<'a> ModelListReport<'a> {
    pub fn new(names: &'a [&'a str], default: &'a str) -> Self {
        Self { names, default }
    }
}

impl<'a> fmt::Display for ModelListReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available Models")?;
        writeln!(f, "================")?;
        for name in self.names {
            if *name == self.default {
                writeln!(f, "  {} (default)", name)?;
            } else {
                writeln!(f, "  {}", name)?;
            }
        }
        Ok(())
    }
}

/// Single lab-test prediction
pub struct LabReport<'a> {
    patient: &'a str,
    model: &'a str,
    outcome: &'a PredictionOutcome,
}

impl<'a> LabReport<'a> {
    pub fn new(patient: &'a str, model: &'a str, outcome: &'a PredictionOutcome) -> Self {
        Self {
            patient,
            model,
            outcome,
        }
    }
}

impl<'a> fmt::Display for LabReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lab Test Result")?;
        writeln!(f, "===============")?;
        writeln!(f)?;
        writeln!(f, "Patient:    {}", self.patient)?;
        writeln!(f, "Model:      {}", self.model)?;
        writeln!(f, "Diagnosis:  {}", self.outcome.diagnosis())?;
        writeln!(f, "Confidence: {:.1}%", self.outcome.confidence_percent)?;
        Ok(())
    }
}

/// Single CT image prediction
///
/// Shows the confidence of the winning class.
pub struct CtReport<'a> {
    image: &'a str,
    prediction: &'a CtPrediction,
}

impl<'a> CtReport<'a> {
    pub fn new(image: &'a str, prediction: &'a CtPrediction) -> Self {
        Self { image, prediction }
    }
}

impl<'a> fmt::Display for CtReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CT Scan Result")?;
        writeln!(f, "==============")?;
        writeln!(f)?;
        writeln!(f, "Image:       {}", self.image)?;
        writeln!(f, "Diagnosis:   {}", self.prediction.diagnosis())?;
        writeln!(f, "Confidence:  {:.1}%", self.prediction.display_confidence())?;
        writeln!(f, "Probability: {:.4}", self.prediction.raw_probability)?;
        Ok(())
    }
}

/// Per-patient labels of a tabular batch
pub struct BatchReport<'a> {
    names: &'a [String],
    outcomes: &'a [RowOutcome],
    saved: Option<&'a Path>,
}

impl<'a> BatchReport<'a> {
    pub fn new(names: &'a [String], outcomes: &'a [RowOutcome], saved: Option<&'a Path>) -> Self {
        Self {
            names,
            outcomes,
            saved,
        }
    }
}

impl<'a> fmt::Display for BatchReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Results")?;
        writeln!(f, "=============")?;
        writeln!(f)?;
        for (name, outcome) in self.names.iter().zip(self.outcomes) {
            match outcome {
                RowOutcome::Diagnosed(o) => writeln!(
                    f,
                    "{:<24} {:<8} {:.1}%",
                    name,
                    outcome.label(),
                    o.confidence_percent
                )?,
                RowOutcome::Failed(e) => {
                    writeln!(f, "{:<24} {:<8} {}", name, outcome.label(), e.message)?
                }
            }
        }
        writeln!(f)?;

        let summary = BatchSummary::from_outcomes(self.outcomes);
        writeln!(
            f,
            "Total: {}  Cancer: {}  Healthy: {}  Errors: {}",
            summary.total, summary.positive, summary.negative, summary.errors
        )?;
        if let Some(path) = self.saved {
            writeln!(f, "Saved: {}", path.display())?;
        }
        Ok(())
    }
}

/// Rows of a CT batch, in result-file layout
pub struct ImageBatchReport<'a> {
    results: &'a [ImageBatchResult],
    saved: Option<&'a Path>,
}

impl<'a> ImageBatchReport<'a> {
    pub fn new(results: &'a [ImageBatchResult], saved: Option<&'a Path>) -> Self {
        Self { results, saved }
    }
}

impl<'a> fmt::Display for ImageBatchReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CT Batch Results")?;
        writeln!(f, "================")?;
        writeln!(f)?;
        for result in self.results {
            writeln!(
                f,
                "{:<32} {:<8} {:<8} {}",
                result.image,
                result.diagnosis(),
                result.confidence(),
                result.probability()
            )?;
        }
        writeln!(f)?;

        let errors = self.results.iter().filter(|r| r.is_error()).count();
        let cancer = self
            .results
            .iter()
            .filter(|r| r.diagnosis() == "CANCER")
            .count();
        writeln!(
            f,
            "Total: {}  Cancer: {}  Normal: {}  Errors: {}",
            self.results.len(),
            cancer,
            self.results.len() - cancer - errors,
            errors
        )?;
        if let Some(path) = self.saved {
            writeln!(f, "Saved: {}", path.display())?;
        }
        Ok(())
    }
}

/// Recent history records
pub struct HistoryReport<'a> {
    records: &'a [&'a HistoryRecord],
    total: usize,
}

impl<'a> HistoryReport<'a> {
    pub fn new(records: &'a [&'a HistoryRecord], total: usize) -> Self {
        Self { records, total }
    }
}

impl<'a> fmt::Display for HistoryReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis History ({} records)", self.total)?;
        writeln!(f, "================")?;
        if self.records.is_empty() {
            writeln!(f, "No analysis history yet.")?;
            return Ok(());
        }
        writeln!(
            f,
            "{:<19}  {:<15}  {:<10}  {:<20}  {:<9}  Confidence",
            "Date", "Patient", "Type", "Model", "Diagnosis"
        )?;
        for record in self.records {
            writeln!(
                f,
                "{:<19}  {:<15}  {:<10}  {:<20}  {:<9}  {:.1}%",
                record.timestamp.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
                truncate(&record.patient_name, 15),
                record.analysis_type.label(),
                truncate(&record.model_used, 20),
                record.diagnosis.label(),
                record.confidence
            )?;
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
