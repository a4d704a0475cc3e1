use crate::error::{DiagnosisError, ItemError, Result};
use crate::tabular::ingest::{PatientRow, PatientTable};
use crate::tabular::predictor::TabularPredictor;
use crate::types::{NormalizedVector, PredictionOutcome};
use log::{info, warn};

/// Label written for rows that failed
pub const ERROR_LABEL: &str = "ERROR";

/// Result slot for one batch row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Diagnosed(PredictionOutcome),
    Failed(ItemError),
}

impl RowOutcome {
    /// `CANCER`, `Healthy` or `ERROR`
    pub fn label(&self) -> &'static str {
        match self {
            RowOutcome::Diagnosed(outcome) => outcome.diagnosis().label(),
            RowOutcome::Failed(_) => ERROR_LABEL,
        }
    }
}

/// Counts of each label in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[RowOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total: outcomes.len(),
                ..Self::default()
            },
            |mut acc, outcome| {
                match outcome {
                    RowOutcome::Diagnosed(o) if o.is_positive => acc.positive += 1,
                    RowOutcome::Diagnosed(_) => acc.negative += 1,
                    RowOutcome::Failed(_) => acc.errors += 1,
                }
                acc
            },
        )
    }
}

/// Runs a [`TabularPredictor`] over many patient rows
///
/// Rows are processed in order; a failing row yields [`RowOutcome::Failed`]
/// in its own slot and never stops the batch.
pub struct BatchTabularRunner<'a> {
    predictor: &'a TabularPredictor,
}

impl<'a> BatchTabularRunner<'a> {
    pub fn new(predictor: &'a TabularPredictor) -> Self {
        Self { predictor }
    }

    /// Predicts every row, one result per row in input order
    ///
    /// With `skip_normalization`, row values are taken as z-scores.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` before touching any row if no model is loaded.
    pub fn run_batch<'r, I>(&self, rows: I, skip_normalization: bool) -> Result<Vec<RowOutcome>>
    where
        I: IntoIterator<Item = PatientRow<'r>>,
    {
        if !self.predictor.is_loaded() {
            return Err(DiagnosisError::NotLoaded(
                "call load_model() before running a batch".to_string(),
            ));
        }

        let outcomes: Vec<RowOutcome> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| match self.predict_row(&row, skip_normalization) {
                Ok(outcome) => RowOutcome::Diagnosed(outcome),
                Err(e) => {
                    warn!("Row {} failed: {}", index + 1, e);
                    RowOutcome::Failed(ItemError::new(index, &e))
                }
            })
            .collect();

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            "Batch complete: {} rows, {} positive, {} negative, {} errors",
            summary.total, summary.positive, summary.negative, summary.errors
        );
        Ok(outcomes)
    }

    /// Predicts every row of a loaded table
    pub fn run_table(
        &self,
        table: &PatientTable,
        skip_normalization: bool,
    ) -> Result<Vec<RowOutcome>> {
        self.run_batch(table.rows(), skip_normalization)
    }

    fn predict_row(
        &self,
        row: &PatientRow<'_>,
        skip_normalization: bool,
    ) -> Result<PredictionOutcome> {
        let m = row.measurement(skip_normalization)?;
        if skip_normalization {
            let normalized = NormalizedVector::from_z_scores(
                m.age,
                m.sex,
                m.creatinine,
                m.bilirubin,
                m.glucose,
                m.urine_volume,
                m.urine_ph,
            );
            self.predictor.predict_pre_normalized(&normalized)
        } else {
            self.predictor.predict(&m)
        }
    }
}
