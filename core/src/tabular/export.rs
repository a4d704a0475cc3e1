use crate::error::{DiagnosisError, Result};
use crate::export::{timestamped_csv_path, write_csv};
use crate::tabular::batch::RowOutcome;
use crate::tabular::ingest::PatientTable;
use std::path::{Path, PathBuf};

/// Column appended to the patient table
pub const DIAGNOSIS_COLUMN: &str = "Diagnosis";

/// Writes the input table plus a `Diagnosis` column to `results_<timestamp>.csv`
///
/// The header row carries the normalized column names (`urine_volume`,
/// `sex`), so synonyms in the input come out under their canonical name.
/// Cell values are written as read.
///
/// # Errors
///
/// Returns `Export` if the outcome count does not match the table or the file
/// cannot be written.
pub fn save_results(table: &PatientTable, outcomes: &[RowOutcome], dir: &Path) -> Result<PathBuf> {
    if outcomes.len() != table.len() {
        return Err(DiagnosisError::Export(format!(
            "{} outcomes for {} rows",
            outcomes.len(),
            table.len()
        )));
    }

    let headers = table
        .columns()
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(DIAGNOSIS_COLUMN));
    let rows = table
        .raw_rows()
        .iter()
        .zip(outcomes)
        .map(|(row, outcome)| {
            row.iter()
                .map(String::as_str)
                .chain(std::iter::once(outcome.label()))
        });

    let path = timestamped_csv_path(dir, "results");
    write_csv(&path, headers, rows)?;
    Ok(path)
}
