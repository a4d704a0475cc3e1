//! Lab-value prediction: single patients, batches and result export

mod batch;
mod export;
mod ingest;
mod predictor;

pub use batch::{BatchSummary, BatchTabularRunner, RowOutcome, ERROR_LABEL};
pub use export::{save_results, DIAGNOSIS_COLUMN};
pub use ingest::{normalize_column_name, PatientRow, PatientTable, REQUIRED_COLUMNS};
pub use predictor::TabularPredictor;
