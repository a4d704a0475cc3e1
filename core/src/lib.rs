pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod history;
pub mod imaging;
pub mod model;
pub mod tabular;
pub mod types;

pub use config::AppConfig;
pub use error::{DiagnosisError, ItemError, Result};
pub use features::{FeatureDeriver, FeatureNormalizer};
pub use history::{HistoryRecord, HistoryStore};
pub use imaging::{BatchImageRunner, ImageClassifier, ImageNormalizer, ImageTensor};
pub use tabular::{BatchTabularRunner, PatientTable, RowOutcome, TabularPredictor};
pub use types::*;
