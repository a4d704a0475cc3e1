use thiserror::Error;

/// Result type for diagnosis operations
pub type Result<T> = std::result::Result<T, DiagnosisError>;

/// Error types for diagnosis operations
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// Unparsable or missing raw field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prediction requested before a model was loaded
    #[error("Model not loaded: {0}")]
    NotLoaded(String),

    /// Artifact missing or corrupt
    #[error("Failed to load model: {0}")]
    Load(String),

    /// Image decode or resize failure
    #[error("Failed to preprocess image: {0}")]
    Preprocess(String),

    /// Classifier forward pass failure
    #[error("Prediction failed: {0}")]
    Inference(String),

    /// Patient table could not be read
    #[error("Failed to load file: {0}")]
    Ingest(String),

    /// Result file could not be written
    #[error("Export error: {0}")]
    Export(String),

    /// History store failure
    #[error("History error: {0}")]
    History(String),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    Dicom(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A failure isolated to one item of a batch
///
/// Never propagated past the batch boundary; the batch runners store it in
/// the failing item's result slot and keep going.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemError {
    /// Zero-based position of the item in the batch input
    pub index: usize,
    /// Rendered error text
    pub message: String,
}

impl ItemError {
    pub fn new(index: usize, err: &DiagnosisError) -> Self {
        Self {
            index,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item {}: {}", self.index, self.message)
    }
}

// Helper conversions
impl From<String> for DiagnosisError {
    fn from(s: String) -> Self {
        DiagnosisError::InvalidInput(s)
    }
}

impl From<&str> for DiagnosisError {
    fn from(s: &str) -> Self {
        DiagnosisError::InvalidInput(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for DiagnosisError {
    fn from(e: dicom_object::ReadError) -> Self {
        DiagnosisError::Dicom(format!("{}", e))
    }
}

impl From<dicom_pixeldata::Error> for DiagnosisError {
    fn from(e: dicom_pixeldata::Error) -> Self {
        DiagnosisError::Preprocess(format!("{}", e))
    }
}

impl From<image::ImageError> for DiagnosisError {
    fn from(e: image::ImageError) -> Self {
        DiagnosisError::Preprocess(format!("{}", e))
    }
}

impl From<calamine::Error> for DiagnosisError {
    fn from(e: calamine::Error) -> Self {
        DiagnosisError::Ingest(format!("{}", e))
    }
}
