use crate::model::DEFAULT_SCALER_PATH;
use std::path::{Path, PathBuf};

/// Default location of the CT image classifier artifact
pub const DEFAULT_CT_MODEL_PATH: &str = "models/ct_scans/final_model.onnx";

/// Default history store file name
pub const DEFAULT_HISTORY_FILE: &str = "analysis_history.json";

/// File layout used by the predictors, the history store and result exports
///
/// Relative paths are resolved against `base_path`.
///
/// # Example
///
/// ```
/// use pancdx_core::AppConfig;
/// use std::path::Path;
///
/// let config = AppConfig::new("/opt/pancdx").with_results_dir("out");
/// assert_eq!(config.results_dir(), Path::new("/opt/pancdx/out"));
/// assert_eq!(
///     config.scaler_path(),
///     Path::new("/opt/pancdx/models/scalers/FINAL_SCALER.json")
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Root directory for model artifacts
    pub base_path: PathBuf,

    /// Tabular scaler artifact
    pub scaler_path: PathBuf,

    /// CT image classifier artifact
    pub ct_model_path: PathBuf,

    /// History store file
    pub history_path: PathBuf,

    /// Directory for batch result CSV files (base path when unset)
    pub results_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AppConfig {
    /// Creates a configuration with the default layout under `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
            ct_model_path: PathBuf::from(DEFAULT_CT_MODEL_PATH),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            results_dir: None,
        }
    }

    /// Builder: Set scaler artifact path
    pub fn with_scaler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_path = path.into();
        self
    }

    /// Builder: Set CT model artifact path
    pub fn with_ct_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ct_model_path = path.into();
        self
    }

    /// Builder: Set history store path
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    /// Builder: Set result directory
    pub fn with_results_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(path.into());
        self
    }

    /// Resolves a path against the base path unless it is absolute
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.resolve(&self.scaler_path)
    }

    pub fn ct_model_path(&self) -> PathBuf {
        self.resolve(&self.ct_model_path)
    }

    pub fn history_path(&self) -> PathBuf {
        self.resolve(&self.history_path)
    }

    pub fn results_dir(&self) -> PathBuf {
        match &self.results_dir {
            Some(dir) => self.resolve(dir),
            None => self.base_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = AppConfig::new("/data");
        assert_eq!(
            config.ct_model_path(),
            Path::new("/data/models/ct_scans/final_model.onnx")
        );
        assert_eq!(config.history_path(), Path::new("/data/analysis_history.json"));
        assert_eq!(config.results_dir(), Path::new("/data"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = AppConfig::new("/data")
            .with_history_path("/var/lib/pancdx/history.json")
            .with_ct_model_path("ct.onnx");
        assert_eq!(
            config.history_path(),
            Path::new("/var/lib/pancdx/history.json")
        );
        assert_eq!(config.ct_model_path(), Path::new("/data/ct.onnx"));
    }
}
