use crate::error::{DiagnosisError, Result};
use crate::imaging::normalize::{ImageNormalizer, ImageTensor};
use crate::types::CtPrediction;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Name recorded in history for CT predictions
pub const CT_MODEL_NAME: &str = "EfficientNetB2";

/// A binary image classifier
pub trait ImageModel: Send + Sync {
    /// Returns the positive-class probability for one tensor
    fn predict(&self, tensor: &ImageTensor) -> Result<f32>;
}

/// Builds an [`ImageModel`] from an artifact on disk
pub trait ImageModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn ImageModel>>;
}

/// Loader used when no inference backend is compiled in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackendLoader;

impl ImageModelLoader for NoBackendLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ImageModel>> {
        Err(DiagnosisError::Load(format!(
            "{}: no image model backend available, rebuild with the `onnx` feature",
            path.display()
        )))
    }
}

/// Returns the image model loader for this build
pub fn default_loader() -> Box<dyn ImageModelLoader> {
    #[cfg(feature = "onnx")]
    {
        Box::new(crate::imaging::onnx::OnnxModelLoader::default())
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(NoBackendLoader)
    }
}

/// CT scan classifier
///
/// Holds at most one image model; it stays unloaded until
/// [`load_model`](Self::load_model) succeeds.
pub struct ImageClassifier {
    normalizer: ImageNormalizer,
    loader: Box<dyn ImageModelLoader>,
    model: Option<Box<dyn ImageModel>>,
    model_path: Option<PathBuf>,
}

impl Default for ImageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageClassifier {
    /// Creates an unloaded classifier using the build's default loader
    pub fn new() -> Self {
        Self::with_loader(default_loader())
    }

    pub fn with_loader(loader: Box<dyn ImageModelLoader>) -> Self {
        Self {
            normalizer: ImageNormalizer::new(),
            loader,
            model: None,
            model_path: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Path of the loaded model artifact, if any
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// Loads the model artifact at `path`, replacing any loaded model
    ///
    /// # Errors
    ///
    /// Returns `Load` if the file is missing or the backend rejects it; the
    /// classifier is left unloaded.
    pub fn load_model(&mut self, path: &Path) -> Result<()> {
        self.model = None;
        self.model_path = None;

        if !path.is_file() {
            return Err(DiagnosisError::Load(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        let model = self.loader.load(path)?;

        self.model = Some(model);
        self.model_path = Some(path.to_path_buf());
        info!("CT model loaded from {}", path.display());
        Ok(())
    }

    /// Replaces the loaded model with an already-constructed one
    pub fn install(&mut self, model: Box<dyn ImageModel>) {
        self.model = Some(model);
        self.model_path = None;
    }

    /// Classifies one image file
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` without a model, `Preprocess` if the image cannot
    /// be decoded, `Inference` if the model fails or returns a value outside
    /// `[0, 1]`.
    pub fn predict(&self, image_path: &Path) -> Result<CtPrediction> {
        let model = self.model()?;
        let tensor = self.normalizer.normalize(image_path)?;
        let prediction = Self::classify(model, &tensor)?;
        debug!(
            "{}: p={:.4} ({})",
            image_path.display(),
            prediction.raw_probability,
            prediction.diagnosis()
        );
        Ok(prediction)
    }

    /// Classifies an already-normalized tensor
    pub fn predict_tensor(&self, tensor: &ImageTensor) -> Result<CtPrediction> {
        Self::classify(self.model()?, tensor)
    }

    fn model(&self) -> Result<&dyn ImageModel> {
        self.model.as_deref().ok_or_else(|| {
            DiagnosisError::NotLoaded("call load_model() before predicting".to_string())
        })
    }

    fn classify(model: &dyn ImageModel, tensor: &ImageTensor) -> Result<CtPrediction> {
        let probability = model.predict(tensor)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(DiagnosisError::Inference(format!(
                "probability {} outside [0, 1]",
                probability
            )));
        }
        Ok(CtPrediction::from_probability(f64::from(probability)))
    }
}
