//! ONNX image model backend via the `ort` crate

use crate::error::{DiagnosisError, Result};
use crate::imaging::classifier::{ImageModel, ImageModelLoader};
use crate::imaging::normalize::ImageTensor;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// Loads `.onnx` image classifiers
#[derive(Debug, Clone, Copy)]
pub struct OnnxModelLoader {
    intra_threads: usize,
}

impl Default for OnnxModelLoader {
    fn default() -> Self {
        Self { intra_threads: 4 }
    }
}

impl OnnxModelLoader {
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }
}

impl ImageModelLoader for OnnxModelLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ImageModel>> {
        let load_err = |e: ort::Error| DiagnosisError::Load(format!("{}: {}", path.display(), e));

        let session = Session::builder()
            .map_err(load_err)?
            .with_intra_threads(self.intra_threads)
            .map_err(load_err)?
            .commit_from_file(path)
            .map_err(load_err)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| DiagnosisError::Load(format!("{}: model has no inputs", path.display())))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                DiagnosisError::Load(format!("{}: model has no outputs", path.display()))
            })?;

        Ok(Box::new(OnnxImageModel {
            session: Mutex::new(session),
            input_name,
            output_name,
        }))
    }
}

/// Single-input, single-output ONNX classifier
///
/// The first output element is taken as the positive-class probability.
pub struct OnnxImageModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl ImageModel for OnnxImageModel {
    fn predict(&self, tensor: &ImageTensor) -> Result<f32> {
        let inference_err = |e: ort::Error| DiagnosisError::Inference(e.to_string());

        let input = TensorRef::from_array_view(tensor.as_array()).map_err(inference_err)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| DiagnosisError::Inference(format!("lock error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(inference_err)?;

        let output = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(inference_err)?;
        output
            .iter()
            .next()
            .copied()
            .ok_or_else(|| DiagnosisError::Inference("model returned an empty output".to_string()))
    }
}
