//! CT scan classification: image normalization, models and batches

mod batch;
mod classifier;
mod dicom;
mod normalize;
#[cfg(feature = "onnx")]
mod onnx;
pub mod tags;

pub use batch::{
    discover_dicom_files, save_image_results, BatchImageRunner, ImageBatchResult,
    IMAGE_RESULT_COLUMNS,
};
pub use classifier::{
    default_loader, ImageClassifier, ImageModel, ImageModelLoader, NoBackendLoader,
    CT_MODEL_NAME,
};
pub use dicom::{read_dicom_image, rescale_to_u8, PhotometricInterpretation};
pub use normalize::{is_dicom_path, ImageNormalizer, ImageTensor, CHANNELS, IMAGE_SIZE};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxImageModel, OnnxModelLoader};
