use crate::error::{DiagnosisError, Result};
use crate::imaging::dicom::read_dicom_image;
use image::imageops::{self, FilterType};
use image::RgbImage;
use log::debug;
use ndarray::Array4;
use std::path::Path;

/// Side length of the square model input
pub const IMAGE_SIZE: u32 = 224;

/// Color channels of the model input
pub const CHANNELS: usize = 3;

/// Model input for one image: shape `(1, 224, 224, 3)`, values in `[0, 255]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    /// Builds a batch-of-one tensor from an RGB image in row-major HWC order
    pub fn from_rgb(image: &RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let values: Vec<f32> = image.as_raw().iter().map(|&v| f32::from(v)).collect();
        let data = Array4::from_shape_vec((1, height as usize, width as usize, CHANNELS), values)
            .map_err(|e| DiagnosisError::Preprocess(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }
}

/// Turns DICOM and raster image files into [`ImageTensor`]s
///
/// `.dcm` files (any case) go through DICOM pixel decoding with per-image
/// min-max rescaling; everything else is decoded by the `image` crate. Both
/// paths end in a Lanczos resize to 224x224.
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    size: u32,
    filter: FilterType,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            size: IMAGE_SIZE,
            filter: FilterType::Lanczos3,
        }
    }
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and normalizes one image file
    ///
    /// # Errors
    ///
    /// Returns `Preprocess` if the file cannot be decoded; no partial tensor
    /// is ever produced.
    pub fn normalize(&self, path: &Path) -> Result<ImageTensor> {
        let rgb = self.load_rgb(path)?;
        let tensor = self.tensor_from_rgb(&rgb)?;
        debug!(
            "Normalized {} ({}x{}) to {:?}",
            path.display(),
            rgb.width(),
            rgb.height(),
            tensor.shape()
        );
        Ok(tensor)
    }

    /// Resizes an RGB image and wraps it in a tensor
    pub fn tensor_from_rgb(&self, rgb: &RgbImage) -> Result<ImageTensor> {
        let resized = imageops::resize(rgb, self.size, self.size, self.filter);
        ImageTensor::from_rgb(&resized)
    }

    fn load_rgb(&self, path: &Path) -> Result<RgbImage> {
        if is_dicom_path(path) {
            read_dicom_image(path)
        } else {
            let image = image::open(path).map_err(|e| {
                DiagnosisError::Preprocess(format!("{}: {}", path.display(), e))
            })?;
            Ok(image.to_rgb8())
        }
    }
}

/// Whether a path has a `.dcm` extension, ignoring case
pub fn is_dicom_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("dcm"))
        .unwrap_or(false)
}
