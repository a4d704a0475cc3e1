use crate::error::{DiagnosisError, Result};
use crate::imaging::tags::{
    get_string_value, get_u16_value, get_u32_value, COLUMNS, MODALITY, NUMBER_OF_FRAMES,
    PHOTOMETRIC_INTERPRETATION, PLANAR_CONFIGURATION, ROWS, SAMPLES_PER_PIXEL,
};
use dicom_object::open_file;
use dicom_pixeldata::PixelDecoder;
use image::{DynamicImage, GrayImage, RgbImage};
use log::debug;
use std::fmt;
use std::path::Path;

/// Photometric interpretation enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotometricInterpretation {
    Unknown,
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
    YbrFull,
    YbrFull422,
}

impl PhotometricInterpretation {
    /// Returns whether this is a monochrome interpretation
    pub fn is_monochrome(&self) -> bool {
        matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    /// Parses photometric interpretation from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MONOCHROME1" => PhotometricInterpretation::Monochrome1,
            "MONOCHROME2" => PhotometricInterpretation::Monochrome2,
            "PALETTE COLOR" => PhotometricInterpretation::PaletteColor,
            "RGB" => PhotometricInterpretation::Rgb,
            "YBR_FULL" => PhotometricInterpretation::YbrFull,
            "YBR_FULL_422" => PhotometricInterpretation::YbrFull422,
            _ => PhotometricInterpretation::Unknown,
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhotometricInterpretation::Unknown => "UNKNOWN",
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
            PhotometricInterpretation::YbrFull => "YBR_FULL",
            PhotometricInterpretation::YbrFull422 => "YBR_FULL_422",
        };
        write!(f, "{}", name)
    }
}

/// Rescales values to `[0, 255]` by per-image min-max
///
/// Values are truncated to 8 bits. A constant input maps to all zeros.
///
/// # Example
///
/// ```
/// use pancdx_core::imaging::rescale_to_u8;
///
/// assert_eq!(rescale_to_u8(&[-100.0, 0.0, 100.0]), vec![0, 127, 255]);
/// assert_eq!(rescale_to_u8(&[7.0, 7.0]), vec![0, 0]);
/// ```
pub fn rescale_to_u8(values: &[f32]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0; values.len()];
    }

    values
        .iter()
        .map(|&v| ((v - min) / range * 255.0) as u8)
        .collect()
}

/// Converts planar (`RRR..GGG..BBB..`) samples to interleaved (`RGBRGB..`)
fn interleave_planes(planar: &[f32], pixels: usize) -> Vec<f32> {
    let mut interleaved = Vec::with_capacity(pixels * 3);
    for i in 0..pixels {
        interleaved.extend_from_slice(&[planar[i], planar[pixels + i], planar[2 * pixels + i]]);
    }
    interleaved
}

/// Header fields needed to lay out decoded samples
#[derive(Debug, Clone, Copy, PartialEq)]
struct PixelLayout {
    rows: u32,
    columns: u32,
    samples_per_pixel: u16,
    planar: bool,
    photometric: PhotometricInterpretation,
}

impl PixelLayout {
    fn pixels(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    fn frame_len(&self) -> usize {
        self.pixels() * self.samples_per_pixel as usize
    }

    /// Checks that samples per pixel agrees with the photometric interpretation
    ///
    /// `PALETTE COLOR` is rejected: its samples are lookup-table indices, not
    /// intensities. An unknown interpretation is laid out by samples per pixel.
    fn validate(&self) -> Result<()> {
        let expected = match self.photometric {
            PhotometricInterpretation::PaletteColor => {
                return Err(DiagnosisError::Preprocess(format!(
                    "unsupported photometric interpretation: {}",
                    self.photometric
                )))
            }
            p if p.is_monochrome() => Some(1),
            PhotometricInterpretation::Unknown => None,
            _ => Some(3),
        };

        match expected {
            Some(n) if n != self.samples_per_pixel => Err(DiagnosisError::Preprocess(format!(
                "{} with {} samples per pixel",
                self.photometric, self.samples_per_pixel
            ))),
            _ => Ok(()),
        }
    }
}

/// Decodes the first frame of a DICOM file into an 8-bit RGB image
///
/// Stored values go through per-image min-max rescaling; `MONOCHROME1` is
/// not inverted. Grayscale frames are replicated into three channels.
///
/// # Errors
///
/// Returns `Preprocess` if the file cannot be parsed, its pixel data cannot
/// be decoded, or it uses `PALETTE COLOR` or a samples-per-pixel count that
/// contradicts its photometric interpretation.
pub fn read_dicom_image(path: &Path) -> Result<RgbImage> {
    let preprocess = |msg: String| DiagnosisError::Preprocess(format!("{}: {}", path.display(), msg));

    let dcm = open_file(path).map_err(|e| preprocess(e.to_string()))?;

    let rows = get_u16_value(&dcm, ROWS).ok_or_else(|| preprocess("missing Rows".to_string()))?;
    let columns =
        get_u16_value(&dcm, COLUMNS).ok_or_else(|| preprocess("missing Columns".to_string()))?;
    let layout = PixelLayout {
        rows: rows as u32,
        columns: columns as u32,
        samples_per_pixel: get_u16_value(&dcm, SAMPLES_PER_PIXEL).unwrap_or(1),
        planar: get_u16_value(&dcm, PLANAR_CONFIGURATION) == Some(1),
        photometric: get_string_value(&dcm, PHOTOMETRIC_INTERPRETATION)
            .map(|s| PhotometricInterpretation::from_str(&s))
            .unwrap_or(PhotometricInterpretation::Unknown),
    };
    debug!(
        "{}: {} {}x{} {} frame(s) {}",
        path.display(),
        get_string_value(&dcm, MODALITY).unwrap_or_default(),
        layout.columns,
        layout.rows,
        get_u32_value(&dcm, NUMBER_OF_FRAMES).unwrap_or(1),
        layout.photometric
    );
    layout.validate().map_err(|e| match e {
        DiagnosisError::Preprocess(msg) => preprocess(msg),
        other => other,
    })?;

    let decoded = dcm.decode_pixel_data()?;
    let samples: Vec<f32> = decoded.to_vec()?;
    frame_to_rgb(&samples, &layout).map_err(|e| match e {
        DiagnosisError::Preprocess(msg) => preprocess(msg),
        other => other,
    })
}

/// Builds an RGB image from the first frame of decoded samples
fn frame_to_rgb(samples: &[f32], layout: &PixelLayout) -> Result<RgbImage> {
    layout.validate()?;
    let frame_len = layout.frame_len();
    if frame_len == 0 || samples.len() < frame_len {
        return Err(DiagnosisError::Preprocess(format!(
            "expected {} samples, found {}",
            frame_len,
            samples.len()
        )));
    }
    let frame = &samples[..frame_len];

    match layout.samples_per_pixel {
        1 => {
            let gray = GrayImage::from_raw(layout.columns, layout.rows, rescale_to_u8(frame))
                .ok_or_else(|| DiagnosisError::Preprocess("invalid frame size".to_string()))?;
            Ok(DynamicImage::ImageLuma8(gray).to_rgb8())
        }
        3 => {
            let interleaved = if layout.planar {
                interleave_planes(frame, layout.pixels())
            } else {
                frame.to_vec()
            };
            RgbImage::from_raw(layout.columns, layout.rows, rescale_to_u8(&interleaved))
                .ok_or_else(|| DiagnosisError::Preprocess("invalid frame size".to_string()))
        }
        n => Err(DiagnosisError::Preprocess(format!(
            "unsupported samples per pixel: {}",
            n
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("MONOCHROME1", PhotometricInterpretation::Monochrome1)]
    #[case("monochrome2", PhotometricInterpretation::Monochrome2)]
    #[case("PALETTE COLOR", PhotometricInterpretation::PaletteColor)]
    #[case("YBR_FULL_422", PhotometricInterpretation::YbrFull422)]
    #[case("XYZ", PhotometricInterpretation::Unknown)]
    fn test_photometric_from_str(#[case] input: &str, #[case] expected: PhotometricInterpretation) {
        assert_eq!(PhotometricInterpretation::from_str(input), expected);
    }

    #[test]
    fn test_rescale_truncates() {
        assert_eq!(rescale_to_u8(&[0.0, 1.0, 2.0, 3.0]), vec![0, 85, 170, 255]);
        assert!(rescale_to_u8(&[]).is_empty());
    }

    #[test]
    fn test_interleave_planes() {
        let planar = [1.0, 2.0, 10.0, 20.0, 100.0, 200.0];
        assert_eq!(
            interleave_planes(&planar, 2),
            vec![1.0, 10.0, 100.0, 2.0, 20.0, 200.0]
        );
    }

    #[test]
    fn test_gray_frame_becomes_rgb() {
        let layout = PixelLayout {
            rows: 2,
            columns: 2,
            samples_per_pixel: 1,
            planar: false,
            photometric: PhotometricInterpretation::Monochrome1,
        };
        // Second frame is ignored
        let samples = [0.0, 100.0, 200.0, 300.0, 9999.0, 9999.0, 9999.0, 9999.0];
        let rgb = frame_to_rgb(&samples, &layout).unwrap();

        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [85, 85, 85]);
        assert_eq!(rgb.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let layout = PixelLayout {
            rows: 4,
            columns: 4,
            samples_per_pixel: 1,
            planar: false,
            photometric: PhotometricInterpretation::Monochrome2,
        };
        let err = frame_to_rgb(&[1.0; 8], &layout).unwrap_err();
        assert!(matches!(err, DiagnosisError::Preprocess(_)));
    }

    #[test]
    fn test_palette_color_is_rejected() {
        let layout = PixelLayout {
            rows: 2,
            columns: 2,
            samples_per_pixel: 1,
            planar: false,
            photometric: PhotometricInterpretation::PaletteColor,
        };
        let err = frame_to_rgb(&[0.0, 1.0, 2.0, 3.0], &layout).unwrap_err();
        assert!(matches!(err, DiagnosisError::Preprocess(_)));
        assert!(err.to_string().contains("PALETTE COLOR"));
    }

    #[rstest]
    #[case(PhotometricInterpretation::Monochrome2, 3)]
    #[case(PhotometricInterpretation::Monochrome1, 3)]
    #[case(PhotometricInterpretation::Rgb, 1)]
    #[case(PhotometricInterpretation::YbrFull, 1)]
    fn test_samples_per_pixel_must_match_photometric(
        #[case] photometric: PhotometricInterpretation,
        #[case] samples_per_pixel: u16,
    ) {
        let layout = PixelLayout {
            rows: 2,
            columns: 2,
            samples_per_pixel,
            planar: false,
            photometric,
        };
        let samples = vec![1.0; layout.frame_len()];
        let err = frame_to_rgb(&samples, &layout).unwrap_err();
        assert!(err.to_string().contains("samples per pixel"));
    }

    #[rstest]
    #[case(PhotometricInterpretation::Unknown, 1)]
    #[case(PhotometricInterpretation::Unknown, 3)]
    #[case(PhotometricInterpretation::Rgb, 3)]
    fn test_consistent_layouts_are_accepted(
        #[case] photometric: PhotometricInterpretation,
        #[case] samples_per_pixel: u16,
    ) {
        let layout = PixelLayout {
            rows: 1,
            columns: 2,
            samples_per_pixel,
            planar: false,
            photometric,
        };
        let samples: Vec<f32> = (0..layout.frame_len()).map(|v| v as f32).collect();
        assert_eq!(frame_to_rgb(&samples, &layout).unwrap().dimensions(), (2, 1));
    }

    #[test]
    fn test_read_dicom_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slice.dcm");
        testing::write_gray_dicom(&path, 2, 3, vec![0, 10, 20, 30, 40, 50]);

        let rgb = read_dicom_image(&path).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(2, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_read_invalid_dicom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.dcm");
        std::fs::write(&path, b"not a dicom file").unwrap();

        let err = read_dicom_image(&path).unwrap_err();
        assert!(matches!(err, DiagnosisError::Preprocess(_)));
    }
}
