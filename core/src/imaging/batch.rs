use crate::error::{DiagnosisError, ItemError, Result};
use crate::export::{timestamped_csv_path, write_csv};
use crate::imaging::classifier::ImageClassifier;
use crate::imaging::normalize::is_dicom_path;
use crate::tabular::ERROR_LABEL;
use crate::types::CtPrediction;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Columns of a CT batch result file
pub const IMAGE_RESULT_COLUMNS: [&str; 4] = ["Image", "Diagnosis", "Confidence", "Probability"];

/// Result for one image of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatchResult {
    /// File name of the image
    pub image: String,
    pub outcome: std::result::Result<CtPrediction, ItemError>,
}

impl ImageBatchResult {
    /// `CANCER`, `Normal` or `ERROR`
    pub fn diagnosis(&self) -> &'static str {
        match &self.outcome {
            Ok(prediction) => prediction.diagnosis().label(),
            Err(_) => ERROR_LABEL,
        }
    }

    /// Positive-class confidence as `"{:.2}%"`, or `N/A` on failure
    pub fn confidence(&self) -> String {
        match &self.outcome {
            Ok(prediction) => format!("{:.2}%", prediction.confidence_percent),
            Err(_) => "N/A".to_string(),
        }
    }

    /// Probability as `"{:.4}"`, or the error text on failure
    pub fn probability(&self) -> String {
        match &self.outcome {
            Ok(prediction) => format!("{:.4}", prediction.raw_probability),
            Err(e) => e.message.clone(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// The four result-file cells, in column order
    pub fn to_record(&self) -> [String; 4] {
        [
            self.image.clone(),
            self.diagnosis().to_string(),
            self.confidence(),
            self.probability(),
        ]
    }
}

/// Runs an [`ImageClassifier`] over many image files
pub struct BatchImageRunner<'a> {
    classifier: &'a ImageClassifier,
}

impl<'a> BatchImageRunner<'a> {
    pub fn new(classifier: &'a ImageClassifier) -> Self {
        Self { classifier }
    }

    /// Classifies every path, one result per path in input order
    ///
    /// A failing image yields an `ERROR` result in its own slot.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` before touching any image if no model is loaded.
    pub fn run_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<ImageBatchResult>> {
        if !self.classifier.is_loaded() {
            return Err(DiagnosisError::NotLoaded(
                "call load_model() before running a batch".to_string(),
            ));
        }

        let results: Vec<ImageBatchResult> = paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let path = path.as_ref();
                let outcome = self.classifier.predict(path).map_err(|e| {
                    warn!("{} failed: {}", path.display(), e);
                    ItemError::new(index, &e)
                });
                ImageBatchResult {
                    image: file_name(path),
                    outcome,
                }
            })
            .collect();

        let errors = results.iter().filter(|r| r.is_error()).count();
        let positive = results
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(p) if p.is_positive))
            .count();
        info!(
            "CT batch complete: {} images, {} positive, {} errors",
            results.len(),
            positive,
            errors
        );
        Ok(results)
    }

    /// Classifies every `.dcm` file found under `dir`, at any depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no DICOM files are found, `NotLoaded` if no
    /// model is loaded.
    pub fn run_folder(&self, dir: &Path) -> Result<Vec<ImageBatchResult>> {
        let files = discover_dicom_files(dir)?;
        if files.is_empty() {
            return Err(DiagnosisError::InvalidInput(format!(
                "no .dcm files found in {}",
                dir.display()
            )));
        }
        info!("Found {} DICOM files in {}", files.len(), dir.display());
        self.run_batch(&files)
    }
}

/// Recursively lists `.dcm` files under `dir`, sorted by path
///
/// Symlinked directories are not descended into; a symlink to a file is
/// listed like the file itself.
///
/// # Errors
///
/// Returns `InvalidInput` if `dir` is not a directory.
pub fn discover_dicom_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DiagnosisError::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| {
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            is_file && is_dicom_path(entry.path())
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Writes CT batch results to a timestamped CSV in `dir`
///
/// Named `ct_<folder>_<ts>.csv` when `folder_name` is given, else
/// `ct_results_<ts>.csv`.
pub fn save_image_results(
    results: &[ImageBatchResult],
    dir: &Path,
    folder_name: Option<&str>,
) -> Result<PathBuf> {
    let prefix = match folder_name {
        Some(name) => format!("ct_{}", name),
        None => "ct_results".to_string(),
    };
    let path = timestamped_csv_path(dir, &prefix);
    write_csv(
        &path,
        IMAGE_RESULT_COLUMNS,
        results.iter().map(ImageBatchResult::to_record),
    )?;
    Ok(path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::classifier::testing::{FixedLoader, FixedModel};
    use crate::imaging::dicom::testing::write_gray_dicom;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn loaded(probability: f32) -> ImageClassifier {
        let mut classifier = ImageClassifier::with_loader(Box::new(FixedLoader(probability)));
        classifier.install(Box::new(FixedModel(probability)));
        classifier
    }

    fn write_png(path: &Path) {
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_failing_image_is_isolated() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("a.png");
        let bad = dir.path().join("b.png");
        let also_good = dir.path().join("c.png");
        write_png(&good);
        fs::write(&bad, b"not an image").unwrap();
        write_png(&also_good);

        let classifier = loaded(0.8);
        let results = BatchImageRunner::new(&classifier)
            .run_batch(&[&good, &bad, &also_good])
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].to_record(),
            ["a.png", "CANCER", "80.00%", "0.8000"].map(String::from)
        );
        assert_eq!(results[1].image, "b.png");
        assert_eq!(results[1].diagnosis(), "ERROR");
        assert_eq!(results[1].confidence(), "N/A");
        assert!(results[1].probability().contains("preprocess"));
        assert_eq!(results[2].diagnosis(), "CANCER");
    }

    #[test]
    fn test_negative_results_keep_raw_confidence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.png");
        write_png(&path);

        let classifier = loaded(0.2);
        let results = BatchImageRunner::new(&classifier).run_batch(&[&path]).unwrap();
        assert_eq!(results[0].diagnosis(), "Normal");
        assert_eq!(results[0].confidence(), "20.00%");
    }

    #[test]
    fn test_batch_requires_loaded_model() {
        let classifier = ImageClassifier::with_loader(Box::new(FixedLoader(0.5)));
        let err = BatchImageRunner::new(&classifier)
            .run_batch(&[Path::new("scan.png")])
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::NotLoaded(_)));
    }

    #[test]
    fn test_discovery_is_recursive() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("patient").join("series").join("slices");
        fs::create_dir_all(&deep).unwrap();

        write_gray_dicom(&dir.path().join("top.dcm"), 4, 4, vec![1; 16]);
        write_gray_dicom(&deep.join("deep.DCM"), 4, 4, (0..16).collect());
        fs::write(deep.join("notes.txt"), b"ignore me").unwrap();
        write_png(&dir.path().join("patient").join("preview.png"));

        let files = discover_dicom_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_dicom_path(f)));

        let classifier = loaded(0.9);
        let results = BatchImageRunner::new(&classifier)
            .run_folder(dir.path())
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.diagnosis() == "CANCER"));
    }

    #[cfg(unix)]
    #[test]
    fn test_discovery_skips_symlinked_directories() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let scans = dir.path().join("scans");
        let elsewhere = dir.path().join("elsewhere");
        fs::create_dir_all(&scans).unwrap();
        fs::create_dir_all(&elsewhere).unwrap();

        write_gray_dicom(&scans.join("own.dcm"), 4, 4, vec![1; 16]);
        write_gray_dicom(&elsewhere.join("linked_dir.dcm"), 4, 4, vec![1; 16]);
        write_gray_dicom(&elsewhere.join("linked_file.dcm"), 4, 4, vec![1; 16]);
        symlink(&elsewhere, scans.join("series")).unwrap();
        symlink(elsewhere.join("linked_file.dcm"), scans.join("alias.dcm")).unwrap();
        // A cycle back to the root must not be walked
        symlink(&scans, scans.join("loop")).unwrap();

        let files = discover_dicom_files(&scans).unwrap();
        assert_eq!(files, vec![scans.join("alias.dcm"), scans.join("own.dcm")]);
    }

    #[test]
    fn test_empty_folder() {
        let dir = TempDir::new().unwrap();
        let classifier = loaded(0.9);
        let err = BatchImageRunner::new(&classifier)
            .run_folder(dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("no .dcm files"));

        assert!(discover_dicom_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_save_image_results() {
        let dir = TempDir::new().unwrap();
        let results = vec![
            ImageBatchResult {
                image: "a.dcm".to_string(),
                outcome: Ok(CtPrediction::from_probability(0.93)),
            },
            ImageBatchResult {
                image: "b.dcm".to_string(),
                outcome: Err(ItemError::new(
                    1,
                    &DiagnosisError::Preprocess("bad pixel data".to_string()),
                )),
            },
        ];

        let path = save_image_results(&results, dir.path(), Some("study1")).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("ct_study1_"));

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Image,Diagnosis,Confidence,Probability");
        assert_eq!(lines[1], "a.dcm,CANCER,93.00%,0.9300");
        assert_eq!(
            lines[2],
            "b.dcm,ERROR,N/A,Failed to preprocess image: bad pixel data"
        );

        let path = save_image_results(&results, dir.path(), None).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("ct_results_"));
    }
}
