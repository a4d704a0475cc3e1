//! Timestamped CSV result files

use crate::error::{DiagnosisError, Result};
use chrono::Local;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp suffix used in result file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Returns `{dir}/{prefix}_{YYYYmmdd_HHMMSS}.csv`
pub fn timestamped_csv_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = Local::now().format(FILE_TIMESTAMP_FORMAT);
    dir.join(format!("{}_{}.csv", prefix, stamp))
}

/// Writes a header row and data rows to a CSV file, creating the directory
///
/// # Errors
///
/// Returns `Export` if the directory or file cannot be written.
pub fn write_csv<H, R, C>(path: &Path, headers: H, rows: R) -> Result<()>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<[u8]>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| DiagnosisError::Export(format!("{}: {}", parent.display(), e)))?;
        }
    }

    let export_err = |e: csv::Error| DiagnosisError::Export(format!("{}: {}", path.display(), e));
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    writer.write_record(headers).map_err(export_err)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(row).map_err(export_err)?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|e| DiagnosisError::Export(format!("{}: {}", path.display(), e)))?;

    info!("Wrote {} rows to {}", count, path.display());
    Ok(())
}
