use crate::error::{DiagnosisError, Result};
use crate::export::{timestamped_csv_path, write_csv};
use crate::history::record::HistoryRecord;
use crate::types::{AnalysisType, Diagnosis};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Columns of a history export
pub const HISTORY_COLUMNS: [&str; 7] = [
    "timestamp",
    "patient_name",
    "analysis_type",
    "model_used",
    "diagnosis",
    "confidence",
    "input_data",
];

/// Append-only log of diagnoses, persisted as a JSON array
///
/// Every mutation rewrites the file through a temporary sibling that is
/// renamed into place, so a crash mid-write leaves the previous contents.
///
/// # Example
///
/// ```
/// use pancdx_core::history::HistoryStore;
/// use pancdx_core::types::{AnalysisType, Diagnosis};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("analysis_history.json");
///
/// let mut store = HistoryStore::open(&path).unwrap();
/// store
///     .add_record(
///         "Manual Entry",
///         AnalysisType::LabTest,
///         "SVM (Best)",
///         Diagnosis::Healthy,
///         72.5,
///         Default::default(),
///     )
///     .unwrap();
///
/// let reopened = HistoryStore::open(&path).unwrap();
/// assert_eq!(reopened.get_record_count(), 1);
/// ```
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
}

impl HistoryStore {
    /// Opens the store at `path`, reading existing records if the file exists
    ///
    /// # Errors
    ///
    /// Returns `History` if the file exists but is not a valid history.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            Self::read_records(&path)?
        } else {
            Vec::new()
        };
        debug!("Opened history {} ({} records)", path.display(), records.len());
        Ok(Self { path, records })
    }

    fn read_records(path: &Path) -> Result<Vec<HistoryRecord>> {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .map_err(|e| DiagnosisError::History(format!("{}: {}", path.display(), e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record stamped now and persists the store
    ///
    /// # Errors
    ///
    /// Returns `History` if the store cannot be written; the record is not kept.
    pub fn add_record(
        &mut self,
        patient_name: &str,
        analysis_type: AnalysisType,
        model_used: &str,
        diagnosis: Diagnosis,
        confidence: f64,
        input_data: Map<String, Value>,
    ) -> Result<&HistoryRecord> {
        self.records.push(HistoryRecord::new(
            patient_name,
            analysis_type,
            model_used,
            diagnosis,
            confidence,
            input_data,
        ));
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        let record = &self.records[self.records.len() - 1];
        info!(
            "Recorded {} for {} ({})",
            record.diagnosis,
            record.patient_name,
            record.analysis_type.label()
        );
        Ok(record)
    }

    /// All records in insertion order
    pub fn load_history(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn get_record_count(&self) -> usize {
        self.records.len()
    }

    /// Up to `n` most recent records, newest first
    pub fn recent(&self, n: usize) -> Vec<&HistoryRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Writes the history to `analysis_history_<timestamp>.csv` next to the store
    ///
    /// # Errors
    ///
    /// Returns `History` if there is nothing to export, `Export` if the file
    /// cannot be written.
    pub fn export_to_csv(&self) -> Result<PathBuf> {
        if self.records.is_empty() {
            return Err(DiagnosisError::History("no history to export".to_string()));
        }

        let path = timestamped_csv_path(self.dir(), "analysis_history");
        write_csv(
            &path,
            HISTORY_COLUMNS,
            self.records.iter().map(HistoryRecord::to_record),
        )?;
        Ok(path)
    }

    /// Removes every record
    pub fn clear_history(&mut self) -> Result<()> {
        let removed = self.records.len();
        let previous = std::mem::take(&mut self.records);
        if let Err(e) = self.persist() {
            self.records = previous;
            return Err(e);
        }
        info!("Cleared {} history records", removed);
        Ok(())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn persist(&self) -> Result<()> {
        let history_err =
            |e: std::io::Error| DiagnosisError::History(format!("{}: {}", self.path.display(), e));

        let dir = self.dir();
        fs::create_dir_all(dir).map_err(history_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(history_err)?;
        serde_json::to_writer_pretty(&mut tmp, &self.records)?;
        tmp.flush().map_err(history_err)?;
        tmp.as_file().sync_all().map_err(history_err)?;
        tmp.persist(&self.path).map_err(|e| history_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn add(store: &mut HistoryStore, name: &str, diagnosis: Diagnosis) {
        let mut input = Map::new();
        input.insert("age".to_string(), json!(65.0));
        store
            .add_record(name, AnalysisType::LabTest, "SVM (Best)", diagnosis, 90.0, input)
            .unwrap();
    }

    #[test]
    fn test_count_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        assert_eq!(store.get_record_count(), 0);

        for i in 0..5 {
            add(&mut store, &format!("Patient {}", i + 1), Diagnosis::Healthy);
        }
        assert_eq!(store.get_record_count(), 5);
        assert_eq!(store.load_history()[0].patient_name, "Patient 1");

        store.clear_history().unwrap();
        assert_eq!(store.get_record_count(), 0);
        assert!(store.load_history().is_empty());

        let reopened = HistoryStore::open(store.path()).unwrap();
        assert_eq!(reopened.get_record_count(), 0);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");

        let mut store = HistoryStore::open(&path).unwrap();
        add(&mut store, "Alice", Diagnosis::Cancer);
        add(&mut store, "Bob", Diagnosis::Healthy);
        add(&mut store, "Carol", Diagnosis::Cancer);
        drop(store);

        let reopened = HistoryStore::open(&path).unwrap();
        assert_eq!(reopened.get_record_count(), 3);
        let names: Vec<_> = reopened
            .load_history()
            .iter()
            .map(|r| r.patient_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(reopened.load_history()[0].input_data["age"], json!(65.0));

        let recent: Vec<_> = reopened
            .recent(2)
            .iter()
            .map(|r| r.patient_name.as_str())
            .collect();
        assert_eq!(recent, vec!["Carol", "Bob"]);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        add(&mut store, "Alice", Diagnosis::Cancer);
        add(&mut store, "Bob", Diagnosis::Healthy);

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_corrupt_store_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let err = HistoryStore::open(&path).unwrap_err();
        assert!(matches!(err, DiagnosisError::History(_)));

        fs::write(&path, "").unwrap();
        assert_eq!(HistoryStore::open(&path).unwrap().get_record_count(), 0);
    }

    #[test]
    fn test_export_to_csv() {
        let dir = TempDir::new().unwrap();
        let mut store = HistoryStore::open(dir.path().join("history.json")).unwrap();

        let err = store.export_to_csv().unwrap_err();
        assert!(matches!(err, DiagnosisError::History(_)));

        add(&mut store, "Alice", Diagnosis::Cancer);
        let path = store.export_to_csv().unwrap();
        assert_eq!(path.parent(), Some(dir.path()));

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "timestamp,patient_name,analysis_type,model_used,diagnosis,confidence,input_data"
        );
        assert!(lines[1].contains("Alice,Lab Test,SVM (Best),CANCER,90.00"));
        assert!(lines[1].contains(r#""{""age"":65.0}""#));
    }
}
