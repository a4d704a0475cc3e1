use crate::error::{DiagnosisError, Result};
use crate::types::{parse_field, parse_sex, RawLabMeasurement};
use calamine::{open_workbook_auto, Reader};
use log::{debug, info};
use std::path::Path;

/// Columns every patient table must provide after header normalization
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "age",
    "sex",
    "creatinine",
    "bilirubin",
    "glucose",
    "urine_volume",
    "urine_ph",
];

/// Truncated or alternate headers seen in exported spreadsheets
const COLUMN_SYNONYMS: &[(&str, &str)] = &[
    ("sex_encod", "sex"),
    ("sex_encoded", "sex"),
    ("urine_volu", "urine_volume"),
    ("urine_vol", "urine_volume"),
];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Normalizes a header: trimmed, lower-cased, spaces to underscores, synonyms remapped
///
/// # Example
///
/// ```
/// use pancdx_core::tabular::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Urine Vol "), "urine_volume");
/// assert_eq!(normalize_column_name("Sex_Encoded"), "sex");
/// assert_eq!(normalize_column_name("Urine pH"), "urine_ph");
/// ```
pub fn normalize_column_name(raw: &str) -> String {
    let name = raw.trim().to_lowercase().replace(' ', "_");
    COLUMN_SYNONYMS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| to.to_string())
        .unwrap_or(name)
}

/// Patient rows loaded from a CSV or spreadsheet file
#[derive(Debug, Clone, PartialEq)]
pub struct PatientTable {
    /// Original header text, in file order
    headers: Vec<String>,
    /// Normalized column names, parallel to `headers`
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PatientTable {
    /// Loads a patient file, choosing the reader by extension
    ///
    /// # Errors
    ///
    /// Returns `Ingest` if the file cannot be read or lacks required columns.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let table = if ext == "csv" {
            Self::read_csv(path)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Self::read_spreadsheet(path)
        } else {
            Err(DiagnosisError::Ingest(format!(
                "unsupported file type: {}",
                path.display()
            )))
        }?;

        info!("Loaded {} patients from {}", table.len(), path.display());
        Ok(table)
    }

    /// Builds a table from a header row and data rows
    ///
    /// Short rows are padded with empty cells.
    ///
    /// # Errors
    ///
    /// Returns `Ingest` listing every missing required column.
    pub fn from_records(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let columns: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !columns.iter().any(|c| c == required))
            .collect();
        if !missing.is_empty() {
            return Err(DiagnosisError::Ingest(format!(
                "Missing columns: {:?}",
                missing
            )));
        }

        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Ok(Self {
            headers,
            columns,
            rows,
        })
    }

    fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DiagnosisError::Ingest(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| DiagnosisError::Ingest(e.to_string()))?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DiagnosisError::Ingest(e.to_string()))?;
            rows.push(record.iter().map(String::from).collect());
        }

        debug!("Read {} CSV rows from {}", rows.len(), path.display());
        Self::from_records(headers, rows)
    }

    fn read_spreadsheet(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DiagnosisError::Ingest(format!("{} has no sheets", path.display())))??;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| DiagnosisError::Ingest(format!("{} is empty", path.display())))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();
        let rows = rows
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        Self::from_records(headers, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Original header text, in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Normalized column names, in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw cells of each row, in file order
    pub fn raw_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the row at `index`
    pub fn row(&self, index: usize) -> Option<PatientRow<'_>> {
        self.rows.get(index).map(|values| PatientRow {
            columns: &self.columns,
            values,
        })
    }

    /// Iterates rows in file order
    pub fn rows(&self) -> impl Iterator<Item = PatientRow<'_>> + '_ {
        self.rows.iter().map(move |values| PatientRow {
            columns: &self.columns,
            values,
        })
    }

    /// Display names for each row
    ///
    /// `"{n}. {name}"` from a `name` or `patient_name` column, else `"Patient {n}"`.
    pub fn patient_names(&self) -> Vec<String> {
        let name_column = ["name", "patient_name"]
            .iter()
            .find_map(|wanted| self.columns.iter().position(|c| c == wanted));

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match name_column {
                Some(col) => format!("{}. {}", i + 1, row[col]),
                None => format!("Patient {}", i + 1),
            })
            .collect()
    }
}

/// One row of a [`PatientTable`], addressed by normalized column name
#[derive(Debug, Clone, Copy)]
pub struct PatientRow<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> PatientRow<'a> {
    /// Returns the cell under a normalized column name
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .map(|v| v.as_str())
    }

    fn field(&self, column: &str) -> Result<f64> {
        let value = self
            .get(column)
            .ok_or_else(|| DiagnosisError::InvalidInput(format!("Missing: {}", column)))?;
        parse_field(column, value)
    }

    /// Parses the seven lab fields of this row
    ///
    /// With `pre_normalized`, `sex` must already be numeric (a z-score);
    /// otherwise it may be a text label such as `M` or `female`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a field is missing or not a number.
    pub fn measurement(&self, pre_normalized: bool) -> Result<RawLabMeasurement> {
        let sex = if pre_normalized {
            self.field("sex")?
        } else {
            let value = self
                .get("sex")
                .ok_or_else(|| DiagnosisError::InvalidInput("Missing: sex".to_string()))?;
            parse_sex(value)?
        };

        Ok(RawLabMeasurement::new(
            self.field("age")?,
            sex,
            self.field("creatinine")?,
            self.field("bilirubin")?,
            self.field("glucose")?,
            self.field("urine_volume")?,
            self.field("urine_ph")?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    /// Writes a one-sheet workbook holding `sheet_data` (the `<row>` elements)
    fn write_xlsx(path: &Path, sheet_data: &str) {
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Patients" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
                    .to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_data
                ),
            ),
        ];

        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn text_cell(reference: &str, value: &str) -> String {
        format!(
            r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
            reference, value
        )
    }

    fn number_cell(reference: &str, value: &str) -> String {
        format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value)
    }

    #[test]
    fn test_load_csv_with_synonyms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.csv");
        fs::write(
            &path,
            "Name,Age,Sex_Encod,Creatinine,Bilirubin,Glucose,Urine Volu,Urine pH\n\
             Alice,65,M,1.2,2.0,110,70,6.0\n\
             Bob,40,female,0.9,1.0,95,80,6.5\n",
        )
        .unwrap();

        let table = PatientTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers()[6], "Urine Volu");
        assert_eq!(table.columns()[6], "urine_volume");

        let raw = table.row(0).unwrap().measurement(false).unwrap();
        assert_eq!(raw, RawLabMeasurement::new(65.0, 1.0, 1.2, 2.0, 110.0, 70.0, 6.0));

        let raw = table.row(1).unwrap().measurement(false).unwrap();
        assert_eq!(raw.sex, 0.0);

        assert_eq!(table.patient_names(), vec!["1. Alice", "2. Bob"]);
    }

    #[test]
    fn test_load_xlsx_with_synonyms() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.xlsx");

        let header: String = [
            "Age",
            "Sex_Encoded",
            "Creatinine",
            "Bilirubin",
            "Glucose",
            "Urine Volu",
            "Urine pH",
        ]
        .iter()
        .zip('A'..)
        .map(|(name, col)| text_cell(&format!("{}1", col), name))
        .collect();
        let numeric: String = ["65.0", "1", "1.2", "2.0", "110", "70.5", "6.0"]
            .iter()
            .zip('A'..)
            .map(|(value, col)| number_cell(&format!("{}2", col), value))
            .collect();
        let labelled = format!(
            "{}{}{}",
            number_cell("A3", "40"),
            text_cell("B3", "female"),
            ["0.9", "1.0", "95", "80", "6.5"]
                .iter()
                .zip('C'..)
                .map(|(value, col)| number_cell(&format!("{}3", col), value))
                .collect::<String>()
        );
        write_xlsx(
            &path,
            &format!(
                r#"<row r="1">{}</row><row r="2">{}</row><row r="3">{}</row>"#,
                header, numeric, labelled
            ),
        );

        let table = PatientTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers()[1], "Sex_Encoded");
        assert_eq!(table.columns().to_vec(), strings(&REQUIRED_COLUMNS));

        let raw = table.row(0).unwrap().measurement(false).unwrap();
        assert_eq!(raw, RawLabMeasurement::new(65.0, 1.0, 1.2, 2.0, 110.0, 70.5, 6.0));

        let raw = table.row(1).unwrap().measurement(false).unwrap();
        assert_eq!(raw.sex, 0.0);
        assert_eq!(raw.age, 40.0);

        assert_eq!(table.patient_names(), vec!["Patient 1", "Patient 2"]);
    }

    #[test]
    fn test_malformed_numeric_sex_is_a_row_error() {
        let table = PatientTable::from_records(
            strings(&REQUIRED_COLUMNS),
            vec![strings(&["65", "1.2.3", "1.2", "2.0", "110", "70", "6.0"])],
        )
        .unwrap();
        let err = table.row(0).unwrap().measurement(false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: sex: '1.2.3' is not a number");
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let err = PatientTable::from_records(
            strings(&["age", "sex", "creatinine", "bilirubin"]),
            vec![],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Missing columns"));
        assert!(message.contains("glucose"));
        assert!(message.contains("urine_volume"));
        assert!(message.contains("urine_ph"));
    }

    #[test]
    fn test_default_patient_names() {
        let table = PatientTable::from_records(
            strings(&REQUIRED_COLUMNS),
            vec![strings(&["1", "0", "1", "1", "1", "1", "1"])],
        )
        .unwrap();
        assert_eq!(table.patient_names(), vec!["Patient 1"]);
    }

    #[test]
    fn test_pre_normalized_sex_must_be_numeric() {
        let table = PatientTable::from_records(
            strings(&REQUIRED_COLUMNS),
            vec![
                strings(&["0.5", "-1.14", "0.2", "0.1", "0.3", "-0.4", "0.0"]),
                strings(&["0.5", "M", "0.2", "0.1", "0.3", "-0.4", "0.0"]),
            ],
        )
        .unwrap();

        let raw = table.row(0).unwrap().measurement(true).unwrap();
        assert_eq!(raw.sex, -1.14);
        assert!(table.row(1).unwrap().measurement(true).is_err());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = PatientTable::from_records(
            strings(&REQUIRED_COLUMNS),
            vec![strings(&["65", "1", "1.2"])],
        )
        .unwrap();
        let err = table.row(0).unwrap().measurement(false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Missing: bilirubin");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = PatientTable::load(Path::new("patients.txt")).unwrap_err();
        assert!(matches!(err, DiagnosisError::Ingest(_)));
    }
}
