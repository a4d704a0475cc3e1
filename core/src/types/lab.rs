use crate::error::{DiagnosisError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Raw physiological lab measurements for one patient
///
/// Values are in clinical units as entered by hand or read from a patient
/// table. `sex` is binary-coded: 1 for male, 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLabMeasurement {
    pub age: f64,
    pub sex: f64,
    pub creatinine: f64,
    pub bilirubin: f64,
    pub glucose: f64,
    pub urine_volume: f64,
    #[serde(rename = "urine_pH")]
    pub urine_ph: f64,
}

impl RawLabMeasurement {
    /// Creates a new measurement from already-parsed values
    pub fn new(
        age: f64,
        sex: f64,
        creatinine: f64,
        bilirubin: f64,
        glucose: f64,
        urine_volume: f64,
        urine_ph: f64,
    ) -> Self {
        Self {
            age,
            sex,
            creatinine,
            bilirubin,
            glucose,
            urine_volume,
            urine_ph,
        }
    }

    /// Returns the seven values in canonical order
    pub fn values(&self) -> [f64; 7] {
        [
            self.age,
            self.sex,
            self.creatinine,
            self.bilirubin,
            self.glucose,
            self.urine_volume,
            self.urine_ph,
        ]
    }

    /// Converts the measurement into the key-value map stored with history records
    pub fn to_input_data(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Parses a required numeric field
///
/// # Errors
///
/// Returns `InvalidInput` naming the field if the value is empty or not a number.
pub fn parse_field(name: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DiagnosisError::InvalidInput(format!("Missing: {}", name)));
    }
    trimmed.parse::<f64>().map_err(|_| {
        DiagnosisError::InvalidInput(format!("{}: '{}' is not a number", name, trimmed))
    })
}

/// Resolves a sex value to its binary code
///
/// A value made only of digits, dots and minus signs is read as a number
/// (`"1"`, `"1."`, `".5"`, `"-1.14"`). Any other value is a text label:
/// `male`/`m` (any case) map to 1 and everything else to 0.
///
/// # Errors
///
/// Returns `InvalidInput` if a numeric-looking value does not parse, such as
/// `"1.2.3"`.
///
/// # Example
///
/// ```
/// use pancdx_core::types::parse_sex;
///
/// assert_eq!(parse_sex("M").unwrap(), 1.0);
/// assert_eq!(parse_sex("female").unwrap(), 0.0);
/// assert_eq!(parse_sex("1").unwrap(), 1.0);
/// assert!(parse_sex("1.2.3").is_err());
/// ```
pub fn parse_sex(value: &str) -> Result<f64> {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let re = NUMERIC.get_or_init(|| {
        Regex::new(r"^[-.]*[0-9][-.0-9]*$").expect("Failed to compile regex")
    });

    let trimmed = value.trim();
    if re.is_match(trimmed) {
        return trimmed.parse::<f64>().map_err(|_| {
            DiagnosisError::InvalidInput(format!("sex: '{}' is not a number", trimmed))
        });
    }

    Ok(match trimmed.to_lowercase().as_str() {
        "male" | "m" => 1.0,
        _ => 0.0,
    })
}
