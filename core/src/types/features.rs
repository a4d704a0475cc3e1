use std::fmt;

/// Number of features the tabular classifiers were fit on
pub const FEATURE_COUNT: usize = 15;

/// Feature column order expected by every tabular artifact
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "age",
    "sex_encoded",
    "creatinine",
    "bilirubin",
    "glucose",
    "urine_volume",
    "urine_pH",
    "bili_creat_ratio",
    "bili_creat_product",
    "age_squared",
    "age_bili",
    "age_creat",
    "glucose_age",
    "urine_ratio",
    "risk_score",
];

/// Lab measurements expressed as z-scores against population statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedVector {
    pub age: f64,
    pub sex: f64,
    pub creatinine: f64,
    pub bilirubin: f64,
    pub glucose: f64,
    pub urine_volume: f64,
    pub urine_ph: f64,
}

impl NormalizedVector {
    /// Builds a vector from values that are already z-scored
    ///
    /// Used for pre-processed data drawn from the training distribution.
    pub fn from_z_scores(
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
}

/// The 15 model-ready features, in artifact column order
///
/// Only constructed by [`crate::features::FeatureDeriver`], so the order in
/// [`FEATURE_COLUMNS`] always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl DerivedFeatureVector {
    pub(crate) fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Returns the feature values in column order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Looks up a feature by its column name
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values[i])
    }

    /// Iterates `(column, value)` pairs in column order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for DerivedFeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.named().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:.4}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_columns_order() {
        assert_eq!(FEATURE_COLUMNS.len(), 15);
        assert_eq!(FEATURE_COLUMNS[0], "age");
        assert_eq!(FEATURE_COLUMNS[1], "sex_encoded");
        assert_eq!(FEATURE_COLUMNS[6], "urine_pH");
        assert_eq!(FEATURE_COLUMNS[13], "urine_ratio");
        assert_eq!(FEATURE_COLUMNS[14], "risk_score");
    }

    #[test]
    fn test_get_by_column() {
        let mut values = [0.0; FEATURE_COUNT];
        values[9] = 4.0;
        let features = DerivedFeatureVector::from_values(values);
        assert_eq!(features.get("age_squared"), Some(4.0));
        assert_eq!(features.get("missing"), None);
        assert_eq!(features.len(), 15);
    }
}
