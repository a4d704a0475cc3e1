use crate::types::{NormalizedVector, RawLabMeasurement};

/// Mean and standard deviation of one field in the training population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub mean: f64,
    pub std: f64,
}

impl FieldStats {
    const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Returns `(x - mean) / std`
    pub fn z_score(&self, x: f64) -> f64 {
        (x - self.mean) / self.std
    }
}

/// Per-field population statistics used for z-score normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub age: FieldStats,
    pub sex: FieldStats,
    pub creatinine: FieldStats,
    pub bilirubin: FieldStats,
    pub glucose: FieldStats,
    pub urine_volume: FieldStats,
    pub urine_ph: FieldStats,
}

/// Statistics of the training data the tabular classifiers were fit on
///
/// Fixed constants; every `std` is non-zero.
pub const POPULATION_STATS: PopulationStats = PopulationStats {
    age: FieldStats::new(57.0283, 16.1234),
    sex: FieldStats::new(0.565, 0.4961),
    creatinine: FieldStats::new(1.0515, 0.2852),
    bilirubin: FieldStats::new(1.4347, 0.8909),
    glucose: FieldStats::new(100.0701, 18.6507),
    urine_volume: FieldStats::new(78.6932, 29.5679),
    urine_ph: FieldStats::new(6.1971, 0.9966),
};

/// Converts raw lab values into population z-scores
///
/// # Example
///
/// ```
/// use pancdx_core::features::FeatureNormalizer;
/// use pancdx_core::types::RawLabMeasurement;
///
/// let raw = RawLabMeasurement::new(57.0283, 0.565, 1.0515, 1.4347, 100.0701, 78.6932, 6.1971);
/// let normalized = FeatureNormalizer::new().normalize(&raw);
/// assert!(normalized.age.abs() < 1e-12);
/// assert!(normalized.urine_ph.abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    stats: PopulationStats,
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureNormalizer {
    /// Creates a normalizer over [`POPULATION_STATS`]
    pub fn new() -> Self {
        Self {
            stats: POPULATION_STATS,
        }
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    /// Normalizes each field as `(x - mean) / std`
    pub fn normalize(&self, raw: &RawLabMeasurement) -> NormalizedVector {
        let s = &self.stats;
        NormalizedVector {
            age: s.age.z_score(raw.age),
            sex: s.sex.z_score(raw.sex),
            creatinine: s.creatinine.z_score(raw.creatinine),
            bilirubin: s.bilirubin.z_score(raw.bilirubin),
            glucose: s.glucose.z_score(raw.glucose),
            urine_volume: s.urine_volume.z_score(raw.urine_volume),
            urine_ph: s.urine_ph.z_score(raw.urine_ph),
        }
    }
}
