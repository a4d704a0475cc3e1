use crate::types::{DerivedFeatureVector, NormalizedVector};

/// Expands a normalized vector into the 15 model features
///
/// Interaction terms are computed on the z-scored values. Ratios whose
/// denominator is exactly zero yield 0; `risk_score` is always 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derives the feature vector in artifact column order
    ///
    /// # Example
    ///
    /// ```
    /// use pancdx_core::features::FeatureDeriver;
    /// use pancdx_core::types::NormalizedVector;
    ///
    /// let n = NormalizedVector::from_z_scores(2.0, 1.0, 0.0, 1.5, 0.5, 3.0, 0.0);
    /// let features = FeatureDeriver::new().derive(&n);
    /// assert_eq!(features.get("bili_creat_ratio"), Some(0.0));
    /// assert_eq!(features.get("urine_ratio"), Some(0.0));
    /// assert_eq!(features.get("age_squared"), Some(4.0));
    /// ```
    pub fn derive(&self, n: &NormalizedVector) -> DerivedFeatureVector {
        let bili_creat_ratio = if n.creatinine != 0.0 {
            n.bilirubin / n.creatinine
        } else {
            0.0
        };
        let urine_ratio = if n.urine_ph != 0.0 {
            n.urine_volume / n.urine_ph
        } else {
            0.0
        };

        DerivedFeatureVector::from_values([
            n.age,
            n.sex,
            n.creatinine,
            n.bilirubin,
            n.glucose,
            n.urine_volume,
            n.urine_ph,
            bili_creat_ratio,
            n.bilirubin * n.creatinine,
            n.age * n.age,
            n.age * n.bilirubin,
            n.age * n.creatinine,
            n.glucose * n.age,
            urine_ratio,
            0.0,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureNormalizer;
    use crate::types::{RawLabMeasurement, FEATURE_COLUMNS};

    fn sample() -> NormalizedVector {
        NormalizedVector::from_z_scores(0.5, -1.1, 0.4, 1.2, -0.3, 2.0, -0.8)
    }

    #[test]
    fn test_derive_column_order() {
        let f = FeatureDeriver::new().derive(&sample());
        let values = f.as_slice();
        assert_eq!(values.len(), FEATURE_COLUMNS.len());

        assert_eq!(values[0], 0.5);
        assert_eq!(values[1], -1.1);
        assert_eq!(values[2], 0.4);
        assert_eq!(values[3], 1.2);
        assert_eq!(values[4], -0.3);
        assert_eq!(values[5], 2.0);
        assert_eq!(values[6], -0.8);
        assert!((values[7] - 1.2 / 0.4).abs() < 1e-12);
        assert!((values[8] - 1.2 * 0.4).abs() < 1e-12);
        assert!((values[9] - 0.25).abs() < 1e-12);
        assert!((values[10] - 0.5 * 1.2).abs() < 1e-12);
        assert!((values[11] - 0.5 * 0.4).abs() < 1e-12);
        assert!((values[12] - -0.3 * 0.5).abs() < 1e-12);
        assert!((values[13] - 2.0 / -0.8).abs() < 1e-12);
        assert_eq!(values[14], 0.0);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let n = NormalizedVector::from_z_scores(1.0, 0.0, 0.0, 3.0, 1.0, 5.0, 0.0);
        let f = FeatureDeriver::new().derive(&n);
        assert_eq!(f.get("bili_creat_ratio"), Some(0.0));
        assert_eq!(f.get("urine_ratio"), Some(0.0));
        assert!(f.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_age_squared_matches_normalized_age() {
        let raw = RawLabMeasurement::new(65.0, 1.0, 1.2, 2.0, 110.0, 70.0, 6.0);
        let n = FeatureNormalizer::new().normalize(&raw);
        let f = FeatureDeriver::new().derive(&n);
        let age_squared = f.get("age_squared").unwrap();
        assert!((age_squared - n.age * n.age).abs() < 1e-9);
    }

    #[test]
    fn test_risk_score_placeholder() {
        let f = FeatureDeriver::new().derive(&sample());
        assert_eq!(f.get("risk_score"), Some(0.0));
    }
}
