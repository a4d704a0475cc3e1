use std::path::Path;

/// Model selected when none is requested
pub const DEFAULT_MODEL_NAME: &str = "SVM (Best)";

/// Artifact used for names missing from the registry
pub const FALLBACK_MODEL_PATH: &str = "FINAL_MODEL_SVM.json";

/// Scaler shared by every tabular model
pub const DEFAULT_SCALER_PATH: &str = "models/scalers/FINAL_SCALER.json";

/// Human-readable model names and their artifact paths, relative to the base path
pub const MODEL_REGISTRY: &[(&str, &str)] = &[
    // SVM Models
    ("SVM (Best)", "models/lab_tests/svm/FINAL_MODEL_SVM.json"),
    ("SVM Moderate", "models/lab_tests/svm/svm_moderate.json"),
    // Logistic Regression
    (
        "Logistic Regression",
        "models/lab_tests/logistic_regression/logistic_regression_moderate.json",
    ),
    // Random Forest
    (
        "Random Forest",
        "models/lab_tests/random_forest/random_forest_aggressive.json",
    ),
    // LightGBM Models
    ("LightGBM Best", "models/lab_tests/lightgbm/lgb_best_model.json"),
    (
        "LightGBM Moderate",
        "models/lab_tests/lightgbm/lgb_model_1_moderate.json",
    ),
    (
        "LightGBM Aggressive",
        "models/lab_tests/lightgbm/lgb_model_2_aggressive.json",
    ),
    (
        "LightGBM Finetuned",
        "models/lab_tests/lightgbm/lgb_model_3_finetuned.json",
    ),
    // CatBoost Models
    ("CatBoost Best", "models/lab_tests/catboost/cat_best_model.json"),
    (
        "CatBoost Moderate",
        "models/lab_tests/catboost/cat_model_1_moderate.json",
    ),
    (
        "CatBoost Aggressive",
        "models/lab_tests/catboost/cat_model_2_aggressive.json",
    ),
    (
        "CatBoost Finetuned",
        "models/lab_tests/catboost/cat_model_3_finetuned.json",
    ),
    // Stacked Models
    (
        "Stacked Meta Model",
        "models/lab_tests/stacked/stacked_meta_model.json",
    ),
    (
        "Stacked Meta Model (15 Features)",
        "models/lab_tests/stacked/stacked_meta_model_15features.json",
    ),
];

/// Returns the registered model names in registry order
pub fn model_names() -> impl Iterator<Item = &'static str> {
    MODEL_REGISTRY.iter().map(|(name, _)| *name)
}

/// Resolves a model name to its artifact path
///
/// Unknown names fall back to [`FALLBACK_MODEL_PATH`].
///
/// # Example
///
/// ```
/// use pancdx_core::model::{resolve_model_path, FALLBACK_MODEL_PATH};
///
/// assert_eq!(
///     resolve_model_path("Random Forest").to_str(),
///     Some("models/lab_tests/random_forest/random_forest_aggressive.json")
/// );
/// assert_eq!(resolve_model_path("No Such Model").to_str(), Some(FALLBACK_MODEL_PATH));
/// ```
pub fn resolve_model_path(name: &str) -> &'static Path {
    let relative = MODEL_REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, path)| *path)
        .unwrap_or(FALLBACK_MODEL_PATH);
    Path::new(relative)
}

/// Checks whether a name is in the registry
pub fn is_registered(name: &str) -> bool {
    MODEL_REGISTRY.iter().any(|(registered, _)| *registered == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_unique() {
        let names: HashSet<_> = model_names().collect();
        assert_eq!(names.len(), MODEL_REGISTRY.len());
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn test_default_model_is_registered() {
        assert!(is_registered(DEFAULT_MODEL_NAME));
        assert!(!is_registered("svm (best)"));
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        assert_eq!(
            resolve_model_path("SVM (Best)"),
            Path::new("models/lab_tests/svm/FINAL_MODEL_SVM.json")
        );
        assert_eq!(resolve_model_path(""), Path::new(FALLBACK_MODEL_PATH));
    }
}
