//! Core type definitions for diagnostic inference
//!
//! This module provides the fundamental types used throughout the pancdx library:
//! - [`RawLabMeasurement`]: Raw physiological lab values for one patient
//! - [`NormalizedVector`]: The same values as population z-scores
//! - [`DerivedFeatureVector`]: The 15 model-ready features in artifact column order
//! - [`PredictionOutcome`]: Result of a tabular inference call
//! - [`CtPrediction`]: Result of a CT image inference call
//! - [`Diagnosis`] / [`AnalysisType`]: Labels recorded in history

mod features;
mod lab;
mod outcome;

pub use features::{
    DerivedFeatureVector, NormalizedVector, FEATURE_COLUMNS, FEATURE_COUNT,
};
pub use lab::{parse_field, parse_sex, RawLabMeasurement};
pub use outcome::{AnalysisType, CtPrediction, Diagnosis, PredictionOutcome};
