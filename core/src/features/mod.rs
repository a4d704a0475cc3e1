//! Tabular feature engineering
//!
//! Raw lab values are z-scored against fixed population statistics and then
//! expanded into the 15 features the tabular classifiers were trained on.

mod derive;
mod normalize;

pub use derive::FeatureDeriver;
pub use normalize::{FeatureNormalizer, FieldStats, PopulationStats, POPULATION_STATS};
