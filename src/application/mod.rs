//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with the loaded model and dataset
//! to implement the dashboard's use cases.

mod analytics;
mod inference;

pub use analytics::{AgeDistribution, CohortAnalytics, Comparison, AGE_HISTOGRAM_BINS, PREVIEW_ROWS};
pub use inference::PredictionService;
