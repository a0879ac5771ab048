//! # Cardiolens
//!
//! Terminal dashboard for heart-disease risk prediction.
//!
//! This crate provides:
//! - Feature encoding of clinical attributes into the classifier's schema
//! - Invocation of a pre-trained classifier loaded from a JSON artifact
//! - Cohort comparison against a historical dataset
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (PatientRecord, FeatureVector, Prediction, Dataset)
//! - `ports`: Trait definitions for the classifier
//! - `adapters`: Concrete implementations (model artifact, CSV dataset, export)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{FeatureVector, PatientRecord, Prediction, PredictionResult, RiskLabel};

/// Result type for Cardiolens operations
pub type Result<T> = std::result::Result<T, CardiolensError>;

/// Error returned by the prediction use case.
#[derive(Debug, thiserror::Error)]
pub enum CardiolensError {
    #[error("Input out of range: {0}")]
    InputOutOfRange(String),

    #[error("Prediction failed: {0}")]
    Classifier(#[from] ports::ClassifierError),
}
