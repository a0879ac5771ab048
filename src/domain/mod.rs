//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. The feature encoder lives here because it is
//! a pure function of the patient record.

mod dataset;
mod features;
mod patient;
mod prediction;

pub use dataset::{ColumnSummary, Dataset, Histogram, HistogramBin};
pub use features::{FeatureVector, FEATURE_NAMES, N_FEATURES};
pub use patient::{
    ChestPain, NumericRange, PatientRecord, RestingEcg, Sex, StSlope, Thalassemia, UnknownCode,
    YesNo, AGE_RANGE, CHOL_RANGE, MAX_CA, OLDPEAK_RANGE, THALACH_RANGE, TRESTBPS_RANGE,
};
pub use prediction::{Prediction, PredictionResult, RiskLabel};
