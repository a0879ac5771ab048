//! Feature encoding: raw patient attributes to the classifier's input schema.

use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;

/// Number of columns in the classifier's input schema.
pub const N_FEATURES: usize = 17;

/// Column names in the exact order the classifier was trained on.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "age",
    "sex",
    "trestbps",
    "chol",
    "fbs",
    "thalach",
    "exang",
    "oldpeak",
    "slope",
    "ca",
    "cp_2",
    "cp_3",
    "cp_4",
    "restecg_1",
    "restecg_2",
    "thal_6",
    "thal_7",
];

/// Fixed-order numeric record consumed by the classifier.
///
/// Categorical fields are one-hot encoded with the baseline category dropped:
/// cp=1, restecg=0 and thal=3 are represented by all-zero indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureVector {
    pub age: f64,
    pub sex: f64,
    pub trestbps: f64,
    pub chol: f64,
    pub fbs: f64,
    pub thalach: f64,
    pub exang: f64,
    pub oldpeak: f64,
    pub slope: f64,
    pub ca: f64,
    pub cp_2: f64,
    pub cp_3: f64,
    pub cp_4: f64,
    pub restecg_1: f64,
    pub restecg_2: f64,
    pub thal_6: f64,
    pub thal_7: f64,
}

/// One indicator per non-baseline category, set iff `code` matches it.
fn one_hot<const N: usize>(code: u8, categories: [u8; N]) -> [f64; N] {
    categories.map(|c| if c == code { 1.0 } else { 0.0 })
}

impl FeatureVector {
    /// Encode a patient record. Pure; the record is assumed to be validated.
    #[must_use]
    pub fn encode(record: &PatientRecord) -> Self {
        let [cp_2, cp_3, cp_4] = one_hot(record.cp.code(), [2, 3, 4]);
        let [restecg_1, restecg_2] = one_hot(record.restecg.code(), [1, 2]);
        let [thal_6, thal_7] = one_hot(record.thal.code(), [6, 7]);

        Self {
            age: record.age,
            sex: f64::from(record.sex.code()),
            trestbps: record.trestbps,
            chol: record.chol,
            fbs: f64::from(record.fbs.code()),
            thalach: record.thalach,
            exang: f64::from(record.exang.code()),
            oldpeak: record.oldpeak,
            slope: f64::from(record.slope.code()),
            ca: f64::from(record.ca),
            cp_2,
            cp_3,
            cp_4,
            restecg_1,
            restecg_2,
            thal_6,
            thal_7,
        }
    }

    /// Convert to a row in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [
            self.age,
            self.sex,
            self.trestbps,
            self.chol,
            self.fbs,
            self.thalach,
            self.exang,
            self.oldpeak,
            self.slope,
            self.ca,
            self.cp_2,
            self.cp_3,
            self.cp_4,
            self.restecg_1,
            self.restecg_2,
            self.thal_6,
            self.thal_7,
        ]
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Create features from a row in [`FEATURE_NAMES`] order.
    ///
    /// # Errors
    /// Returns error if the row does not have exactly 17 values.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        let row: [f64; N_FEATURES] = v
            .try_into()
            .map_err(|_| format!("Expected {N_FEATURES} features, got {}", v.len()))?;

        let [age, sex, trestbps, chol, fbs, thalach, exang, oldpeak, slope, ca, cp_2, cp_3, cp_4, restecg_1, restecg_2, thal_6, thal_7] =
            row;

        Ok(Self {
            age,
            sex,
            trestbps,
            chol,
            fbs,
            thalach,
            exang,
            oldpeak,
            slope,
            ca,
            cp_2,
            cp_3,
            cp_4,
            restecg_1,
            restecg_2,
            thal_6,
            thal_7,
        })
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }
}
