//! Model adapter: Loads the serialized classifier artifact.
//!
//! The artifact is a JSON export of a linear estimator fitted elsewhere:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "estimator": "logistic_regression",
//!   "feature_names": ["age", "sex", "..."],
//!   "coefficients": [0.01, 1.2, "..."],
//!   "intercept": -3.5,
//!   "threshold": 0.5
//! }
//! ```
//!
//! `logistic_regression` artifacts can estimate probabilities; `linear_svc`
//! artifacts only produce labels. The capability is fixed at load time.
//!
//! # Integrity
//!
//! If a `manifest.json` sits next to the model it maps file names to SHA-256
//! digests. Every listed file must hash-match and the model file must be
//! listed. Set `CARDIOLENS_REQUIRE_MANIFEST=true` to refuse unlisted models.
//! The `hash_artifacts` binary writes the manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{Classifier, ClassifierError, ClassifierHandle, ProbabilisticClassifier};

/// Manifest file name, looked up in the model's directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Only artifact layout this loader understands.
pub const FORMAT_VERSION: u32 = 1;

/// Errors that can occur while loading the model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

/// Estimator family recorded in the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression,
    LinearSvc,
}

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub estimator: Estimator,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Decision threshold on P(1); logistic regression only.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.5
}

/// Manifest binding artifact files to their SHA-256 digests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Weighted sum of a row with the model's coefficients.
fn decision_function(
    coefficients: &[f64],
    intercept: f64,
    row: &[f64],
) -> Result<f64, ClassifierError> {
    if row.len() != coefficients.len() {
        return Err(ClassifierError::SchemaMismatch(format!(
            "got {} features, model expects {}",
            row.len(),
            coefficients.len()
        )));
    }

    let z = coefficients
        .iter()
        .zip(row)
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept;

    if z.is_finite() {
        Ok(z)
    } else {
        Err(ClassifierError::InvalidOutput(format!(
            "non-finite decision value {z}"
        )))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Binary logistic regression over raw features.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl Classifier for LogisticRegression {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let [_, p1] = self.predict_proba(row)?;
        Ok(u8::from(p1 >= self.threshold))
    }

    fn kind(&self) -> &str {
        "logistic_regression"
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ClassifierError> {
        let z = decision_function(&self.coefficients, self.intercept, row)?;
        let p1 = sigmoid(z);
        Ok([1.0 - p1, p1])
    }
}

/// Linear support vector classifier: sign of the decision function, no
/// probability estimates.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Classifier for LinearSvc {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let z = decision_function(&self.coefficients, self.intercept, row)?;
        Ok(u8::from(z >= 0.0))
    }

    fn kind(&self) -> &str {
        "linear_svc"
    }
}

impl ModelArtifact {
    /// Check internal consistency of the exported parameters.
    ///
    /// Agreement with the application's feature schema is not checked here;
    /// a mismatch surfaces per request as `ClassifierError::SchemaMismatch`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ArtifactError::Invalid(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        let n = self.feature_names.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("feature_names is empty".into()));
        }
        if self.coefficients.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "{} coefficients for {n} feature names",
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(
                "coefficients and intercept must be finite".into(),
            ));
        }
        if self.estimator == Estimator::LogisticRegression
            && !(self.threshold > 0.0 && self.threshold < 1.0)
        {
            return Err(ArtifactError::Invalid(format!(
                "threshold {} must be in (0, 1)",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Resolve the artifact into a capability-tagged classifier.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameters are inconsistent.
    pub fn into_handle(self) -> Result<ClassifierHandle, ArtifactError> {
        self.validate()?;
        Ok(match self.estimator {
            Estimator::LogisticRegression => {
                ClassifierHandle::Probabilistic(Box::new(LogisticRegression {
                    feature_names: self.feature_names,
                    coefficients: self.coefficients,
                    intercept: self.intercept,
                    threshold: self.threshold,
                }))
            }
            Estimator::LinearSvc => ClassifierHandle::LabelOnly(Box::new(LinearSvc {
                feature_names: self.feature_names,
                coefficients: self.coefficients,
                intercept: self.intercept,
            })),
        })
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Verify the manifest next to `model_path`, if any.
///
/// Returns whether a manifest was found and verified.
fn verify_manifest(model_path: &Path, require_manifest: bool) -> Result<bool, ArtifactError> {
    let base_dir = model_path.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = base_dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        if require_manifest {
            return Err(ArtifactError::Integrity(format!(
                "{MANIFEST_FILE} not found in {base_dir:?}"
            )));
        }
        tracing::warn!("No {} next to model; skipping integrity check", MANIFEST_FILE);
        return Ok(false);
    }

    let content = read_bytes(&manifest_path)?;
    let manifest: ArtifactManifest =
        serde_json::from_slice(&content).map_err(|source| ArtifactError::Format {
            path: manifest_path.clone(),
            source,
        })?;

    if manifest.version != 1 {
        return Err(ArtifactError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    let model_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !manifest.files.contains_key(model_name) {
        return Err(ArtifactError::Integrity(format!(
            "{MANIFEST_FILE} does not list {model_name}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let inside = Path::new(rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return Err(ArtifactError::Integrity(format!(
                "manifest entry {rel:?} escapes the model directory"
            )));
        }
        let path = base_dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ArtifactError::Integrity(format!(
                "manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;
        if !sha256_hex(&bytes).eq_ignore_ascii_case(expected_hex.trim()) {
            return Err(ArtifactError::Integrity(format!("hash mismatch for {rel}")));
        }
    }

    tracing::info!("Verified {} artifact hashes", manifest.files.len());
    Ok(true)
}

/// Load the classifier from a JSON artifact.
///
/// # Errors
/// Returns error if the file is missing, malformed, inconsistent, or fails
/// the manifest check.
pub fn load_model(path: &Path, require_manifest: bool) -> Result<ClassifierHandle, ArtifactError> {
    verify_manifest(path, require_manifest)?;

    let content = read_bytes(path)?;
    let artifact: ModelArtifact =
        serde_json::from_slice(&content).map_err(|source| ArtifactError::Format {
            path: path.to_path_buf(),
            source,
        })?;

    let handle = artifact.into_handle()?;

    tracing::info!(
        "Loaded model from {:?} (estimator={}, n_features={}, probabilities={})",
        path,
        handle.kind(),
        handle.feature_names().len(),
        handle.supports_probabilities()
    );

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn artifact(estimator: Estimator) -> ModelArtifact {
        ModelArtifact {
            format_version: 1,
            estimator,
            feature_names: vec!["a".into(), "b".into()],
            coefficients: vec![1.0, -2.0],
            intercept: 0.5,
            threshold: 0.5,
        }
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) {
        let json = serde_json::to_vec(value).expect("serialize");
        fs::write(path, json).expect("write");
    }

    #[test]
    fn test_capability_resolved_at_load() {
        let handle = artifact(Estimator::LogisticRegression)
            .into_handle()
            .expect("valid");
        assert!(handle.supports_probabilities());
        assert_eq!(handle.kind(), "logistic_regression");

        let handle = artifact(Estimator::LinearSvc).into_handle().expect("valid");
        assert!(!handle.supports_probabilities());
        assert_eq!(handle.kind(), "linear_svc");
    }

    #[test]
    fn test_logistic_probabilities() {
        let ClassifierHandle::Probabilistic(model) = artifact(Estimator::LogisticRegression)
            .into_handle()
            .expect("valid")
        else {
            panic!("expected probabilistic handle");
        };

        // z = 1*2 - 2*0 + 0.5 = 2.5
        let [p0, p1] = model.predict_proba(&[2.0, 0.0]).expect("proba");
        assert!((p1 - 1.0 / (1.0 + (-2.5f64).exp())).abs() < 1e-12);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[2.0, 0.0]), Ok(1));
        // z = 0 - 2 + 0.5 = -1.5
        assert_eq!(model.predict(&[0.0, 1.0]), Ok(0));
    }

    #[test]
    fn test_linear_svc_sign() {
        let handle = artifact(Estimator::LinearSvc).into_handle().expect("valid");
        assert_eq!(handle.predict(&[1.0, 0.0]), Ok(1));
        assert_eq!(handle.predict(&[0.0, 1.0]), Ok(0));
    }

    #[test]
    fn test_wrong_row_length_is_schema_mismatch() {
        let handle = artifact(Estimator::LinearSvc).into_handle().expect("valid");
        let err = handle.predict(&[1.0]).expect_err("must fail");
        assert!(matches!(err, ClassifierError::SchemaMismatch(_)));
    }

    #[test]
    fn test_validate_rejects_inconsistent_artifacts() {
        let mut a = artifact(Estimator::LogisticRegression);
        a.coefficients.push(1.0);
        assert!(matches!(a.validate(), Err(ArtifactError::Invalid(_))));

        let mut a = artifact(Estimator::LogisticRegression);
        a.threshold = 1.0;
        assert!(a.validate().is_err());

        let mut a = artifact(Estimator::LinearSvc);
        a.intercept = f64::NAN;
        assert!(a.validate().is_err());

        let mut a = artifact(Estimator::LinearSvc);
        a.format_version = 2;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_threshold_defaults_when_absent() {
        let json = r#"{"format_version":1,"estimator":"logistic_regression",
            "feature_names":["a"],"coefficients":[1.0],"intercept":0.0}"#;
        let a: ModelArtifact = serde_json::from_str(json).expect("parse");
        assert_eq!(a.threshold, 0.5);
    }

    #[test]
    fn test_load_model_without_manifest() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.json");
        write_json(&path, &artifact(Estimator::LogisticRegression));

        let handle = load_model(&path, false).expect("load");
        assert_eq!(handle.feature_names().len(), 2);

        let err = load_model(&path, true).expect_err("manifest required");
        assert!(matches!(err, ArtifactError::Integrity(_)));
    }

    #[test]
    fn test_load_model_missing_file() {
        let temp = tempdir().expect("tempdir");
        let err = load_model(&temp.path().join("absent.json"), false).expect_err("missing");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_load_model_malformed_json() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("model.json");
        fs::write(&path, b"{ not json").expect("write");
        let err = load_model(&path, false).expect_err("malformed");
        assert!(matches!(err, ArtifactError::Format { .. }));
    }

    #[test]
    fn test_manifest_verifies_hashes() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        let path = dir.join("model.json");
        write_json(&path, &artifact(Estimator::LinearSvc));

        let bytes = fs::read(&path).expect("read");
        let mut files = BTreeMap::new();
        files.insert("model.json".to_string(), sha256_hex(&bytes));
        let manifest = ArtifactManifest {
            version: 1,
            created_at: None,
            files,
        };
        write_json(&dir.join(MANIFEST_FILE), &manifest);

        load_model(&path, true).expect("verified load");

        // Tamper with the model after hashing.
        let mut tampered = artifact(Estimator::LinearSvc);
        tampered.intercept = 9.0;
        write_json(&path, &tampered);
        let err = load_model(&path, false).expect_err("tampered");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_manifest_must_list_model() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        let path = dir.join("model.json");
        write_json(&path, &artifact(Estimator::LinearSvc));

        let mut files = BTreeMap::new();
        files.insert("other.json".to_string(), sha256_hex(b"x"));
        fs::write(dir.join("other.json"), b"x").expect("write");
        write_json(
            &dir.join(MANIFEST_FILE),
            &ArtifactManifest {
                version: 1,
                created_at: None,
                files,
            },
        );

        let err = load_model(&path, false).expect_err("unlisted model");
        assert!(err.to_string().contains("does not list model.json"));
    }

    #[test]
    fn test_manifest_entries_stay_in_model_dir() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("models");
        fs::create_dir(&dir).expect("mkdir");
        let path = dir.join("model.json");
        write_json(&path, &artifact(Estimator::LinearSvc));
        fs::write(temp.path().join("outside.json"), b"x").expect("write");

        let mut files = BTreeMap::new();
        files.insert(
            "model.json".to_string(),
            sha256_hex(&fs::read(&path).expect("read")),
        );
        files.insert("../outside.json".to_string(), sha256_hex(b"x"));
        write_json(
            &dir.join(MANIFEST_FILE),
            &ArtifactManifest {
                version: 1,
                created_at: None,
                files,
            },
        );

        let err = load_model(&path, false).expect_err("escaping entry");
        assert!(matches!(err, ArtifactError::Integrity(_)));
        assert!(err.to_string().contains("escapes the model directory"));
    }
}
