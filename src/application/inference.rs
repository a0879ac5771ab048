//! Prediction service: Encodes a patient record and invokes the classifier.
//!
//! The model handle is created once at startup and shared read-only. Each
//! call is an independent, synchronous encode → predict pass; nothing is
//! cached or persisted between calls.

use std::sync::Arc;

use crate::domain::{
    FeatureVector, PatientRecord, Prediction, PredictionResult, RiskLabel, FEATURE_NAMES,
};
use crate::ports::{ClassifierError, ClassifierHandle};
use crate::CardiolensError;

/// Service for running risk predictions against the loaded model.
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: Arc<ClassifierHandle>,
}

impl PredictionService {
    /// Create a new prediction service around an already loaded model.
    #[must_use]
    pub fn new(model: Arc<ClassifierHandle>) -> Self {
        if let Err(e) = model.check_schema(&FEATURE_NAMES) {
            // Not fatal at startup: every request will report it.
            tracing::warn!("Loaded model does not match the input schema: {}", e);
        }
        Self { model }
    }

    #[must_use]
    pub fn model(&self) -> &ClassifierHandle {
        &self.model
    }

    /// Invoke the classifier on an encoded record.
    ///
    /// # Errors
    /// Returns `ClassifierError::SchemaMismatch` if the model's expected
    /// features differ from the encoded schema, or any error the classifier
    /// reports. No partial result is returned.
    pub fn invoke(&self, features: &FeatureVector) -> Result<PredictionResult, ClassifierError> {
        self.model.check_schema(&FEATURE_NAMES)?;

        let row = features.to_array();
        let class = self.model.predict(&row)?;
        let label = RiskLabel::from_class(class)
            .ok_or_else(|| ClassifierError::InvalidOutput(format!("label {class} is not 0 or 1")))?;

        let result = match self.model.as_ref() {
            ClassifierHandle::Probabilistic(model) => {
                let [_, p1] = model.predict_proba(&row)?;
                if !(0.0..=1.0).contains(&p1) {
                    return Err(ClassifierError::InvalidOutput(format!(
                        "probability {p1} outside [0, 1]"
                    )));
                }
                PredictionResult::with_probability(label, p1)
            }
            ClassifierHandle::LabelOnly(_) => PredictionResult::label_only(label),
        };

        Ok(result)
    }

    /// Run the full pipeline for one patient: validate, encode, invoke.
    ///
    /// # Errors
    /// Returns `CardiolensError::InputOutOfRange` for a record that escaped
    /// the form's bounds, or `CardiolensError::Classifier` on invocation
    /// failure.
    pub fn predict(&self, record: &PatientRecord) -> crate::Result<Prediction> {
        record
            .validate()
            .map_err(|errors| CardiolensError::InputOutOfRange(errors.join(", ")))?;

        let features = FeatureVector::encode(record);
        let result = self.invoke(&features)?;

        tracing::info!(
            "Prediction complete: label={}, confidence={}",
            result.label,
            result
                .confidence
                .map_or_else(|| "n/a".to_string(), |c| format!("{:.1}%", c * 100.0))
        );
        tracing::debug!("Encoded features: {:?}", features);

        Ok(Prediction::new(features, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::{load_model, Estimator, ModelArtifact};
    use std::path::Path;

    fn bundled_service() -> PredictionService {
        let model = load_model(Path::new("models/heart_model.json"), false)
            .expect("bundled model should load");
        PredictionService::new(Arc::new(model))
    }

    fn service_from(estimator: Estimator, feature_names: Vec<String>) -> PredictionService {
        let n = feature_names.len();
        let artifact = ModelArtifact {
            format_version: 1,
            estimator,
            feature_names,
            coefficients: vec![0.1; n],
            intercept: -1.0,
            threshold: 0.5,
        };
        PredictionService::new(Arc::new(artifact.into_handle().expect("valid artifact")))
    }

    fn schema() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_frozen_model_high_risk_scenario() {
        let service = bundled_service();
        let prediction = service
            .predict(&PatientRecord::sample())
            .expect("prediction");

        assert_eq!(prediction.result.label, RiskLabel::High);
        let confidence = prediction.result.confidence.expect("probabilistic model");
        assert!(confidence > 0.95 && confidence < 0.96, "confidence {confidence}");
        assert_eq!(prediction.features.cp_4, 1.0);
    }

    #[test]
    fn test_frozen_model_default_record_is_low_risk() {
        let service = bundled_service();
        let prediction = service
            .predict(&PatientRecord::default())
            .expect("prediction");

        assert_eq!(prediction.result.label, RiskLabel::Low);
        let confidence = prediction.result.confidence.expect("probabilistic model");
        assert!(confidence > 0.5);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let service = bundled_service();
        let a = service.predict(&PatientRecord::sample()).expect("first");
        let b = service.predict(&PatientRecord::sample()).expect("second");
        assert_eq!(a.result, b.result);
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn test_label_only_model_has_no_confidence() {
        let service = service_from(Estimator::LinearSvc, schema());
        let prediction = service
            .predict(&PatientRecord::sample())
            .expect("prediction");
        assert!(prediction.result.confidence.is_none());
    }

    #[test]
    fn test_schema_count_mismatch_is_an_error() {
        let mut names = schema();
        names.pop();
        let service = service_from(Estimator::LogisticRegression, names);

        let err = service
            .predict(&PatientRecord::default())
            .expect_err("must not predict");
        assert!(matches!(
            err,
            CardiolensError::Classifier(ClassifierError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_schema_order_mismatch_is_an_error() {
        let mut names = schema();
        names.swap(10, 11);
        let service = service_from(Estimator::LinearSvc, names);

        let features = FeatureVector::encode(&PatientRecord::default());
        let err = service.invoke(&features).expect_err("must not predict");
        assert!(err.to_string().contains("cp_2"));
    }

    #[test]
    fn test_out_of_range_record_is_rejected_before_encoding() {
        let service = bundled_service();
        for age in [19.0, 101.0] {
            let record = PatientRecord {
                age,
                ..PatientRecord::default()
            };
            let err = service.predict(&record).expect_err("out of range");
            assert!(matches!(err, CardiolensError::InputOutOfRange(_)));
        }
        for age in [20.0, 100.0] {
            let record = PatientRecord {
                age,
                ..PatientRecord::default()
            };
            assert!(service.predict(&record).is_ok());
        }
    }
}
