//! Classifier port: Traits for the pre-trained risk model.
//!
//! The model is an opaque collaborator. Whether it can estimate probabilities
//! is resolved once, when the artifact is loaded, into a [`ClassifierHandle`].

/// Errors that can occur while invoking a classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    /// The input row does not match the schema the model was trained on.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The model produced something other than a finite score or a 0/1 label.
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

/// A binary classifier over a fixed, named feature schema.
pub trait Classifier: Send + Sync {
    /// Feature names in the order the model expects them.
    fn feature_names(&self) -> &[String];

    /// Predict the class label (0 or 1) for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError::SchemaMismatch` if the row length differs
    /// from the model's feature count.
    fn predict(&self, row: &[f64]) -> Result<u8, ClassifierError>;

    /// Short estimator name for display (e.g. "logistic_regression").
    fn kind(&self) -> &str;
}

/// A classifier that can also estimate class probabilities.
pub trait ProbabilisticClassifier: Classifier {
    /// Per-class probabilities `[P(0), P(1)]` for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError::SchemaMismatch` on a row of the wrong length.
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ClassifierError>;
}

/// A loaded model, tagged with its probability capability.
pub enum ClassifierHandle {
    /// Supports both `predict` and `predict_proba`.
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    /// Supports `predict` only; confidence is unavailable.
    LabelOnly(Box<dyn Classifier>),
}

impl ClassifierHandle {
    /// Feature names the underlying model expects.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::Probabilistic(c) => c.feature_names(),
            Self::LabelOnly(c) => c.feature_names(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Probabilistic(c) => c.kind(),
            Self::LabelOnly(c) => c.kind(),
        }
    }

    /// Predict the class label for one row, whatever the capability.
    ///
    /// # Errors
    /// Propagates the classifier's error.
    pub fn predict(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        match self {
            Self::Probabilistic(c) => c.predict(row),
            Self::LabelOnly(c) => c.predict(row),
        }
    }

    #[must_use]
    pub fn supports_probabilities(&self) -> bool {
        matches!(self, Self::Probabilistic(_))
    }

    /// Check that the model expects exactly `names`, in that order.
    ///
    /// # Errors
    /// Returns `ClassifierError::SchemaMismatch` describing the first difference.
    pub fn check_schema(&self, names: &[&str]) -> Result<(), ClassifierError> {
        let expected = self.feature_names();
        if expected.len() != names.len() {
            return Err(ClassifierError::SchemaMismatch(format!(
                "model expects {} features, input has {}",
                expected.len(),
                names.len()
            )));
        }

        if let Some((i, (want, got))) = expected
            .iter()
            .zip(names)
            .enumerate()
            .find(|(_, (want, got))| want.as_str() != **got)
        {
            return Err(ClassifierError::SchemaMismatch(format!(
                "feature {i} is '{got}', model expects '{want}'"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Probabilistic(_) => "Probabilistic",
            Self::LabelOnly(_) => "LabelOnly",
        };
        f.debug_struct("ClassifierHandle")
            .field("capability", &variant)
            .field("kind", &self.kind())
            .field("n_features", &self.feature_names().len())
            .finish()
    }
}
