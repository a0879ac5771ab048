//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the pre-trained model it invokes.

mod classifier;

pub use classifier::{Classifier, ClassifierError, ClassifierHandle, ProbabilisticClassifier};
