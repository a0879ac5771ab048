//! Adapters layer: Concrete implementations of ports and file I/O.
//!
//! - `model`: JSON model artifact loader and linear classifiers
//! - `dataset`: CSV loader for the historical dataset
//! - `export`: CSV export of the encoded input record

pub mod dataset;
pub mod export;
pub mod model;

pub use dataset::DatasetError;
pub use model::ArtifactError;
