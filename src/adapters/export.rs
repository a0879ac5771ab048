//! CSV export of the encoded input record.

use std::path::Path;

use crate::domain::{FeatureVector, PredictionResult, FEATURE_NAMES};

/// Name of the optional column carrying the predicted class.
pub const PREDICTION_COLUMN: &str = "prediction";

/// Render the record as a two-line CSV document (header + one row).
///
/// With a result, a `prediction` column holding the class label is appended.
#[must_use]
pub fn to_csv(features: &FeatureVector, result: Option<&PredictionResult>) -> String {
    let mut header: Vec<&str> = FEATURE_NAMES.to_vec();
    let mut row: Vec<String> = features.to_array().iter().map(f64::to_string).collect();

    if let Some(result) = result {
        header.push(PREDICTION_COLUMN);
        row.push(result.label.class().to_string());
    }

    let mut out = header.join(",");
    out.push('\n');
    out.push_str(&row.join(","));
    out.push('\n');
    out
}

/// Write the CSV document to `path`, replacing any existing file.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn write_csv(
    path: &Path,
    features: &FeatureVector,
    result: Option<&PredictionResult>,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_csv(features, result))?;
    tracing::info!("Exported input vector to {:?}", path);
    Ok(())
}
