//! CSV adapter: Loads the historical patient dataset.
//!
//! The file is a plain comma-separated table with a header row. Quoting is
//! not supported; cells that do not parse as numbers become missing values.

use std::path::{Path, PathBuf};

use crate::domain::Dataset;

/// Column every dataset must provide for the cohort comparison.
pub const REQUIRED_COLUMN: &str = "age";

/// Error type for dataset loading.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Cannot read dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Malformed(String),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Dataset has no rows")]
    Empty,
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse CSV text into a dataset.
///
/// # Errors
/// Returns error if the header is missing, a row is ragged, the `age` column
/// is absent, or there are no data rows.
pub fn parse_csv(text: &str) -> Result<Dataset, DatasetError> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| DatasetError::Malformed("missing header row".into()))?;
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect();

    if columns.iter().any(String::is_empty) {
        return Err(DatasetError::Malformed("empty column name in header".into()));
    }

    let rows: Vec<Vec<Option<f64>>> = lines
        .map(|line| line.split(',').map(parse_cell).collect())
        .collect();

    let dataset = Dataset::new(columns, rows).map_err(DatasetError::Malformed)?;

    if dataset.column_index(REQUIRED_COLUMN).is_none() {
        return Err(DatasetError::MissingColumn(REQUIRED_COLUMN));
    }
    if dataset.is_empty() {
        return Err(DatasetError::Empty);
    }

    Ok(dataset)
}

/// Load the dataset file.
///
/// # Errors
/// Returns error if the file cannot be read or is not a usable dataset.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_csv(&text)?;

    let (rows, cols) = dataset.shape();
    tracing::info!("Loaded dataset from {:?} ({} rows, {} columns)", path, rows, cols);
    Ok(dataset)
}
