//! Cohort analytics: How the current patient compares to the dataset.
//!
//! Read-only views over the dataset loaded at startup.

use std::sync::Arc;

use crate::domain::{Dataset, Histogram, PatientRecord};

/// Number of bins in the age distribution chart.
pub const AGE_HISTOGRAM_BINS: usize = 20;

/// Number of rows shown in the dataset preview.
pub const PREVIEW_ROWS: usize = 5;

/// Where the patient falls within the cohort for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub label: &'static str,
    pub column: &'static str,
    pub patient_value: f64,
    pub cohort_mean: f64,
    /// Share of cohort values at or below the patient's value, in percent.
    pub percentile: f64,
}

/// Age distribution with the patient's position marked.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeDistribution {
    pub histogram: Histogram,
    pub patient_age: f64,
    /// Bin holding the patient, `None` if outside the cohort's age range.
    pub patient_bin: Option<usize>,
}

/// Service for dataset views.
#[derive(Debug, Clone)]
pub struct CohortAnalytics {
    dataset: Arc<Dataset>,
}

impl CohortAnalytics {
    /// Create a new analytics service.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Age histogram with the current patient located.
    #[must_use]
    pub fn age_distribution(&self, record: &PatientRecord) -> Option<AgeDistribution> {
        let histogram = self.dataset.histogram("age", AGE_HISTOGRAM_BINS)?;
        let patient_bin = histogram.bin_index(record.age);
        Some(AgeDistribution {
            histogram,
            patient_age: record.age,
            patient_bin,
        })
    }

    /// Percentile comparisons for the numeric vitals the dataset carries.
    ///
    /// Attributes missing from the dataset are skipped.
    #[must_use]
    pub fn compare(&self, record: &PatientRecord) -> Vec<Comparison> {
        let attributes = [
            ("Age", "age", record.age),
            ("Resting BP", "trestbps", record.trestbps),
            ("Cholesterol", "chol", record.chol),
            ("Max Heart Rate", "thalach", record.thalach),
        ];

        attributes
            .into_iter()
            .filter_map(|(label, column, value)| {
                let summary = self.dataset.summary(column)?;
                let percentile = self.dataset.percentile_rank(column, value)?;
                Some(Comparison {
                    label,
                    column,
                    patient_value: value,
                    cohort_mean: summary.mean,
                    percentile,
                })
            })
            .collect()
    }

    /// Column names and the first rows, for the dataset preview.
    #[must_use]
    pub fn preview(&self) -> (&[String], &[Vec<Option<f64>>]) {
        (self.dataset.columns(), self.dataset.head(PREVIEW_ROWS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CohortAnalytics {
        let dataset = Dataset::new(
            vec!["age".into(), "chol".into(), "target".into()],
            (0..10)
                .map(|i| vec![Some(30.0 + 5.0 * i as f64), Some(200.0 + i as f64), Some(0.0)])
                .collect(),
        )
        .expect("dataset");
        CohortAnalytics::new(Arc::new(dataset))
    }

    #[test]
    fn test_age_distribution_marks_patient() {
        let analytics = service();
        let record = PatientRecord {
            age: 50.0,
            ..PatientRecord::default()
        };

        let dist = analytics.age_distribution(&record).expect("distribution");
        assert_eq!(dist.histogram.bins.len(), AGE_HISTOGRAM_BINS);
        let bin = dist.patient_bin.expect("inside range");
        let b = dist.histogram.bins[bin];
        assert!(b.lower <= 50.0 && 50.0 <= b.upper);
    }

    #[test]
    fn test_age_outside_cohort_has_no_bin() {
        let analytics = service();
        let record = PatientRecord {
            age: 90.0,
            ..PatientRecord::default()
        };
        let dist = analytics.age_distribution(&record).expect("distribution");
        assert!(dist.patient_bin.is_none());
    }

    #[test]
    fn test_compare_skips_absent_columns() {
        let analytics = service();
        let comparisons = analytics.compare(&PatientRecord::default());
        let columns: Vec<_> = comparisons.iter().map(|c| c.column).collect();
        assert_eq!(columns, vec!["age", "chol"]);

        // Ages 30..=75 in steps of 5; 50 or younger is 5 of 10.
        assert_eq!(comparisons[0].percentile, 50.0);
        // Every cholesterol value is at or below 240.
        assert_eq!(comparisons[1].percentile, 100.0);
    }

    #[test]
    fn test_preview_is_capped() {
        let analytics = service();
        let (columns, rows) = analytics.preview();
        assert_eq!(columns.len(), 3);
        assert_eq!(rows.len(), PREVIEW_ROWS);
    }
}
