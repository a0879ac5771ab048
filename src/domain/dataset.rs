//! Historical patient dataset used for cohort comparison.
//!
//! The dataset is loaded once and only read afterwards. Cells that are not
//! numbers (the source data marks unknowns with `?`) are kept as missing.

use serde::Serialize;

/// Tabular dataset of historical patients.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

/// Summary statistics for one column, skipping missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// One equal-width histogram bin; `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram over a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    min: f64,
    width: f64,
}

impl Histogram {
    /// Build a histogram with `nbins` equal-width bins over `[min, max]` of
    /// `values`. Returns `None` for empty input or `nbins == 0`.
    #[must_use]
    pub fn new(values: &[f64], nbins: usize) -> Option<Self> {
        if values.is_empty() || nbins == 0 {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max <= min {
            return Some(Self {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: max,
                    count: values.len(),
                }],
                min,
                width: 0.0,
            });
        }

        let width = (max - min) / nbins as f64;
        let mut bins: Vec<HistogramBin> = (0..nbins)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == nbins {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &v in values {
            let idx = Self::index_for(v, min, width, nbins);
            bins[idx].count += 1;
        }

        Some(Self { bins, min, width })
    }

    fn index_for(value: f64, min: f64, width: f64, nbins: usize) -> usize {
        let idx = ((value - min) / width).floor() as usize;
        idx.min(nbins - 1)
    }

    /// Index of the bin containing `value`, or `None` outside the data range.
    ///
    /// Uses the same origin and width as the counting pass, so a value is
    /// always reported in the bin that counted it.
    #[must_use]
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        let first = self.bins.first()?;
        let last = self.bins.last()?;
        if value < first.lower || value > last.upper {
            return None;
        }
        if self.bins.len() == 1 || self.width <= 0.0 {
            return Some(0);
        }
        Some(Self::index_for(value, self.min, self.width, self.bins.len()))
    }

    #[must_use]
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

impl Dataset {
    /// Build a dataset, checking that every row matches the header width.
    ///
    /// # Errors
    /// Returns a message naming the first ragged row.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Result<Self, String> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(format!(
                "Row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                columns.len()
            ));
        }
        Ok(Self { columns, rows })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(rows, columns)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> &[Vec<Option<f64>>] {
        &self.rows[..n.min(self.rows.len())]
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Present values of a column, or `None` if the column does not exist.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row[idx]).collect())
    }

    #[must_use]
    pub fn summary(&self, name: &str) -> Option<ColumnSummary> {
        let values = self.column(name)?;
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(ColumnSummary {
            count,
            mean,
            min,
            max,
        })
    }

    /// Percentage of present values in `name` that are `<= value`.
    #[must_use]
    pub fn percentile_rank(&self, name: &str, value: f64) -> Option<f64> {
        let values = self.column(name)?;
        if values.is_empty() {
            return None;
        }
        let at_or_below = values.iter().filter(|&&v| v <= value).count();
        Some(at_or_below as f64 * 100.0 / values.len() as f64)
    }

    #[must_use]
    pub fn histogram(&self, name: &str, nbins: usize) -> Option<Histogram> {
        Histogram::new(&self.column(name)?, nbins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["age".into(), "chol".into()],
            vec![
                vec![Some(40.0), Some(200.0)],
                vec![Some(50.0), None],
                vec![Some(60.0), Some(300.0)],
                vec![Some(70.0), Some(250.0)],
            ],
        )
        .expect("valid dataset")
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Dataset::new(vec!["a".into(), "b".into()], vec![vec![Some(1.0)]])
            .expect_err("ragged");
        assert!(err.contains("Row 1"));
    }

    #[test]
    fn test_column_skips_missing_cells() {
        let ds = dataset();
        assert_eq!(ds.shape(), (4, 2));
        assert_eq!(ds.column("chol"), Some(vec![200.0, 300.0, 250.0]));
        assert!(ds.column("thal").is_none());
        assert_eq!(ds.head(2).len(), 2);
        assert_eq!(ds.head(10).len(), 4);
    }

    #[test]
    fn test_summary() {
        let s = dataset().summary("chol").expect("summary");
        assert_eq!(s.count, 3);
        assert!((s.mean - 250.0).abs() < 1e-9);
        assert_eq!((s.min, s.max), (200.0, 300.0));
    }

    #[test]
    fn test_percentile_rank() {
        let ds = dataset();
        assert_eq!(ds.percentile_rank("age", 50.0), Some(50.0));
        assert_eq!(ds.percentile_rank("age", 10.0), Some(0.0));
        assert_eq!(ds.percentile_rank("age", 99.0), Some(100.0));
    }

    #[test]
    fn test_histogram_counts_and_patient_bin() {
        let h = dataset().histogram("age", 3).expect("histogram");
        assert_eq!(h.bins.len(), 3);
        // [40,50) [50,60) [60,70]
        let counts: Vec<_> = h.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 2]);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(h.max_count(), 2);

        assert_eq!(h.bin_index(40.0), Some(0));
        assert_eq!(h.bin_index(55.0), Some(1));
        assert_eq!(h.bin_index(70.0), Some(2));
        assert_eq!(h.bin_index(30.0), None);
        assert_eq!(h.bin_index(71.0), None);
    }

    #[test]
    fn test_histogram_single_value() {
        let h = Histogram::new(&[5.0, 5.0], 20).expect("histogram");
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 2);
        assert_eq!(h.bin_index(5.0), Some(0));
        assert!(Histogram::new(&[], 20).is_none());
    }

    #[test]
    fn test_bin_index_matches_counting_bin() {
        let h = Histogram::new(&[37.0, 45.0, 69.0], 20).expect("histogram");
        assert_eq!(h.bins[5].count, 1);
        assert_eq!(h.bin_index(45.0), Some(5));

        let baseline = Histogram::new(&[37.0, 69.0], 20).expect("histogram");
        let mut v = 37.0;
        while v <= 69.0 {
            let h = Histogram::new(&[37.0, v, 69.0], 20).expect("histogram");
            let counted = h
                .bins
                .iter()
                .zip(&baseline.bins)
                .position(|(with, without)| with.count != without.count)
                .expect("value lands in some bin");
            assert_eq!(h.bin_index(v), Some(counted), "age {v}");
            v += 0.5;
        }
    }
}
