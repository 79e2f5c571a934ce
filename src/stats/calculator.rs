//! Statistics Calculator Module
//! Descriptive statistics, box summaries, correlation and linear regression.

use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Confidence level of the regression band.
pub const REGRESSION_CONFIDENCE: f64 = 0.95;

/// Whisker reach in multiples of the interquartile range.
pub const WHISKER_IQR: f64 = 1.5;

/// Descriptive statistics for one column or group.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Five-number summary plus fliers, as drawn by a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Pearson correlation matrix over named columns.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared entries.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.size() + col]
    }

    /// Cells strictly below the diagonal, as `(row, col, r)`.
    pub fn lower_triangle(&self) -> Vec<(usize, usize, f64)> {
        let n = self.size();
        (0..n)
            .flat_map(|row| (0..row).map(move |col| (row, col)))
            .map(|(row, col)| (row, col, self.get(row, col)))
            .collect()
    }
}

/// Ordinary least squares fit of y on x.
#[derive(Debug, Clone)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    n: usize,
    mean_x: f64,
    sxx: f64,
    residual_se: f64,
    t_crit: f64,
}

impl RegressionFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Confidence interval of the fitted mean at `x`.
    pub fn confidence_interval(&self, x: f64) -> (f64, f64) {
        let y = self.predict(x);
        if !self.t_crit.is_finite() || self.sxx == 0.0 {
            return (y, y);
        }
        let half = self.t_crit
            * self.residual_se
            * (1.0 / self.n as f64 + (x - self.mean_x).powi(2) / self.sxx).sqrt();
        (y - half, y + half)
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::default();
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        DescriptiveStats {
            count: n,
            mean,
            std: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Finite (min, max) of a slice, or `None` when it is empty.
    pub fn extent(values: &[f64]) -> Option<(f64, f64)> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Quartiles, 1.5 IQR whiskers clamped to the data, and the points beyond.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }
        let sorted = Self::sorted(values);

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < whisker_low || v > whisker_high)
            .collect();

        Some(BoxSummary {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Pearson correlation of two equal-length samples. NaN for zero variance.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return f64::NAN;
        }
        let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
        let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in xs[..n].iter().zip(&ys[..n]) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx == 0.0 || syy == 0.0 {
            return f64::NAN;
        }
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    }

    /// Correlation matrix over row-aligned columns (pairs computed in parallel).
    ///
    /// Each entry of `columns` holds one value per row; `None` marks a missing
    /// value, and a pair only uses rows where both values are present.
    pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
        let n = columns.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i..n).map(move |j| (i, j)))
            .collect();

        let computed: Vec<(usize, usize, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (xs, ys): (Vec<f64>, Vec<f64>) = columns[i]
                    .1
                    .iter()
                    .zip(&columns[j].1)
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();
                (i, j, Self::pearson(&xs, &ys))
            })
            .collect();

        let mut values = vec![f64::NAN; n * n];
        for (i, j, r) in computed {
            values[i * n + j] = r;
            values[j * n + i] = r;
        }

        CorrelationMatrix {
            columns: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        }
    }

    /// Least squares line with a Student-t confidence band for the mean.
    pub fn linear_regression(points: &[(f64, f64)]) -> Option<RegressionFit> {
        let n = points.len();
        if n < 2 {
            return None;
        }
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n as f64;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for &(x, y) in points {
            sxy += (x - mean_x) * (y - mean_y);
            sxx += (x - mean_x).powi(2);
            syy += (y - mean_y).powi(2);
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r = if syy == 0.0 {
            f64::NAN
        } else {
            sxy / (sxx * syy).sqrt()
        };

        let sse: f64 = points
            .iter()
            .map(|&(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();

        let (residual_se, t_crit) = if n > 2 {
            let dof = (n - 2) as f64;
            let t_crit = StudentsT::new(0.0, 1.0, dof)
                .map(|dist| dist.inverse_cdf(0.5 + REGRESSION_CONFIDENCE / 2.0))
                .unwrap_or(f64::NAN);
            ((sse / dof).sqrt(), t_crit)
        } else {
            (0.0, f64::NAN)
        };

        Some(RegressionFit {
            slope,
            intercept,
            r,
            n,
            mean_x,
            sxx,
            residual_se,
            t_crit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptive_stats_use_sample_std() {
        let stats = StatsCalculator::compute_descriptive_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);

        assert!(StatsCalculator::compute_descriptive_stats(&[]).mean.is_nan());
    }

    #[test]
    fn percentile_interpolates_like_numpy() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((StatsCalculator::percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((StatsCalculator::percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(StatsCalculator::percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn box_summary_separates_fliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let summary = StatsCalculator::box_summary(&values).unwrap();
        assert_eq!(summary.median, 5.0);
        assert_eq!(summary.q1, 3.0);
        assert_eq!(summary.q3, 7.0);
        assert_eq!(summary.whisker_low, 1.0);
        assert_eq!(summary.whisker_high, 8.0);
        assert_eq!(summary.outliers, vec![100.0]);

        assert!(StatsCalculator::box_summary(&[]).is_none());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let columns = vec![
            ("iron".to_string(), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            ("nickel".to_string(), vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0)]),
            ("sulfur".to_string(), vec![Some(4.0), None, Some(2.0), Some(1.0)]),
        ];
        let matrix = StatsCalculator::correlation_matrix(&columns);

        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert!((matrix.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-12);
        assert!(matrix.get(2, 0) < 0.0);

        let lower = matrix.lower_triangle();
        assert_eq!(lower.len(), 3);
        assert!(lower.iter().all(|(row, col, _)| row > col));
    }

    #[test]
    fn constant_column_has_undefined_correlation() {
        assert!(StatsCalculator::pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn regression_recovers_exact_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let fit = StatsCalculator::linear_regression(&points).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r - 1.0).abs() < 1e-12);

        let (lo, hi) = fit.confidence_interval(4.0);
        assert!((lo - 9.0).abs() < 1e-9 && (hi - 9.0).abs() < 1e-9);
    }

    #[test]
    fn regression_band_widens_away_from_mean() {
        let points = [(0.0, 0.1), (1.0, 0.9), (2.0, 2.2), (3.0, 2.8), (4.0, 4.1)];
        let fit = StatsCalculator::linear_regression(&points).unwrap();
        let (lo_mid, hi_mid) = fit.confidence_interval(2.0);
        let (lo_edge, hi_edge) = fit.confidence_interval(4.0);
        assert!(lo_mid < fit.predict(2.0) && fit.predict(2.0) < hi_mid);
        assert!(hi_edge - lo_edge > hi_mid - lo_mid);

        assert!(StatsCalculator::linear_regression(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }
}
