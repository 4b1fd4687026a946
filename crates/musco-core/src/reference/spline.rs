//! Interpolating splines
//!
//! Natural cubic splines through (time, value) samples. Outside the sampled
//! time range the spline holds the end values.

use std::ops::Index;

use super::table::TimeSeriesTable;
use crate::error::ReferenceError;

/// Scalar function of time built from samples
pub trait Interpolant {
    fn value(&self, t: f64) -> f64;
}

/// Natural cubic spline (zero second derivative at both ends)
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    times: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at each knot
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through the samples; times must be strictly increasing
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, ReferenceError> {
        if times.is_empty() {
            return Err(ReferenceError::EmptySeries(String::new()));
        }
        if times.len() != values.len() {
            return Err(ReferenceError::ColumnLength {
                label: String::new(),
                expected: times.len(),
                got: values.len(),
            });
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(ReferenceError::NonFiniteTime {
                index,
                time: times[index],
            });
        }
        for (index, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(ReferenceError::NonIncreasingTime {
                    index: index + 1,
                    previous: pair[0],
                    time: pair[1],
                });
            }
        }

        let second_derivatives = natural_second_derivatives(&times, &values);
        Ok(Self {
            times,
            values,
            second_derivatives,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Index of the knot interval containing `t` (already clamped)
    fn segment(&self, t: f64) -> usize {
        let last = self.times.len() - 2;
        self.times.partition_point(|&x| x <= t).saturating_sub(1).min(last)
    }
}

/// Solve the tridiagonal system for the interior second derivatives
/// (Thomas algorithm); the end values are zero.
fn natural_second_derivatives(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = times.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let interior = n - 2;
    let mut c_prime = vec![0.0; interior];
    let mut d_prime = vec![0.0; interior];

    for k in 0..interior {
        let i = k + 1;
        let a = h[i - 1];
        let b = 2.0 * (h[i - 1] + h[i]);
        let c = h[i];
        let d = 6.0 * ((values[i + 1] - values[i]) / h[i] - (values[i] - values[i - 1]) / h[i - 1]);

        if k == 0 {
            c_prime[k] = c / b;
            d_prime[k] = d / b;
        } else {
            let denom = b - a * c_prime[k - 1];
            c_prime[k] = c / denom;
            d_prime[k] = (d - a * d_prime[k - 1]) / denom;
        }
    }

    m[interior] = d_prime[interior - 1];
    for k in (0..interior - 1).rev() {
        m[k + 1] = d_prime[k] - c_prime[k] * m[k + 2];
    }
    m
}

impl Interpolant for CubicSpline {
    fn value(&self, t: f64) -> f64 {
        let n = self.times.len();
        if n == 1 {
            return self.values[0];
        }

        let t = t.clamp(self.times[0], self.times[n - 1]);
        let i = self.segment(t);

        let h = self.times[i + 1] - self.times[i];
        let a = (self.times[i + 1] - t) / h;
        let b = (t - self.times[i]) / h;
        let m0 = self.second_derivatives[i];
        let m1 = self.second_derivatives[i + 1];

        a * self.values[i]
            + b * self.values[i + 1]
            + ((a * a * a - a) * m0 + (b * b * b - b) * m1) * h * h / 6.0
    }
}

/// One spline per column of a scalar table, in column order
#[derive(Debug, Clone, Default)]
pub struct SplineSet {
    labels: Vec<String>,
    splines: Vec<CubicSpline>,
}

impl SplineSet {
    pub fn from_table(table: &TimeSeriesTable) -> Result<Self, ReferenceError> {
        let mut set = Self::default();
        for (label, column) in table.columns() {
            let spline = CubicSpline::new(table.times().to_vec(), column.to_vec())
                .map_err(|e| match e {
                    ReferenceError::EmptySeries(_) => ReferenceError::EmptySeries(label.to_string()),
                    other => other,
                })?;
            set.labels.push(label.to_string());
            set.splines.push(spline);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.splines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn get(&self, label: &str) -> Option<&CubicSpline> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| &self.splines[i])
    }
}

impl Index<usize> for SplineSet {
    type Output = CubicSpline;

    fn index(&self, index: usize) -> &CubicSpline {
        &self.splines[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolates_samples() {
        let times = vec![0.0, 0.3, 0.7, 1.0, 1.6];
        let values = vec![1.0, -2.0, 0.5, 4.0, 3.0];
        let spline = CubicSpline::new(times.clone(), values.clone()).unwrap();
        for (t, v) in times.iter().zip(&values) {
            assert_relative_eq!(spline.value(*t), *v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_reproduces_linear_data() {
        let times = vec![0.0, 0.5, 1.5, 2.0];
        let values: Vec<f64> = times.iter().map(|t| 3.0 * t - 1.0).collect();
        let spline = CubicSpline::new(times, values).unwrap();
        assert_relative_eq!(spline.value(1.2), 2.6, epsilon = 1e-12);
        assert_relative_eq!(spline.value(0.25), -0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_natural_end_conditions() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).unwrap();
        // Symmetric data: the curve peaks at the middle knot
        assert!(spline.value(0.9) < 1.0);
        assert_relative_eq!(spline.value(0.5), spline.value(1.5), epsilon = 1e-12);
        assert_eq!(spline.second_derivatives[0], 0.0);
        assert_eq!(spline.second_derivatives[2], 0.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        let spline = CubicSpline::new(vec![0.0, 1.0], vec![2.0, 4.0]).unwrap();
        assert_eq!(spline.value(-5.0), 2.0);
        assert_eq!(spline.value(7.0), 4.0);
        assert_relative_eq!(spline.value(0.25), 2.5);
    }

    #[test]
    fn test_single_sample_is_constant() {
        let spline = CubicSpline::new(vec![0.2], vec![-1.5]).unwrap();
        assert_eq!(spline.value(100.0), -1.5);
    }

    #[test]
    fn test_rejects_non_increasing_time() {
        let err = CubicSpline::new(vec![0.0, 1.0, 1.0], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, ReferenceError::NonIncreasingTime { index: 2, .. }));
        assert!(CubicSpline::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_rejects_non_finite_time() {
        let err = CubicSpline::new(vec![f64::NAN, 1.0], vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, ReferenceError::NonFiniteTime { index: 0, .. }));
        let err = CubicSpline::new(vec![0.0, f64::INFINITY], vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, ReferenceError::NonFiniteTime { index: 1, .. }));
        // A single NaN sample has no pair to compare against
        assert!(CubicSpline::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_spline_set_from_table() {
        let mut table = TimeSeriesTable::new(vec![0.0, 1.0, 2.0]);
        table.append_column("a", vec![0.0, 1.0, 2.0]).unwrap();
        table.append_column("b", vec![5.0, 5.0, 5.0]).unwrap();

        let set = SplineSet::from_table(&table).unwrap();
        assert_eq!(set.len(), 2);
        assert_relative_eq!(set[0].value(1.5), 1.5, epsilon = 1e-12);
        assert_relative_eq!(set.get("b").unwrap().value(0.3), 5.0, epsilon = 1e-12);
    }
}
