//! Quantile levels used across one projection

use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, ProjectionResult};

/// Tolerance for the symmetry check around the median
const SYMMETRY_TOL: f64 = 1e-9;

/// Ordered probability levels in (0, 1), symmetric around 0.5
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct QuantileSet {
    levels: Vec<f64>,
}

impl QuantileSet {
    /// Validate and wrap a list of levels.
    ///
    /// Levels must lie strictly inside (0, 1), be strictly increasing,
    /// mirror each other around 0.5 and either contain or bracket 0.5.
    pub fn new(levels: Vec<f64>) -> ProjectionResult<Self> {
        if levels.is_empty() {
            return Err(ProjectionError::invalid_input("quantile set is empty"));
        }
        for &q in &levels {
            if !(q > 0.0 && q < 1.0) {
                return Err(ProjectionError::invalid_input(format!(
                    "quantile levels must lie in (0, 1), got {}",
                    q
                )));
            }
        }
        for (i, w) in levels.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(ProjectionError::invalid_input(format!(
                    "quantile levels must be strictly increasing, but levels[{}]={} >= levels[{}]={}",
                    i,
                    w[0],
                    i + 1,
                    w[1]
                )));
            }
        }

        let n = levels.len();
        for i in 0..n / 2 {
            let (lo, hi) = (levels[i], levels[n - 1 - i]);
            if (lo + hi - 1.0).abs() > SYMMETRY_TOL {
                return Err(ProjectionError::invalid_input(format!(
                    "quantile levels must be symmetric around 0.5, {} pairs with {}",
                    lo, hi
                )));
            }
        }
        // A single level must be the median itself
        if n % 2 == 1 && (levels[n / 2] - 0.5).abs() > SYMMETRY_TOL {
            return Err(ProjectionError::invalid_input(format!(
                "middle quantile level must be 0.5, got {}",
                levels[n / 2]
            )));
        }

        Ok(Self { levels })
    }

    /// `count` evenly spaced levels from `lower` to `upper` inclusive
    pub fn linspace(lower: f64, upper: f64, count: usize) -> ProjectionResult<Self> {
        if count == 0 {
            return Err(ProjectionError::invalid_input("quantile count must be positive"));
        }
        if count == 1 {
            return Self::new(vec![lower]);
        }
        let step = (upper - lower) / (count - 1) as f64;
        let levels = (0..count)
            .map(|i| {
                if i == count - 1 {
                    upper
                } else {
                    lower + step * i as f64
                }
            })
            .collect();
        Self::new(levels)
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Ranks bracketing the median: the same rank twice for odd-sized
    /// sets, the two innermost ranks for even-sized ones
    pub fn middle_ranks(&self) -> (usize, usize) {
        let n = self.levels.len();
        if n % 2 == 1 {
            (n / 2, n / 2)
        } else {
            (n / 2 - 1, n / 2)
        }
    }

    /// Standard-normal quantile z(q) for every level; the median maps to exactly 0
    pub fn z_scores(&self) -> Vec<f64> {
        self.levels
            .iter()
            .map(|&q| {
                if (q - 0.5).abs() <= SYMMETRY_TOL {
                    0.0
                } else {
                    crate::models::norm_ppf(q)
                }
            })
            .collect()
    }

    /// Rank pairs (lower, upper) forming nested bands, widest first
    pub fn band_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.levels.len();
        (0..n / 2).map(|i| (i, n - 1 - i)).collect()
    }
}

impl Default for QuantileSet {
    /// 19 levels from 0.05 to 0.95
    fn default() -> Self {
        Self {
            levels: (1..=19).map(|i| i as f64 * 0.05).collect(),
        }
    }
}

impl TryFrom<Vec<f64>> for QuantileSet {
    type Error = ProjectionError;

    fn try_from(levels: Vec<f64>) -> ProjectionResult<Self> {
        Self::new(levels)
    }
}

impl From<QuantileSet> for Vec<f64> {
    fn from(set: QuantileSet) -> Self {
        set.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_set() {
        let set = QuantileSet::default();
        assert_eq!(set.len(), 19);
        assert_eq!(set.middle_ranks(), (9, 9));
        assert_abs_diff_eq!(set.levels()[0], 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(set.levels()[9], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(set.levels()[18], 0.95, epsilon = 1e-12);
    }

    #[test]
    fn test_linspace_matches_default() {
        let set = QuantileSet::linspace(0.05, 0.95, 19).unwrap();
        for (a, b) in set.levels().iter().zip(QuantileSet::default().levels()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_even_set_brackets_median() {
        let set = QuantileSet::new(vec![0.1, 0.4, 0.6, 0.9]).unwrap();
        assert_eq!(set.middle_ranks(), (1, 2));
        assert_eq!(set.band_pairs(), vec![(0, 3), (1, 2)]);
    }

    #[test]
    fn test_rejects_bad_levels() {
        assert!(QuantileSet::new(vec![]).is_err());
        assert!(QuantileSet::new(vec![0.0, 0.5, 1.0]).is_err());
        assert!(QuantileSet::new(vec![0.5, 0.4]).is_err());
        assert!(QuantileSet::new(vec![0.1, 0.5, 0.8]).is_err());
        assert!(QuantileSet::new(vec![0.4]).is_err());
        assert!(QuantileSet::new(vec![0.5]).is_ok());
    }

    #[test]
    fn test_z_scores_symmetric() {
        let set = QuantileSet::new(vec![0.05, 0.5, 0.95]).unwrap();
        let z = set.z_scores();
        assert_abs_diff_eq!(z[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z[0], -z[2], epsilon = 1e-9);
        assert_abs_diff_eq!(z[2], 1.6448536, epsilon = 1e-6);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let set: QuantileSet = serde_json::from_str("[0.25, 0.5, 0.75]").unwrap();
        assert_eq!(set.len(), 3);
        assert!(serde_json::from_str::<QuantileSet>("[0.75, 0.5]").is_err());
    }
}
