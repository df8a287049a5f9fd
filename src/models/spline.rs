//! Natural cubic spline interpolation of anchors
//!
//! Each quantile rank is interpolated independently through its anchor
//! values with a natural cubic spline (S''(x₀) = S''(xₙ₋₁) = 0).
//!
//! # Algorithm
//!
//! The tridiagonal system for the second-derivative coefficients is solved
//! with the Thomas algorithm in O(n). Evaluation uses binary search plus
//! Horner form. Queries beyond the knot range continue the nearest end
//! polynomial. Knots are reproduced exactly: a query on a knot returns the
//! stored value without any arithmetic.

use serde::{Deserialize, Serialize};

use crate::core::{AnchorSet, ProjectionError, ProjectionResult, QuantileCurveFamily};

/// Coefficients for one cubic polynomial interval.
///
/// On \[xᵢ, xᵢ₊₁\]: `S(x) = a + b·(x - xᵢ) + c·(x - xᵢ)² + d·(x - xᵢ)³`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SplineCoeff {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

/// Natural cubic spline through (x, y) knots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalCubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    coeffs: Vec<SplineCoeff>,
}

impl NaturalCubicSpline {
    /// Fit a spline through strictly increasing knots.
    ///
    /// # Errors
    /// [`ProjectionError::InvalidAnchors`] when fewer than 2 knots are
    /// given, lengths differ, knots are not strictly increasing, or any
    /// input is non-finite.
    pub fn new(knots: Vec<f64>, values: Vec<f64>) -> ProjectionResult<Self> {
        if knots.len() != values.len() {
            return Err(ProjectionError::invalid_anchors(format!(
                "knots and values must have the same length, got {} and {}",
                knots.len(),
                values.len()
            )));
        }
        if knots.len() < 2 {
            return Err(ProjectionError::invalid_anchors(format!(
                "spline requires at least 2 anchors, got {}",
                knots.len()
            )));
        }
        if let Some(bad) = knots.iter().chain(values.iter()).find(|v| !v.is_finite()) {
            return Err(ProjectionError::invalid_anchors(format!(
                "anchor inputs must be finite, got {}",
                bad
            )));
        }
        for (i, w) in knots.windows(2).enumerate() {
            if w[1] <= w[0] {
                return Err(ProjectionError::invalid_anchors(format!(
                    "day offsets must be strictly increasing, but x[{}]={} >= x[{}]={}",
                    i,
                    w[0],
                    i + 1,
                    w[1]
                )));
            }
        }

        let coeffs = build_spline_coefficients(&knots, &values);
        Ok(Self {
            knots,
            values,
            coeffs,
        })
    }

    /// Interval index and offset from its left knot
    fn locate(&self, x: f64) -> (usize, f64) {
        let n = self.knots.len();
        let i = if x < self.knots[0] {
            0
        } else if x >= self.knots[n - 1] {
            n - 2
        } else {
            self.knots.partition_point(|&k| k <= x) - 1
        };
        (i, x - self.knots[i])
    }

    /// Evaluate S(x)
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.knots.len();
        if x == self.knots[n - 1] {
            return self.values[n - 1];
        }
        let (i, dx) = self.locate(x);
        let c = &self.coeffs[i];
        c.a + dx * (c.b + dx * (c.c + dx * c.d))
    }

    /// Evaluate S at every point of `xs`
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    /// First derivative S'(x)
    pub fn derivative(&self, x: f64) -> f64 {
        let (i, dx) = self.locate(x);
        let c = &self.coeffs[i];
        c.b + dx * (2.0 * c.c + 3.0 * dx * c.d)
    }

    /// Second derivative S''(x)
    pub fn second_derivative(&self, x: f64) -> f64 {
        let (i, dx) = self.locate(x);
        let c = &self.coeffs[i];
        2.0 * c.c + 6.0 * c.d * dx
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }
}

/// Solve the natural cubic spline tridiagonal system and return
/// per-interval coefficients.
fn build_spline_coefficients(x: &[f64], y: &[f64]) -> Vec<SplineCoeff> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // c[0] = c[n-1] = 0 (natural boundary); interior unknowns c[1..n-1]
    let mut c = vec![0.0; n];

    if n > 2 {
        let m = n - 2;
        let mut diag = vec![0.0; m];
        let mut rhs = vec![0.0; m];

        for j in 0..m {
            let i = j + 1;
            diag[j] = 2.0 * (h[i - 1] + h[i]);
            rhs[j] = 3.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }

        // Forward sweep
        for j in 1..m {
            let w = h[j] / diag[j - 1];
            diag[j] -= w * h[j];
            rhs[j] -= w * rhs[j - 1];
        }

        // Back substitution
        c[m] = rhs[m - 1] / diag[m - 1];
        for j in (0..m - 1).rev() {
            let i = j + 1;
            c[i] = (rhs[j] - h[j + 1] * c[i + 1]) / diag[j];
        }
    }

    (0..n - 1)
        .map(|i| SplineCoeff {
            a: y[i],
            b: (y[i + 1] - y[i]) / h[i] - h[i] * (2.0 * c[i] + c[i + 1]) / 3.0,
            c: c[i],
            d: (c[i + 1] - c[i]) / (3.0 * h[i]),
        })
        .collect()
}

/// Fit one spline per quantile rank through an anchor set
pub fn fit_rank_splines(anchors: &AnchorSet) -> ProjectionResult<Vec<NaturalCubicSpline>> {
    let knots = anchors.offsets();
    (0..anchors.n_quantiles())
        .map(|rank| NaturalCubicSpline::new(knots.clone(), anchors.rank_series(rank)))
        .collect()
}

/// Interpolate an anchor set onto integer target days.
///
/// Row `r` of the result is the spline of quantile rank `r` evaluated at
/// each of `target_days`.
pub fn interpolate_anchors(
    anchors: &AnchorSet,
    target_days: &[u32],
) -> ProjectionResult<QuantileCurveFamily> {
    let splines = fit_rank_splines(anchors)?;
    let xs: Vec<f64> = target_days.iter().map(|&d| d as f64).collect();
    let rows = splines.iter().map(|s| s.eval_many(&xs)).collect();
    QuantileCurveFamily::from_rows(rows)
}
