//! Anchors and dense quantile curves
//!
//! Sparse (day offset, quantile vector) control points and the dense
//! rank-by-day matrix they are interpolated into.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, ProjectionResult};

/// A sparse control point: projected quantile prices at one day offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Calendar days after the valuation date
    pub day_offset: u32,
    /// One price per quantile rank, non-decreasing
    pub quantile_values: Vec<f64>,
}

impl Anchor {
    pub fn new(day_offset: u32, quantile_values: Vec<f64>) -> Self {
        Self {
            day_offset,
            quantile_values,
        }
    }

    /// Anchor with every quantile at the same price
    pub fn flat(day_offset: u32, price: f64, n_quantiles: usize) -> Self {
        Self::new(day_offset, vec![price; n_quantiles])
    }
}

/// Anchors with strictly increasing day offsets, starting at day 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSet {
    n_quantiles: usize,
    anchors: Vec<Anchor>,
}

impl AnchorSet {
    /// Start a set with the day-0 anchor at `price` across all quantiles
    pub fn starting_at(price: f64, n_quantiles: usize) -> Self {
        Self {
            n_quantiles,
            anchors: vec![Anchor::flat(0, price, n_quantiles)],
        }
    }

    /// Build from arbitrary anchors, checking ordering and shape
    pub fn from_anchors(anchors: Vec<Anchor>) -> ProjectionResult<Self> {
        let first = anchors
            .first()
            .ok_or_else(|| ProjectionError::invalid_anchors("anchor set is empty"))?;
        if first.day_offset != 0 {
            return Err(ProjectionError::invalid_anchors(format!(
                "first anchor must sit at day 0, got day {}",
                first.day_offset
            )));
        }

        let mut set = Self {
            n_quantiles: first.quantile_values.len(),
            anchors: Vec::with_capacity(anchors.len()),
        };
        for anchor in anchors {
            set.push(anchor)?;
        }
        Ok(set)
    }

    /// Append an anchor after the current last one
    pub fn push(&mut self, anchor: Anchor) -> ProjectionResult<()> {
        if anchor.quantile_values.len() != self.n_quantiles {
            return Err(ProjectionError::invalid_anchors(format!(
                "anchor at day {} has {} values, expected {}",
                anchor.day_offset,
                anchor.quantile_values.len(),
                self.n_quantiles
            )));
        }
        if let Some(last) = self.anchors.last() {
            if anchor.day_offset <= last.day_offset {
                return Err(ProjectionError::invalid_anchors(format!(
                    "day offsets must be strictly increasing, {} follows {}",
                    anchor.day_offset, last.day_offset
                )));
            }
        }
        self.anchors.push(anchor);
        Ok(())
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn n_quantiles(&self) -> usize {
        self.n_quantiles
    }

    /// Day offsets as spline knots
    pub fn offsets(&self) -> Vec<f64> {
        self.anchors.iter().map(|a| a.day_offset as f64).collect()
    }

    pub fn last_offset(&self) -> u32 {
        self.anchors.last().map(|a| a.day_offset).unwrap_or(0)
    }

    pub fn contains_offset(&self, day_offset: u32) -> bool {
        self.anchors.iter().any(|a| a.day_offset == day_offset)
    }

    /// Values of one quantile rank across all anchors (a transposed row)
    pub fn rank_series(&self, rank: usize) -> Vec<f64> {
        self.anchors
            .iter()
            .map(|a| a.quantile_values[rank])
            .collect()
    }
}

/// Dense quantile curves: `values[[rank, day]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileCurveFamily {
    values: Array2<f64>,
}

impl QuantileCurveFamily {
    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Build from one dense row per quantile rank
    pub fn from_rows(rows: Vec<Vec<f64>>) -> ProjectionResult<Self> {
        let n_ranks = rows.len();
        let n_days = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != n_days) {
            return Err(ProjectionError::invalid_input(format!(
                "curve rank {} has {} days, expected {}",
                bad,
                rows[bad].len(),
                n_days
            )));
        }

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n_ranks, n_days), flat)
            .map_err(|e| ProjectionError::invalid_input(e.to_string()))?;
        Ok(Self { values })
    }

    /// Every rank constant at `price`
    pub fn flat(price: f64, n_ranks: usize, n_days: usize) -> Self {
        Self {
            values: Array2::from_elem((n_ranks, n_days), price),
        }
    }

    pub fn n_ranks(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_days(&self) -> usize {
        self.values.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn value(&self, rank: usize, day: usize) -> f64 {
        self.values[[rank, day]]
    }

    /// Dense curve of one quantile rank
    pub fn rank(&self, rank: usize) -> ArrayView1<'_, f64> {
        self.values.row(rank)
    }

    /// All quantile prices on one day
    pub fn day(&self, day: usize) -> ArrayView1<'_, f64> {
        self.values.column(day)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Verify no two adjacent ranks cross on any day.
    ///
    /// `tolerance` absorbs floating-point noise; anything larger, or any
    /// non-finite value, is reported as a numerical anomaly.
    pub fn check_non_crossing(&self, tolerance: f64) -> ProjectionResult<()> {
        for day in 0..self.n_days() {
            for rank in 0..self.n_ranks() {
                let v = self.values[[rank, day]];
                if !v.is_finite() {
                    return Err(ProjectionError::NumericalAnomaly {
                        rank,
                        day,
                        lower: v,
                        upper: v,
                    });
                }
                if rank + 1 < self.n_ranks() {
                    let upper = self.values[[rank + 1, day]];
                    if v > upper + tolerance {
                        return Err(ProjectionError::NumericalAnomaly {
                            rank,
                            day,
                            lower: v,
                            upper,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
