//! Model blending
//!
//! Picks the implied-volatility or trend family, or combines them. In
//! aggregate mode the implied-volatility spread around the current price
//! is moved onto the trend's point-estimate curve:
//!
//! out[r][d] = trend_center[d] + (iv[r][d] − current_price)

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::trend::TrendPath;
use crate::core::{ForecastMode, ProjectionError, ProjectionResult, QuantileCurveFamily};

/// Reason the blended output is not what the mode asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum Degradation {
    /// No usable option expirations; the implied-volatility path is flat
    FlatFallback,
    /// Aggregate mode ran without a trend and returned the implied-volatility path
    TrendUnavailable(String),
}

/// Blender output: the family plus any degradation it carries
#[derive(Debug, Clone)]
pub struct Blended {
    pub family: QuantileCurveFamily,
    pub degradation: Option<Degradation>,
}

/// Inputs to one blend
#[derive(Debug, Clone, Copy)]
pub struct BlendInputs<'a> {
    pub mode: ForecastMode,
    pub iv: Option<&'a QuantileCurveFamily>,
    /// Trend path, or the reason it could not be built
    pub trend: Result<&'a TrendPath, &'a str>,
    pub current_price: f64,
    /// Allowed floating-point overlap in the crossing check
    pub crossing_tolerance: f64,
}

/// Combine the model families for `inputs.mode`.
///
/// The output is always checked for crossing curves; a violation is
/// returned as [`ProjectionError::NumericalAnomaly`] rather than repaired.
pub fn blend(inputs: BlendInputs<'_>) -> ProjectionResult<Blended> {
    let blended = match inputs.mode {
        ForecastMode::ImpliedVolatility => Blended {
            family: require_iv(inputs.iv)?.clone(),
            degradation: None,
        },
        ForecastMode::TrendExtrapolation => match inputs.trend {
            Ok(trend) => Blended {
                family: trend.family.clone(),
                degradation: None,
            },
            Err(reason) => {
                return Err(ProjectionError::model_unavailable(format!(
                    "trend path required: {}",
                    reason
                )))
            }
        },
        ForecastMode::Aggregate => {
            let iv = require_iv(inputs.iv)?;
            match inputs.trend {
                Ok(trend) => Blended {
                    family: recenter(iv, trend.center.view(), inputs.current_price)?,
                    degradation: None,
                },
                Err(reason) => {
                    tracing::warn!(
                        "Aggregate mode without trend ({}), returning implied-volatility fan",
                        reason
                    );
                    Blended {
                        family: iv.clone(),
                        degradation: Some(Degradation::TrendUnavailable(reason.to_string())),
                    }
                }
            }
        }
    };

    blended.family.check_non_crossing(inputs.crossing_tolerance)?;
    Ok(blended)
}

fn require_iv(iv: Option<&QuantileCurveFamily>) -> ProjectionResult<&QuantileCurveFamily> {
    iv.ok_or_else(|| ProjectionError::model_unavailable("implied-volatility path required"))
}

/// Move the implied-volatility spread onto a central curve.
///
/// `center` must cover the same days as `iv`. On any day where it equals
/// `current_price` the output equals `iv` exactly.
pub fn recenter(
    iv: &QuantileCurveFamily,
    center: ArrayView1<'_, f64>,
    current_price: f64,
) -> ProjectionResult<QuantileCurveFamily> {
    if center.len() != iv.n_days() {
        return Err(ProjectionError::invalid_input(format!(
            "center covers {} days, implied-volatility family {}",
            center.len(),
            iv.n_days()
        )));
    }

    let spread = iv.values() - current_price;
    let values = &spread + &center;
    Ok(QuantileCurveFamily::from_array(values))
}
