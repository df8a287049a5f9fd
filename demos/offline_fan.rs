//! Example: Project a fan from synthetic market data
//!
//! Run with: cargo run --example offline_fan
//!
//! Builds a snapshot and an implied-volatility term structure by hand,
//! then runs every forecast mode side by side.

use chrono::{Duration, NaiveDate};
use quantile_fan::prelude::*;

fn main() -> ProjectionResult<()> {
    let valuation = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

    // A year of closes drifting up with a weekly wobble
    let closes: Vec<PriceBar> = (0..365)
        .map(|i| {
            let date = valuation - Duration::days(364 - i);
            let wobble = 3.0 * ((i as f64) * std::f64::consts::TAU / 7.0).sin();
            PriceBar::new(date, 420.0 + 0.15 * i as f64 + wobble)
        })
        .collect();
    let snapshot = MarketSnapshot::from_closes(closes)?;

    // Upward-sloping IV term structure, weekly then monthly expirations
    let expirations: Vec<OptionExpirationQuote> = [
        (7, 0.21),
        (14, 0.205),
        (21, 0.20),
        (35, 0.195),
        (63, 0.19),
        (91, 0.188),
        (182, 0.185),
    ]
    .iter()
    .map(|&(days, iv)| OptionExpirationQuote::new(valuation + Duration::days(days), Some(iv)))
    .collect();

    println!("=== Quantile Fan Projection ===\n");
    println!("Spot:      ${:.2}", snapshot.current_price);
    println!("Valuation: {}", snapshot.valuation_date);
    println!("Closes:    {}\n", snapshot.historical_closes.len());

    let projector = FanProjector::new();
    let forecaster = LinearTrendForecaster::new();
    let horizon = 60;

    for mode in ForecastMode::ALL {
        let request = ProjectionRequest::new(snapshot.clone(), horizon, mode)
            .with_expirations(expirations.clone());
        let grid = projector.project_with_forecaster(&request, &forecaster)?;

        println!("--- {} ---", mode);
        if let Some(scan) = &grid.anchor_scan {
            println!("  Anchors at days {:?}", scan.anchors.offsets());
        }
        let bands = grid.bands();
        let (lo, hi) = &bands[0];
        for d in [0, 15, 30, 45, 60] {
            println!(
                "  Day {:>2}: [{:>7.2}, {:>7.2}]  median {:>7.2}",
                d,
                lo[d],
                hi[d],
                grid.median()[d]
            );
        }
        let (min, max) = grid.price_range();
        println!("  Range over grid: {:.2} .. {:.2}\n", min, max);
    }

    Ok(())
}
