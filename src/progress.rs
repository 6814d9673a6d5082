//! Demo progress dashboard. "Achieved" values are a random mock, never stored.

use crate::planner::{self, Target};
use rand::Rng;
use serde::Serialize;
use std::path::Path;

pub const NO_TARGETS_MESSAGE: &str = "No target data found. Please add targets in Tab 2.";
pub const MISSING_FILE_MESSAGE: &str = "Target file not found. Add some entries first.";
pub const ACHIEVED_COLUMN: &str = "Target Achieved";
pub const PERCENT_COLUMN: &str = "% Achieved";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulated {
    pub achieved: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(flatten)]
    pub target: Target,
    pub achieved: i64,
    pub percent_achieved: f64,
}

/// One progress bar as the dashboard draws it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub heading: String,
    pub fill: u8,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressView {
    Missing,
    Empty,
    Ready(Vec<ProgressRecord>),
}

/// Inclusive bounds of the mock draw: `[max(0, q - 2), q + 3]`.
pub fn achieved_bounds(quantity: i64) -> (i64, i64) {
    let lower = quantity.saturating_sub(2).max(0);
    let upper = quantity.saturating_add(3).max(lower);
    (lower, upper)
}

/// Percent of target reached, one decimal with halves rounded to even.
/// A zero target divides by 1.
pub fn percent_achieved(achieved: i64, quantity: i64) -> f64 {
    let divisor = if quantity == 0 { 1 } else { quantity };
    let pct = achieved as f64 / divisor as f64 * 100.0;
    (pct * 10.0).round_ties_even() / 10.0
}

pub fn simulate<R: Rng>(target: &Target, rng: &mut R) -> Simulated {
    let (lower, upper) = achieved_bounds(target.quantity);
    let achieved = rng.random_range(lower..=upper);
    Simulated {
        achieved,
        percent: percent_achieved(achieved, target.quantity),
    }
}

/// Bar fill in whole percent; the numeric percentage itself is not clamped.
pub fn bar_fill(percent: f64) -> u8 {
    percent.trunc().clamp(0.0, 100.0) as u8
}

pub fn render(target: &Target, achieved: i64, percent: f64) -> Indicator {
    Indicator {
        heading: format!(
            "{} – {} | {}",
            target.school, target.department, target.field
        ),
        fill: bar_fill(percent),
        caption: format!("{} / {}", achieved, target.quantity),
    }
}

/// Full listing: the stored columns plus the two simulated ones.
pub fn listing(records: &[ProgressRecord]) -> (Vec<&'static str>, Vec<serde_json::Value>) {
    let mut columns = planner::TARGET_COLUMNS.to_vec();
    columns.push(ACHIEVED_COLUMN);
    columns.push(PERCENT_COLUMN);
    let rows = records
        .iter()
        .map(|r| {
            serde_json::json!([
                r.target.school,
                r.target.department,
                r.target.field,
                r.target.quantity,
                r.achieved,
                r.percent_achieved,
            ])
        })
        .collect();
    (columns, rows)
}

/// Re-reads the target table and draws fresh mock values for every row.
pub fn view<R: Rng>(targets_path: &Path, rng: &mut R) -> anyhow::Result<ProgressView> {
    let Some(targets) = planner::load_targets(targets_path)? else {
        return Ok(ProgressView::Missing);
    };
    if targets.is_empty() {
        return Ok(ProgressView::Empty);
    }
    let records = targets
        .into_iter()
        .map(|target| {
            let sim = simulate(&target, &mut *rng);
            ProgressRecord {
                target,
                achieved: sim.achieved,
                percent_achieved: sim.percent,
            }
        })
        .collect();
    Ok(ProgressView::Ready(records))
}
