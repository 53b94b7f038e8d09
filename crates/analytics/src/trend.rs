//! Two-half trend classification.

use serde::{Deserialize, Serialize};

/// Percent change (strictly) beyond which a series counts as moving.
pub const TREND_THRESHOLD_PERCENT: f64 = 10.0;

/// Coarse direction of a numeric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    /// Fewer than two observations; no direction is guessed.
    InsufficientData,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient-data",
        }
    }
}

impl core::fmt::Display for Trend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend label plus the averages it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub percent_change: f64,
    pub first_average: f64,
    pub second_average: f64,
}

/// Compare the mean of the first half of `values` with the mean of the
/// second half (the middle element of an odd-length series belongs to the
/// second half).
pub fn analyze_trend(values: &[f64]) -> TrendAnalysis {
    let n = values.len();
    if n < 2 {
        return TrendAnalysis {
            trend: Trend::InsufficientData,
            percent_change: 0.0,
            first_average: 0.0,
            second_average: 0.0,
        };
    }

    let (first_half, second_half) = values.split_at(n / 2);
    let first_average = mean(first_half);
    let second_average = mean(second_half);

    let percent_change = if first_average > 0.0 {
        (second_average - first_average) / first_average * 100.0
    } else {
        0.0
    };

    let trend = if percent_change > TREND_THRESHOLD_PERCENT {
        Trend::Increasing
    } else if percent_change < -TREND_THRESHOLD_PERCENT {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    TrendAnalysis {
        trend,
        percent_change,
        first_average,
        second_average,
    }
}

pub fn classify_trend(values: &[f64]) -> Trend {
    analyze_trend(values).trend
}

pub(crate) fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}
