//! Revenue forecasting by compounded average period-over-period growth.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::series::TimeSeries;
use crate::trend::mean;

/// Growth rate assumed when history yields no usable growth observations.
pub const DEFAULT_GROWTH_RATE: f64 = 0.05;

/// Forecast horizons in months: next month, quarter, half-year, year.
pub const FORECAST_HORIZONS: [u32; 4] = [1, 3, 6, 12];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Fitted compound-growth model over a revenue history.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthModel {
    pub last_revenue: f64,
    pub average_growth: f64,
    /// Growth observations (pairs with a positive previous value).
    pub growth_rates: Vec<f64>,
}

impl GrowthModel {
    /// Fit a model; `None` when fewer than two observations exist.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let last_revenue = *values.last()?;
        if values.len() < 2 {
            return None;
        }

        let growth_rates: Vec<f64> = values
            .windows(2)
            .filter(|w| w[0] > 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();

        let average_growth = if growth_rates.is_empty() {
            DEFAULT_GROWTH_RATE
        } else {
            mean(&growth_rates)
        };

        Some(Self {
            last_revenue,
            average_growth,
            growth_rates,
        })
    }

    /// `last_revenue × (1 + average_growth)^months_ahead`.
    pub fn project(&self, months_ahead: u32) -> f64 {
        self.last_revenue * (1.0 + self.average_growth).powi(months_ahead as i32)
    }
}

/// Projection for `months_ahead` months; `0.0` when history is too short.
pub fn project_revenue(values: &[f64], months_ahead: u32) -> f64 {
    GrowthModel::fit(values).map_or(0.0, |m| m.project(months_ahead))
}

/// Growth between one period and the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthFactor {
    pub period: String,
    pub growth_percent: f64,
}

/// Average revenue of one calendar month across the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalTrend {
    pub month: String,
    pub average_revenue: f64,
    /// Month average relative to the overall average (1.0 = typical month).
    pub seasonal_index: f64,
}

/// Revenue forecast report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueForecast {
    pub next_month: f64,
    pub next_quarter: f64,
    pub next_six_months: f64,
    pub next_year: f64,
    pub average_growth_rate: f64,
    pub growth_factors: Vec<GrowthFactor>,
    pub seasonal_trends: Vec<SeasonalTrend>,
}

/// Forecast from a chronological monthly revenue series.
pub fn forecast_revenue(series: &TimeSeries) -> RevenueForecast {
    let values = series.values();
    let model = GrowthModel::fit(&values);
    let projection = |months: u32| model.as_ref().map_or(0.0, |m| m.project(months));
    let [month, quarter, half_year, year] = FORECAST_HORIZONS;

    RevenueForecast {
        next_month: projection(month),
        next_quarter: projection(quarter),
        next_six_months: projection(half_year),
        next_year: projection(year),
        average_growth_rate: model.as_ref().map_or(0.0, |m| m.average_growth),
        growth_factors: growth_factors(series),
        seasonal_trends: seasonal_trends(series),
    }
}

fn growth_factors(series: &TimeSeries) -> Vec<GrowthFactor> {
    series
        .points()
        .windows(2)
        .filter(|w| w[0].value > 0.0)
        .map(|w| GrowthFactor {
            period: w[1].period.to_string(),
            growth_percent: (w[1].value - w[0].value) / w[0].value * 100.0,
        })
        .collect()
}

fn seasonal_trends(series: &TimeSeries) -> Vec<SeasonalTrend> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for point in series.points() {
        if let Some(month) = point.period.month_of_year() {
            by_month.entry(month).or_default().push(point.value);
        }
    }
    if by_month.is_empty() {
        return Vec::new();
    }

    let overall = mean(&series.values());
    by_month
        .into_iter()
        .map(|(month, values)| {
            let average_revenue = mean(&values);
            SeasonalTrend {
                month: MONTH_NAMES[(month as usize).saturating_sub(1).min(11)].to_string(),
                average_revenue,
                seasonal_index: if overall > 0.0 { average_revenue / overall } else { 0.0 },
            }
        })
        .collect()
}
