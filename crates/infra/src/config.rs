//! Analytics service configuration.
//!
//! Defaults are usable as-is; `from_env` overrides them from `BISTRO_*`
//! environment variables. A malformed value is logged and ignored.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use bistro_analytics::financial::DEFAULT_OVERHEAD_RATE;
use bistro_analytics::profitability::DEFAULT_TOP_K;

pub const ENV_FETCH_TIMEOUT_MS: &str = "BISTRO_FETCH_TIMEOUT_MS";
pub const ENV_RESTOCK_TOP_N: &str = "BISTRO_RESTOCK_TOP_N";
pub const ENV_PROFITABILITY_TOP_K: &str = "BISTRO_PROFITABILITY_TOP_K";
pub const ENV_OVERHEAD_RATE: &str = "BISTRO_OVERHEAD_RATE";
pub const ENV_FORECAST_HISTORY_MONTHS: &str = "BISTRO_FORECAST_HISTORY_MONTHS";
pub const ENV_PROFITABILITY_WINDOW_DAYS: &str = "BISTRO_PROFITABILITY_WINDOW_DAYS";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Bounded wait for every repository fetch.
    pub fetch_timeout: Duration,
    /// Cap on restock recommendations; `None` returns all.
    pub restock_top_n: Option<usize>,
    /// Size of the top and bottom performer lists.
    pub profitability_top_k: usize,
    /// Overhead as a share of monthly revenue.
    pub overhead_rate: f64,
    /// Complete months of revenue history fed to the forecaster.
    pub forecast_history_months: u32,
    /// Days of transactions ranked for menu profitability.
    pub profitability_window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            restock_top_n: None,
            profitability_top_k: DEFAULT_TOP_K,
            overhead_rate: DEFAULT_OVERHEAD_RATE,
            forecast_history_months: 12,
            profitability_window_days: 90,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let default_timeout_ms = defaults.fetch_timeout.as_millis() as u64;
        let fetch_timeout_ms = match parse_or(&lookup, ENV_FETCH_TIMEOUT_MS, default_timeout_ms) {
            0 => {
                warn!(key = ENV_FETCH_TIMEOUT_MS, "fetch timeout must be positive");
                default_timeout_ms
            }
            ms => ms,
        };

        let restock_top_n = match lookup(ENV_RESTOCK_TOP_N) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(key = ENV_RESTOCK_TOP_N, value = %raw, error = %e, "ignoring malformed config value");
                    defaults.restock_top_n
                }
            },
            None => defaults.restock_top_n,
        };

        let overhead_rate = parse_or(&lookup, ENV_OVERHEAD_RATE, defaults.overhead_rate);
        let overhead_rate = if overhead_rate.is_finite() && overhead_rate >= 0.0 {
            overhead_rate
        } else {
            warn!(key = ENV_OVERHEAD_RATE, value = overhead_rate, "overhead rate must be a non-negative number");
            defaults.overhead_rate
        };

        Self {
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            restock_top_n,
            profitability_top_k: parse_or(&lookup, ENV_PROFITABILITY_TOP_K, defaults.profitability_top_k),
            overhead_rate,
            forecast_history_months: parse_or(
                &lookup,
                ENV_FORECAST_HISTORY_MONTHS,
                defaults.forecast_history_months,
            ),
            profitability_window_days: parse_or(
                &lookup,
                ENV_PROFITABILITY_WINDOW_DAYS,
                defaults.profitability_window_days,
            ),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_restock_top_n(mut self, top_n: Option<usize>) -> Self {
        self.restock_top_n = top_n;
        self
    }

    pub fn with_profitability_top_k(mut self, k: usize) -> Self {
        self.profitability_top_k = k;
        self
    }

    pub fn with_overhead_rate(mut self, rate: f64) -> Self {
        self.overhead_rate = rate;
        self
    }

    pub fn with_forecast_history_months(mut self, months: u32) -> Self {
        self.forecast_history_months = months;
        self
    }

    pub fn with_profitability_window_days(mut self, days: i64) -> Self {
        self.profitability_window_days = days;
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring malformed config value");
            default
        }
    }
}
