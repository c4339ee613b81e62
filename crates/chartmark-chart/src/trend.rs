//! Trend-line regression
//!
//! Ordinary least squares over a window of a series' own (index, value)
//! pairs. The window end walks back over trailing zero-runs when the
//! ignore policy says so; the fitted line is then evaluated at **every**
//! x-index of the full series, not just the window, and rounded to four
//! decimal places.

use serde::Serialize;

/// How many points feed the regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendScope {
    /// Every point up to the window end
    All,
    /// Only the last N points before the window end
    Last(usize),
}

impl TrendScope {
    /// Parse the external form: `all` or a point count
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        trimmed.parse::<usize>().ok().filter(|n| *n > 0).map(Self::Last)
    }
}

/// Which trailing points are excluded from the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendIgnore {
    /// Use the series as-is
    None,
    /// Walk back over a trailing run of zero values
    #[default]
    ZeroesAtEnd,
    /// Walk back over trailing zeroes, then drop one more point
    ZeroesAtEndAndLastValue,
}

impl TrendIgnore {
    /// Parse the external form
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "zeroes-at-end" => Some(Self::ZeroesAtEnd),
            "zeroes-at-end-and-last-value" => Some(Self::ZeroesAtEndAndLastValue),
            _ => None,
        }
    }
}

/// Trend-line parameters for one series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendSpec {
    /// Regression window size
    pub scope: TrendScope,
    /// Trailing-point exclusion policy
    pub ignore: TrendIgnore,
}

impl Default for TrendSpec {
    fn default() -> Self {
        Self {
            scope: TrendScope::All,
            ignore: TrendIgnore::ZeroesAtEnd,
        }
    }
}

/// Fit a trend line to a series and evaluate it at every x-index
///
/// Returns an empty vector when the selected window has one point or
/// fewer; a regression over nothing is not a trend.
#[must_use]
pub fn trend_values(values: &[f64], spec: &TrendSpec) -> Vec<f64> {
    let Some(window) = select_window(values, spec) else {
        return Vec::new();
    };
    let (start, end) = window;

    let points: Vec<(f64, f64)> = (start..=end).map(|i| (i as f64, values[i])).collect();
    let (slope, intercept) = fit(&points);

    (0..values.len())
        .map(|i| round4(slope * i as f64 + intercept))
        .collect()
}

/// Select the regression window `(start, end)` inclusive
fn select_window(values: &[f64], spec: &TrendSpec) -> Option<(usize, usize)> {
    if values.is_empty() {
        return None;
    }
    let mut end = values.len() as i64 - 1;

    match spec.ignore {
        TrendIgnore::None => {}
        TrendIgnore::ZeroesAtEnd => {
            while end >= 0 && values[end as usize] == 0.0 {
                end -= 1;
            }
        }
        TrendIgnore::ZeroesAtEndAndLastValue => {
            while end >= 0 && values[end as usize] == 0.0 {
                end -= 1;
            }
            end -= 1;
        }
    }

    let start = match spec.scope {
        TrendScope::All => 0,
        TrendScope::Last(n) => (end - n as i64 + 1).max(0),
    };

    // a window of one point or fewer cannot regress
    if end - start + 1 <= 1 {
        return None;
    }
    Some((start as usize, end as usize))
}

/// Ordinary least squares over (x, y) points
fn fit(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let covariance: f64 = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();

    let slope = if variance == 0.0 { 0.0 } else { covariance / variance };
    let intercept = mean_y - slope * mean_x;
    (slope, intercept)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(scope: TrendScope, ignore: TrendIgnore) -> TrendSpec {
        TrendSpec { scope, ignore }
    }

    #[test]
    fn linear_input_reproduces_itself() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let trend = trend_values(&values, &spec(TrendScope::All, TrendIgnore::None));
        assert_eq!(trend, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn trailing_zeroes_are_excluded_from_the_fit() {
        // without the zero tail the fit is exactly y = x + 1
        let values = [1.0, 2.0, 3.0, 0.0, 0.0];
        let trend = trend_values(&values, &spec(TrendScope::All, TrendIgnore::ZeroesAtEnd));
        assert_eq!(trend, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn last_value_exclusion_drops_one_more_point() {
        let values = [1.0, 2.0, 3.0, 7.0, 0.0];
        let trend = trend_values(
            &values,
            &spec(TrendScope::All, TrendIgnore::ZeroesAtEndAndLastValue),
        );
        // fit over [1, 2, 3] only
        assert_eq!(trend, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn numeric_scope_limits_window() {
        // last 3 points [3, 5, 7] fit y = 2x - 1
        let values = [10.0, 0.0, 3.0, 5.0, 7.0];
        let trend = trend_values(&values, &spec(TrendScope::Last(3), TrendIgnore::None));
        assert_eq!(trend, vec![-1.0, 1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn scope_larger_than_series_is_floored_at_zero() {
        let values = [1.0, 2.0];
        let trend = trend_values(&values, &spec(TrendScope::Last(10), TrendIgnore::None));
        assert_eq!(trend, vec![1.0, 2.0]);
    }

    #[test]
    fn single_point_window_is_empty_trend() {
        let values = [5.0];
        assert!(trend_values(&values, &spec(TrendScope::All, TrendIgnore::None)).is_empty());

        let values = [5.0, 0.0, 0.0];
        assert!(trend_values(&values, &spec(TrendScope::All, TrendIgnore::ZeroesAtEnd)).is_empty());
    }

    #[test]
    fn all_zero_series_is_empty_trend() {
        let values = [0.0, 0.0, 0.0];
        assert!(trend_values(&values, &spec(TrendScope::All, TrendIgnore::ZeroesAtEnd)).is_empty());
    }

    #[test]
    fn empty_series_is_empty_trend() {
        assert!(trend_values(&[], &TrendSpec::default()).is_empty());
    }

    #[test]
    fn values_round_to_four_decimals() {
        let values = [1.0, 2.0, 2.0];
        let trend = trend_values(&values, &spec(TrendScope::All, TrendIgnore::None));
        // fit: slope 0.5, intercept 7/6 -> 1.1667 after rounding
        assert_eq!(trend, vec![1.1667, 1.6667, 2.1667]);
    }

    #[test]
    fn scope_parse() {
        assert_eq!(TrendScope::parse("ALL"), Some(TrendScope::All));
        assert_eq!(TrendScope::parse("7"), Some(TrendScope::Last(7)));
        assert_eq!(TrendScope::parse("0"), None);
        assert_eq!(TrendScope::parse("several"), None);
    }

    #[test]
    fn ignore_parse() {
        assert_eq!(TrendIgnore::parse("none"), Some(TrendIgnore::None));
        assert_eq!(
            TrendIgnore::parse("zeroes-at-end"),
            Some(TrendIgnore::ZeroesAtEnd)
        );
        assert_eq!(
            TrendIgnore::parse("Zeroes-At-End-And-Last-Value"),
            Some(TrendIgnore::ZeroesAtEndAndLastValue)
        );
        assert_eq!(TrendIgnore::parse("sometimes"), None);
    }
}
