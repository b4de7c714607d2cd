//! Augmented Dickey-Fuller stationarity test
//!
//! Tests the null hypothesis that a series has a unit root
//! (non-stationary); a small p-value rejects the null and the series is
//! treated as stationary. The preprocessing pipeline differences the
//! series whenever the p-value is 0.05 or larger.

/// Significance level used by the preprocessing pipeline.
pub const ADF_SIGNIFICANCE: f64 = 0.05;

/// Result of an Augmented Dickey-Fuller test.
#[derive(Debug, Clone)]
pub struct AdfResult {
    /// Regression t-statistic for the lagged level term.
    pub statistic: f64,
    /// Approximate p-value (MacKinnon-style interpolation).
    pub p_value: f64,
    /// Number of augmentation lags selected by AIC.
    pub lags: usize,
    /// Whether the series is treated as stationary at the 5% level.
    pub is_stationary: bool,
}

/// Run the ADF test with AIC-based lag selection.
///
/// Series shorter than four observations produce a NaN statistic and are
/// reported as non-stationary.
pub fn adf_test(series: &[f64]) -> AdfResult {
    let n = series.len();
    if n < 4 {
        return AdfResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            is_stationary: false,
        };
    }

    // Schwert-style default cap: (n-1)^(1/3), kept inside the sample.
    let max_lags = ((n - 1) as f64)
        .powf(1.0 / 3.0)
        .floor() as usize;
    let max_lags = max_lags.clamp(1, n / 2 - 1);

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let level = &series[..n - 1];

    let lags = select_lags(&diff, level, max_lags);

    let (beta, se) = level_regression(&diff, level, lags);
    if se == 0.0 || !se.is_finite() {
        return AdfResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: false,
        };
    }

    let statistic = beta / se;
    let p_value = approximate_p_value(statistic);

    AdfResult {
        statistic,
        p_value,
        lags,
        is_stationary: p_value < ADF_SIGNIFICANCE,
    }
}

/// Pick the augmentation lag order minimizing AIC of the test regression.
fn select_lags(diff: &[f64], level: &[f64], max_lags: usize) -> usize {
    let mut best_lag = 1;
    let mut best_aic = f64::INFINITY;

    for lag in 1..=max_lags {
        let n = diff.len();
        if n <= lag + 2 {
            continue;
        }
        let rss = regression_rss(diff, level, lag);
        if !rss.is_finite() || rss <= 0.0 {
            continue;
        }
        let effective_n = (n - lag) as f64;
        let k = (lag + 2) as f64;
        let aic = effective_n * (rss / effective_n).ln() + 2.0 * k;
        if aic < best_aic {
            best_aic = aic;
            best_lag = lag;
        }
    }

    best_lag
}

/// Residual sum of squares of the regression of the differenced series on
/// the lagged level, skipping the first `lag` observations.
fn regression_rss(diff: &[f64], level: &[f64], lag: usize) -> f64 {
    match ols(diff, level, lag) {
        Some((alpha, beta)) => {
            let n = diff.len();
            (lag..n)
                .map(|i| {
                    let residual = diff[i] - alpha - beta * level[i];
                    residual * residual
                })
                .sum()
        }
        None => f64::INFINITY,
    }
}

/// Coefficient on the lagged level and its standard error.
fn level_regression(diff: &[f64], level: &[f64], lag: usize) -> (f64, f64) {
    let n = diff.len();
    if n <= lag + 2 || level.len() < n {
        return (f64::NAN, f64::NAN);
    }

    let effective_n = n - lag;
    let y_mean: f64 = diff[lag..].iter().sum::<f64>() / effective_n as f64;
    let x_mean: f64 = level[lag..n].iter().sum::<f64>() / effective_n as f64;

    let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
    for i in lag..n {
        let x = level[i] - x_mean;
        let y = diff[i] - y_mean;
        xx += x * x;
        xy += x * y;
        yy += y * y;
    }

    if xx == 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let beta = xy / xx;
    let rss = yy - beta * xy;
    let sigma_sq = rss / (effective_n.saturating_sub(2)) as f64;
    if sigma_sq <= 0.0 || !sigma_sq.is_finite() {
        return (f64::NAN, f64::NAN);
    }

    (beta, (sigma_sq / xx).sqrt())
}

/// Simple OLS of diff on level over observations `lag..`.
fn ols(diff: &[f64], level: &[f64], lag: usize) -> Option<(f64, f64)> {
    let n = diff.len();
    if n <= lag + 1 || level.len() < n {
        return None;
    }

    let effective_n = (n - lag) as f64;
    let y_mean: f64 = diff[lag..].iter().sum::<f64>() / effective_n;
    let x_mean: f64 = level[lag..n].iter().sum::<f64>() / effective_n;

    let (mut xx, mut xy) = (0.0, 0.0);
    for i in lag..n {
        let x = level[i] - x_mean;
        xx += x * x;
        xy += x * (diff[i] - y_mean);
    }

    if xx == 0.0 {
        return None;
    }

    let beta = xy / xx;
    Some((y_mean - beta * x_mean, beta))
}

/// MacKinnon-style knot table for the constant-only test distribution,
/// interpolated linearly between knots.
const P_VALUE_KNOTS: [(f64, f64); 9] = [
    (-4.00, 0.005),
    (-3.43, 0.010),
    (-2.86, 0.050),
    (-2.57, 0.100),
    (-1.94, 0.200),
    (-1.62, 0.300),
    (-1.28, 0.400),
    (-0.84, 0.500),
    (0.00, 0.700),
];

fn approximate_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic <= P_VALUE_KNOTS[0].0 {
        return 0.001;
    }
    let last = P_VALUE_KNOTS[P_VALUE_KNOTS.len() - 1];
    if statistic >= last.0 {
        return (last.1 + 0.25 * (1.0 - (-statistic).exp())).min(0.99);
    }

    for pair in P_VALUE_KNOTS.windows(2) {
        let (t0, p0) = pair[0];
        let (t1, p1) = pair[1];
        if statistic <= t1 {
            let frac = (statistic - t0) / (t1 - t0);
            return p0 + frac * (p1 - p0);
        }
    }

    last.1
}
