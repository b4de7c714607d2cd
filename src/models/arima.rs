//! ARIMA models with AIC-driven order selection

use crate::error::{ForecastError, Result};
use crate::models::{walk_forward, ForecastEvaluation};
use crate::optimize::minimize;
use crate::utils::{difference, integrate};
use log::debug;
use std::fmt;

/// Coefficient bounds keeping the AR/MA polynomials away from the unit
/// circle.
const COEFF_BOUND: f64 = 0.99;
const MAX_ITERS: usize = 1000;
const TOLERANCE: f64 = 1e-8;

/// ARIMA order specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new order specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Estimated parameter count (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Search bounds for the order grid.
#[derive(Debug, Clone, Copy)]
pub struct ArimaSearchBounds {
    /// Largest AR order to try
    pub max_p: usize,
    /// Largest differencing order to try
    pub max_d: usize,
    /// Largest MA order to try
    pub max_q: usize,
}

impl Default for ArimaSearchBounds {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
        }
    }
}

/// A fitted ARIMA model.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    original: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    aic: f64,
}

impl ArimaModel {
    /// Fit an ARIMA model by conditional least squares.
    pub fn fit(values: &[f64], order: ArimaOrder) -> Result<Self> {
        let min_len = order.d + order.p.max(order.q) + 2;
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let differenced = difference(values, order.d);
        let (intercept, ar, ma) = estimate(&differenced, order.p, order.q)?;

        let (residuals, sigma_sq) =
            residuals_and_variance(&differenced, order.p, order.q, &ar, &ma, intercept)?;

        let start = order.p.max(order.q);
        let n_eff = (differenced.len() - start) as f64;
        let k = order.num_params() as f64;
        let ll = -0.5 * n_eff * (1.0 + sigma_sq.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * ll + 2.0 * k;
        if !aic.is_finite() {
            return Err(ForecastError::FitError(format!(
                "{} produced a non-finite AIC",
                order
            )));
        }

        Ok(Self {
            order,
            intercept,
            ar,
            ma,
            original: values.to_vec(),
            differenced,
            residuals,
            aic,
        })
    }

    /// The fitted order.
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Akaike Information Criterion of the fit.
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Fitted AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// Fitted MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Forecast `horizon` steps ahead on the original scale.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }

        let p = self.order.p;
        let q = self.order.q;

        let mut extended = self.differenced.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for i in 0..p {
                if t > i {
                    pred += self.ar[i] * (extended[t - 1 - i] - self.intercept);
                }
            }
            for i in 0..q {
                if t > i {
                    pred += self.ma[i] * shocks[t - 1 - i];
                }
            }
            extended.push(pred);
            shocks.push(0.0);
        }

        let forecast_diff = extended[self.differenced.len()..].to_vec();
        if self.order.d > 0 {
            integrate(&forecast_diff, &self.original, self.order.d)
        } else {
            forecast_diff
        }
    }
}

/// Conditional sum of squares of an ARMA recursion on the differenced
/// scale.
fn css(values: &[f64], p: usize, q: usize, ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
    let n = values.len();
    let start = p.max(q);
    if n <= start {
        return f64::MAX;
    }

    let mut residuals = vec![0.0; n];
    let mut total = 0.0;
    for t in start..n {
        let mut pred = intercept;
        for i in 0..p {
            pred += ar[i] * (values[t - 1 - i] - intercept);
        }
        for i in 0..q {
            pred += ma[i] * residuals[t - 1 - i];
        }
        let error = values[t] - pred;
        residuals[t] = error;
        total += error * error;
    }

    total
}

/// Estimate intercept and AR/MA coefficients by minimizing the CSS.
fn estimate(values: &[f64], p: usize, q: usize) -> Result<(f64, Vec<f64>, Vec<f64>)> {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if !mean.is_finite() {
        return Err(ForecastError::FitError(
            "Differenced series mean is not finite".to_string(),
        ));
    }

    if p == 0 && q == 0 {
        return Ok((mean, vec![], vec![]));
    }

    let mut initial = vec![mean];
    let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
    for i in 0..p {
        initial.push(0.1 / (i + 1) as f64);
        bounds.push((-COEFF_BOUND, COEFF_BOUND));
    }
    for i in 0..q {
        initial.push(0.1 / (i + 1) as f64);
        bounds.push((-COEFF_BOUND, COEFF_BOUND));
    }

    let result = minimize(
        |params| css(values, p, q, &params[1..1 + p], &params[1 + p..], params[0]),
        &initial,
        &bounds,
        MAX_ITERS,
        TOLERANCE,
    );

    if !result.value.is_finite() {
        return Err(ForecastError::FitError(
            "Conditional least squares failed to produce a finite objective".to_string(),
        ));
    }

    let intercept = result.point[0];
    let ar = result.point[1..1 + p].to_vec();
    let ma = result.point[1 + p..].to_vec();
    Ok((intercept, ar, ma))
}

/// In-sample residuals and their variance. A degenerate (zero or
/// non-finite) variance is a fit failure.
fn residuals_and_variance(
    values: &[f64],
    p: usize,
    q: usize,
    ar: &[f64],
    ma: &[f64],
    intercept: f64,
) -> Result<(Vec<f64>, f64)> {
    let n = values.len();
    let start = p.max(q);

    let mut residuals = vec![0.0; n];
    for t in start..n {
        let mut pred = intercept;
        for i in 0..p {
            pred += ar[i] * (values[t - 1 - i] - intercept);
        }
        for i in 0..q {
            pred += ma[i] * residuals[t - 1 - i];
        }
        residuals[t] = values[t] - pred;
    }

    let tail = &residuals[start..];
    if tail.is_empty() {
        return Err(ForecastError::FitError(
            "No residuals available to estimate variance".to_string(),
        ));
    }
    let variance = tail.iter().map(|r| r * r).sum::<f64>() / tail.len() as f64;
    if variance <= 0.0 || !variance.is_finite() {
        return Err(ForecastError::FitError(
            "Residual variance is not positive".to_string(),
        ));
    }

    Ok((residuals, variance))
}

/// Exhaustive AIC grid search over (p, d, q).
///
/// Each candidate fit is a value (order plus AIC, or a failure reason);
/// failures are skipped and the minimum-AIC success wins, with ties going
/// to the first order visited. Returns None when no candidate converges.
pub fn find_best_arima_params(train: &[f64], bounds: &ArimaSearchBounds) -> Option<ArimaOrder> {
    let mut best: Option<(ArimaOrder, f64)> = None;

    for p in 0..=bounds.max_p {
        for d in 0..=bounds.max_d {
            for q in 0..=bounds.max_q {
                let order = ArimaOrder::new(p, d, q);
                match ArimaModel::fit(train, order) {
                    Ok(model) => {
                        let aic = model.aic();
                        let improved = match best {
                            Some((_, best_aic)) => aic < best_aic,
                            None => true,
                        };
                        if improved {
                            best = Some((order, aic));
                        }
                    }
                    Err(err) => {
                        debug!("Skipping {}: {}", order, err);
                    }
                }
            }
        }
    }

    best.map(|(order, _)| order)
}

/// Walk-forward evaluation: refit the chosen order from scratch at every
/// held-out step and forecast one step ahead.
pub fn evaluate_arima(
    values: &[f64],
    order: ArimaOrder,
    train_fraction: f64,
) -> Result<ForecastEvaluation> {
    walk_forward(values, train_fraction, |history| {
        let model = ArimaModel::fit(history, order)?;
        Ok(model.forecast(1)[0])
    })
}
