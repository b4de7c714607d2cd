//! Seasonal ARIMA models with AIC-driven order selection
//!
//! The seasonal and non-seasonal AR/MA polynomials are expanded into a
//! single lag polynomial, so the conditional-least-squares recursion is
//! shared in shape with the non-seasonal estimator.

use crate::error::{ForecastError, Result};
use crate::models::{walk_forward, ForecastEvaluation};
use crate::optimize::minimize;
use crate::utils::{difference, integrate, seasonal_difference, seasonal_integrate};
use log::{debug, warn};
use std::fmt;

const COEFF_BOUND: f64 = 0.99;
const MAX_ITERS: usize = 1000;
const TOLERANCE: f64 = 1e-8;

/// SARIMA order specification: (p,d,q) x (P,D,Q) at a seasonal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarimaOrder {
    /// Non-seasonal (p, d, q)
    pub order: (usize, usize, usize),
    /// Seasonal (P, D, Q)
    pub seasonal: (usize, usize, usize),
    /// Seasonal period
    pub period: usize,
}

impl SarimaOrder {
    /// Create a new order specification.
    pub fn new(
        order: (usize, usize, usize),
        seasonal: (usize, usize, usize),
        period: usize,
    ) -> Self {
        Self {
            order,
            seasonal,
            period,
        }
    }

    /// Estimated parameter count (AR + MA + seasonal AR + seasonal MA +
    /// intercept).
    pub fn num_params(&self) -> usize {
        self.order.0 + self.order.2 + self.seasonal.0 + self.seasonal.2 + 1
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})({},{},{})[{}]",
            self.order.0,
            self.order.1,
            self.order.2,
            self.seasonal.0,
            self.seasonal.1,
            self.seasonal.2,
            self.period
        )
    }
}

/// A fitted SARIMA model.
#[derive(Debug, Clone)]
pub struct SarimaModel {
    spec: SarimaOrder,
    intercept: f64,
    /// Expanded AR lag polynomial, index 0 holds the unit coefficient.
    ar_poly: Vec<f64>,
    /// Expanded MA lag polynomial, index 0 holds the unit coefficient.
    ma_poly: Vec<f64>,
    original: Vec<f64>,
    after_d: Vec<f64>,
    w: Vec<f64>,
    residuals: Vec<f64>,
    aic: f64,
}

impl SarimaModel {
    /// Fit a SARIMA model by conditional least squares on the doubly
    /// differenced series.
    pub fn fit(values: &[f64], spec: SarimaOrder) -> Result<Self> {
        let (p, d, q) = spec.order;
        let (cap_p, cap_d, cap_q) = spec.seasonal;
        let s = spec.period;

        if (cap_p > 0 || cap_d > 0 || cap_q > 0) && s < 2 {
            return Err(ForecastError::ValidationError(format!(
                "Seasonal terms require a period of at least 2, got {}",
                s
            )));
        }

        let max_lag = (p + cap_p * s).max(q + cap_q * s);
        let min_len = d + cap_d * s + max_lag + 3;
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let after_d = difference(values, d);
        let w = seasonal_difference(&after_d, cap_d, s);
        if w.len() <= max_lag + 2 {
            return Err(ForecastError::InsufficientData {
                needed: max_lag + 3,
                got: w.len(),
            });
        }

        let (intercept, coeffs) = estimate(&w, p, q, cap_p, cap_q, s)?;
        let ar_poly = ar_polynomial(&coeffs.ar, &coeffs.sar, s);
        let ma_poly = ma_polynomial(&coeffs.ma, &coeffs.sma, s);

        let (residuals, sigma_sq) = residuals_and_variance(&w, &ar_poly, &ma_poly, intercept)?;

        let start = (ar_poly.len() - 1).max(ma_poly.len() - 1);
        let n_eff = (w.len() - start) as f64;
        let k = spec.num_params() as f64;
        let ll = -0.5 * n_eff * (1.0 + sigma_sq.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * ll + 2.0 * k;
        if !aic.is_finite() {
            return Err(ForecastError::FitError(format!(
                "{} produced a non-finite AIC",
                spec
            )));
        }

        Ok(Self {
            spec,
            intercept,
            ar_poly,
            ma_poly,
            original: values.to_vec(),
            after_d,
            w,
            residuals,
            aic,
        })
    }

    /// The fitted order.
    pub fn spec(&self) -> SarimaOrder {
        self.spec
    }

    /// Akaike Information Criterion of the fit.
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Forecast `horizon` steps ahead on the original scale.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }

        let mut extended = self.w.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let pred = predict_one(
                &extended,
                &shocks,
                t,
                &self.ar_poly,
                &self.ma_poly,
                self.intercept,
            );
            extended.push(pred);
            shocks.push(0.0);
        }

        let forecast_w = extended[self.w.len()..].to_vec();
        let d = self.spec.order.1;
        let cap_d = self.spec.seasonal.1;

        let undone_seasonal = if cap_d > 0 {
            seasonal_integrate(&forecast_w, &self.after_d, cap_d, self.spec.period)
        } else {
            forecast_w
        };

        if d > 0 {
            integrate(&undone_seasonal, &self.original, d)
        } else {
            undone_seasonal
        }
    }
}

struct SarimaCoefficients {
    ar: Vec<f64>,
    sar: Vec<f64>,
    ma: Vec<f64>,
    sma: Vec<f64>,
}

/// Expand (1 - ar(B)) * (1 - sar(B^s)) into one polynomial over lags.
fn ar_polynomial(ar: &[f64], sar: &[f64], period: usize) -> Vec<f64> {
    let base: Vec<f64> = std::iter::once(1.0).chain(ar.iter().map(|c| -c)).collect();
    let mut seasonal = vec![0.0; sar.len() * period + 1];
    seasonal[0] = 1.0;
    for (j, &c) in sar.iter().enumerate() {
        seasonal[(j + 1) * period] = -c;
    }
    convolve(&base, &seasonal)
}

/// Expand (1 + ma(B)) * (1 + sma(B^s)) into one polynomial over lags.
fn ma_polynomial(ma: &[f64], sma: &[f64], period: usize) -> Vec<f64> {
    let base: Vec<f64> = std::iter::once(1.0).chain(ma.iter().copied()).collect();
    let mut seasonal = vec![0.0; sma.len() * period + 1];
    seasonal[0] = 1.0;
    for (j, &c) in sma.iter().enumerate() {
        seasonal[(j + 1) * period] = c;
    }
    convolve(&base, &seasonal)
}

fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// One-step prediction at position `t` from the expanded polynomials.
fn predict_one(
    w: &[f64],
    shocks: &[f64],
    t: usize,
    ar_poly: &[f64],
    ma_poly: &[f64],
    intercept: f64,
) -> f64 {
    let mut pred = intercept;
    for (k, &coeff) in ar_poly.iter().enumerate().skip(1) {
        if t >= k {
            pred += -coeff * (w[t - k] - intercept);
        }
    }
    for (k, &coeff) in ma_poly.iter().enumerate().skip(1) {
        if t >= k {
            pred += coeff * shocks[t - k];
        }
    }
    pred
}

/// Conditional sum of squares of the expanded recursion.
fn css(w: &[f64], ar_poly: &[f64], ma_poly: &[f64], intercept: f64) -> f64 {
    let n = w.len();
    let start = (ar_poly.len() - 1).max(ma_poly.len() - 1);
    if n <= start {
        return f64::MAX;
    }

    let mut shocks = vec![0.0; n];
    let mut total = 0.0;
    for t in start..n {
        let pred = predict_one(w, &shocks, t, ar_poly, ma_poly, intercept);
        let error = w[t] - pred;
        shocks[t] = error;
        total += error * error;
    }

    total
}

fn estimate(
    w: &[f64],
    p: usize,
    q: usize,
    cap_p: usize,
    cap_q: usize,
    period: usize,
) -> Result<(f64, SarimaCoefficients)> {
    let mean = w.iter().sum::<f64>() / w.len() as f64;
    if !mean.is_finite() {
        return Err(ForecastError::FitError(
            "Differenced series mean is not finite".to_string(),
        ));
    }

    let n_coeffs = p + cap_p + q + cap_q;
    if n_coeffs == 0 {
        return Ok((
            mean,
            SarimaCoefficients {
                ar: vec![],
                sar: vec![],
                ma: vec![],
                sma: vec![],
            },
        ));
    }

    let mut initial = vec![mean];
    let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
    for _ in 0..n_coeffs {
        initial.push(0.1);
        bounds.push((-COEFF_BOUND, COEFF_BOUND));
    }

    let unpack = |params: &[f64]| -> SarimaCoefficients {
        let ar = params[1..1 + p].to_vec();
        let sar = params[1 + p..1 + p + cap_p].to_vec();
        let ma = params[1 + p + cap_p..1 + p + cap_p + q].to_vec();
        let sma = params[1 + p + cap_p + q..].to_vec();
        SarimaCoefficients { ar, sar, ma, sma }
    };

    let result = minimize(
        |params| {
            let coeffs = unpack(params);
            let ar_poly = ar_polynomial(&coeffs.ar, &coeffs.sar, period);
            let ma_poly = ma_polynomial(&coeffs.ma, &coeffs.sma, period);
            css(w, &ar_poly, &ma_poly, params[0])
        },
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

    Ok((result.point[0], unpack(&result.point)))
}

fn residuals_and_variance(
    w: &[f64],
    ar_poly: &[f64],
    ma_poly: &[f64],
    intercept: f64,
) -> Result<(Vec<f64>, f64)> {
    let n = w.len();
    let start = (ar_poly.len() - 1).max(ma_poly.len() - 1);

    let mut shocks = vec![0.0; n];
    for t in start..n {
        let pred = predict_one(w, &shocks, t, ar_poly, ma_poly, intercept);
        shocks[t] = w[t] - pred;
    }

    let tail = &shocks[start..];
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

    Ok((shocks, variance))
}

/// Exhaustive AIC grid search over p,d,q,P,D,Q in {0,1} at the fixed
/// seasonal period. Failed candidates are skipped; ties keep the first
/// order visited; None means no candidate converged.
pub fn find_best_sarima_params(train: &[f64], period: usize) -> Option<SarimaOrder> {
    if period < 2 {
        warn!("SARIMA search requires a seasonal period of at least 2");
        return None;
    }

    let mut best: Option<(SarimaOrder, f64)> = None;

    for p in 0..=1 {
        for d in 0..=1 {
            for q in 0..=1 {
                for cap_p in 0..=1 {
                    for cap_d in 0..=1 {
                        for cap_q in 0..=1 {
                            let spec =
                                SarimaOrder::new((p, d, q), (cap_p, cap_d, cap_q), period);
                            match SarimaModel::fit(train, spec) {
                                Ok(model) => {
                                    let aic = model.aic();
                                    let improved = match best {
                                        Some((_, best_aic)) => aic < best_aic,
                                        None => true,
                                    };
                                    if improved {
                                        best = Some((spec, aic));
                                    }
                                }
                                Err(err) => {
                                    debug!("Skipping {}: {}", spec, err);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    best.map(|(spec, _)| spec)
}

/// Walk-forward evaluation: refit the chosen order from scratch at every
/// held-out step and forecast one step ahead.
pub fn evaluate_sarima(
    values: &[f64],
    spec: SarimaOrder,
    train_fraction: f64,
) -> Result<ForecastEvaluation> {
    walk_forward(values, train_fraction, |history| {
        let model = SarimaModel::fit(history, spec)?;
        Ok(model.forecast(1)[0])
    })
}
