//! Holt-Winters exponential smoothing with additive trend and seasonality

use crate::error::{ForecastError, Result};
use crate::models::ForecastEvaluation;
use crate::optimize::minimize;
use crate::utils::train_test_split;

const SMOOTHING_BOUND: (f64, f64) = (0.0001, 0.9999);
const MAX_ITERS: usize = 1000;
const TOLERANCE: f64 = 1e-8;

/// Triple exponential smoothing (additive trend, additive seasonality).
///
/// Update equations:
/// - Level: `l_t = alpha*(y_t - s_{t-m}) + (1-alpha)*(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = beta*(l_t - l_{t-1}) + (1-beta)*b_{t-1}`
/// - Seasonal: `s_t = gamma*(y_t - l_t) + (1-gamma)*s_{t-m}`
/// - Forecast: `y_{t+h} = l_t + h*b_t + s_{t+h-m}`
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    period: usize,
    optimize: bool,
    level: Option<f64>,
    trend: Option<f64>,
    seasonals: Option<Vec<f64>>,
    n: usize,
}

impl HoltWinters {
    /// Create a model with fixed smoothing parameters.
    pub fn new(alpha: f64, beta: f64, gamma: f64, period: usize) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ForecastError::ValidationError(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if period < 2 {
            return Err(ForecastError::ValidationError(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }

        Ok(Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            period,
            optimize: false,
            level: None,
            trend: None,
            seasonals: None,
            n: 0,
        })
    }

    /// Create a model that picks its smoothing parameters by minimizing
    /// the in-sample sum of squared errors.
    pub fn auto(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::ValidationError(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }
        Ok(Self {
            alpha: None,
            beta: None,
            gamma: None,
            period,
            optimize: true,
            level: None,
            trend: None,
            seasonals: None,
            n: 0,
        })
    }

    /// Level smoothing parameter, once fitted or fixed.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Trend smoothing parameter, once fitted or fixed.
    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Seasonal smoothing parameter, once fitted or fixed.
    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// The seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Initial level, trend, and normalized seasonal indices from the
    /// first season(s).
    fn initialize_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let first_season = &values[..period];
        let level = first_season.iter().sum::<f64>() / period as f64;

        let trend = if values.len() >= 2 * period {
            let sum: f64 = (0..period)
                .map(|i| (values[period + i] - values[i]) / period as f64)
                .sum();
            sum / period as f64
        } else {
            0.0
        };

        let mut seasonals: Vec<f64> = first_season.iter().map(|y| y - level).collect();
        let adjustment = seasonals.iter().sum::<f64>() / period as f64;
        for s in &mut seasonals {
            *s -= adjustment;
        }

        (level, trend, seasonals)
    }

    /// In-sample sum of squared one-step errors for given parameters.
    fn sse(values: &[f64], alpha: f64, beta: f64, gamma: f64, period: usize) -> f64 {
        let (mut level, mut trend, mut seasonals) = Self::initialize_state(values, period);

        let mut total = 0.0;
        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];

            let forecast = level + trend + s;
            let error = y - forecast;
            total += error * error;

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        total
    }

    /// Fit the model state to a series.
    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        if values.len() < 2 * self.period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * self.period,
                got: values.len(),
            });
        }

        self.n = values.len();

        if self.optimize {
            let bounds = [SMOOTHING_BOUND; 3];
            let result = minimize(
                |params| Self::sse(values, params[0], params[1], params[2], self.period),
                &[0.3, 0.1, 0.1],
                &bounds,
                MAX_ITERS,
                TOLERANCE,
            );
            self.alpha = Some(result.point[0].clamp(SMOOTHING_BOUND.0, SMOOTHING_BOUND.1));
            self.beta = Some(result.point[1].clamp(SMOOTHING_BOUND.0, SMOOTHING_BOUND.1));
            self.gamma = Some(result.point[2].clamp(SMOOTHING_BOUND.0, SMOOTHING_BOUND.1));
        }

        let alpha = self.alpha.unwrap();
        let beta = self.beta.unwrap();
        let gamma = self.gamma.unwrap();

        let (mut level, mut trend, mut seasonals) =
            Self::initialize_state(values, self.period);

        for (t, &y) in values.iter().enumerate().skip(self.period) {
            let idx = t % self.period;
            let s = seasonals[idx];

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        self.level = Some(level);
        self.trend = Some(trend);
        self.seasonals = Some(seasonals);

        Ok(())
    }

    /// Forecast `horizon` steps ahead from the fitted state.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let level = self.level.ok_or_else(|| {
            ForecastError::FitError("Model has not been fitted to data".to_string())
        })?;
        let trend = self.trend.unwrap();
        let seasonals = self.seasonals.as_ref().unwrap();

        Ok((1..=horizon)
            .map(|h| {
                let idx = (self.n + h - 1) % self.period;
                level + h as f64 * trend + seasonals[idx]
            })
            .collect())
    }
}

/// Evaluate Holt-Winters on the held-out horizon.
///
/// Deliberately NOT walk-forward: the model is fitted once on the training
/// slice and produces a single multi-step forecast of the full horizon.
pub fn evaluate_exponential_smoothing(
    values: &[f64],
    period: usize,
    train_fraction: f64,
) -> Result<ForecastEvaluation> {
    let (train, test) = train_test_split(values, train_fraction);
    if test.is_empty() {
        return Err(ForecastError::InsufficientData {
            needed: values.len() + 1,
            got: values.len(),
        });
    }

    let mut model = HoltWinters::auto(period)?;
    model.fit(&train)?;
    let predictions = model.forecast(test.len())?;

    Ok(ForecastEvaluation {
        predictions,
        actuals: test,
    })
}
