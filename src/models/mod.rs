//! Forecasting model families and the walk-forward evaluation harness

use crate::error::{ForecastError, Result};

pub mod arima;
pub mod exponential_smoothing;
pub mod llmtime;
pub mod sarima;

/// Out-of-sample evaluation: predictions aligned with the true held-out
/// values they were scored against.
#[derive(Debug, Clone)]
pub struct ForecastEvaluation {
    /// One prediction per held-out timestep.
    pub predictions: Vec<f64>,
    /// The true held-out values, in the same order.
    pub actuals: Vec<f64>,
}

/// Walk-forward validation over a held-out horizon.
///
/// The series is split at `train_fraction`; a growing history is seeded
/// with the training slice. For every held-out step, `forecast_next` is
/// called with all history observed so far and must refit from scratch and
/// forecast exactly one step ahead. The TRUE held-out value (never the
/// forecast) is then appended before the next step, so errors measure
/// one-step-ahead accuracy rather than multi-step drift.
pub fn walk_forward<F>(
    values: &[f64],
    train_fraction: f64,
    mut forecast_next: F,
) -> Result<ForecastEvaluation>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    if !(0.0..1.0).contains(&train_fraction) || train_fraction == 0.0 {
        return Err(ForecastError::ValidationError(format!(
            "Train fraction must be in (0, 1), got {}",
            train_fraction
        )));
    }

    let train_size = (values.len() as f64 * train_fraction).floor() as usize;
    if train_size < 2 || train_size >= values.len() {
        return Err(ForecastError::InsufficientData {
            needed: 3,
            got: values.len(),
        });
    }

    let mut history: Vec<f64> = values[..train_size].to_vec();
    let test = &values[train_size..];

    let mut predictions = Vec::with_capacity(test.len());
    for &truth in test {
        let forecast = forecast_next(&history)?;
        predictions.push(forecast);
        history.push(truth);
    }

    Ok(ForecastEvaluation {
        predictions,
        actuals: test.to_vec(),
    })
}
