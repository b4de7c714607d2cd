//! Metrics for scoring and ranking forecasts

use crate::error::{ForecastError, Result};

/// Mean absolute error between actual and predicted values.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_pair(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error between actual and predicted values.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_pair(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

/// Coefficient of determination.
///
/// For a constant actual series the residual-based definition degenerates;
/// a perfect match scores 1.0 and anything else scores 0.0.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate_pair(actual, predicted)?;

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

fn validate_pair(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Accuracy record for one evaluated model.
#[derive(Debug, Clone)]
pub struct ModelScore {
    /// Model name
    pub model: String,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
}

/// Score a forecast against the held-out actuals.
pub fn score(model: &str, actual: &[f64], predicted: &[f64]) -> Result<ModelScore> {
    Ok(ModelScore {
        model: model.to_string(),
        mae: mean_absolute_error(actual, predicted)?,
        rmse: root_mean_squared_error(actual, predicted)?,
        r2: r_squared(actual, predicted)?,
    })
}

impl std::fmt::Display for ModelScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: MAE={:.4}, RMSE={:.4}, R2={:.4}",
            self.model, self.mae, self.rmse, self.r2
        )
    }
}

/// Winners across a set of model scores.
#[derive(Debug, Clone)]
pub struct ModelComparison {
    /// Model with the lowest MAE and its value.
    pub best_mae: (String, f64),
    /// Model with the lowest RMSE and its value.
    pub best_rmse: (String, f64),
    /// Model with the highest R2 and its value.
    pub best_r2: (String, f64),
}

impl std::fmt::Display for ModelComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Best Models:")?;
        writeln!(f, "  MAE:  {} ({:.4})", self.best_mae.0, self.best_mae.1)?;
        writeln!(f, "  RMSE: {} ({:.4})", self.best_rmse.0, self.best_rmse.1)?;
        writeln!(f, "  R2:   {} ({:.4})", self.best_r2.0, self.best_r2.1)?;
        Ok(())
    }
}

/// Find the best model independently per metric. Comparisons are strict,
/// so ties keep the first record seen.
pub fn compare_models(records: &[ModelScore]) -> Option<ModelComparison> {
    let first = records.first()?;

    let mut best_mae = (first.model.clone(), first.mae);
    let mut best_rmse = (first.model.clone(), first.rmse);
    let mut best_r2 = (first.model.clone(), first.r2);

    for record in &records[1..] {
        if record.mae < best_mae.1 {
            best_mae = (record.model.clone(), record.mae);
        }
        if record.rmse < best_rmse.1 {
            best_rmse = (record.model.clone(), record.rmse);
        }
        if record.r2 > best_r2.1 {
            best_r2 = (record.model.clone(), record.r2);
        }
    }

    Some(ModelComparison {
        best_mae,
        best_rmse,
        best_r2,
    })
}
