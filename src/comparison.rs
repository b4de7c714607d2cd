//! Orchestration: preprocess, evaluate every model family, score, rank

use crate::data::SeriesData;
use crate::error::{ForecastError, Result};
use crate::llm::CompletionClient;
use crate::metrics::{compare_models, score, ModelComparison, ModelScore};
use crate::models::arima::{evaluate_arima, find_best_arima_params, ArimaSearchBounds};
use crate::models::exponential_smoothing::evaluate_exponential_smoothing;
use crate::models::llmtime::{optimize_llmtime, LlmTimeGrid};
use crate::models::sarima::{evaluate_sarima, find_best_sarima_params};
use crate::preprocess::preprocess;
use crate::utils::train_test_split;
use log::{info, warn};

/// Configuration surface of a comparison run. Everything is a caller
/// choice or a defaulted constant; nothing is discovered at runtime.
#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    /// Train/test split fraction.
    pub train_fraction: f64,
    /// Seasonal period shared by SARIMA and Holt-Winters.
    pub seasonal_period: usize,
    /// ARIMA order search bounds.
    pub arima_bounds: ArimaSearchBounds,
    /// LLMTime parameter grid.
    pub llm_grid: LlmTimeGrid,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seasonal_period: 4,
            arima_bounds: ArimaSearchBounds::default(),
            llm_grid: LlmTimeGrid::default(),
        }
    }
}

/// One evaluated model: its out-of-sample forecast and accuracy.
#[derive(Debug, Clone)]
pub struct ModelForecast {
    /// Model name.
    pub name: String,
    /// Forecast aligned to the held-out horizon.
    pub predictions: Vec<f64>,
    /// Accuracy against the held-out values.
    pub score: ModelScore,
}

/// Full comparison output: per-model forecasts plus the ranking.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    /// Every ranked model, in evaluation order.
    pub forecasts: Vec<ModelForecast>,
    /// Winners per metric.
    pub comparison: ModelComparison,
}

impl std::fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Performance Metrics:")?;
        for forecast in &self.forecasts {
            writeln!(f, "  {}", forecast.score)?;
        }
        write!(f, "{}", self.comparison)
    }
}

/// Run the full pipeline: preprocessing, per-family evaluation, scoring,
/// and ranking.
///
/// A classical family whose search exhausts or whose evaluation fails is
/// degraded to an all-zero baseline forecast so the run keeps ranking the
/// other families. The LLM family is omitted entirely when no parameter
/// combination yields valid predictions.
pub fn run_comparison(
    series: &SeriesData,
    config: &ComparisonConfig,
    client: &dyn CompletionClient,
) -> Result<ComparisonReport> {
    let (clean, _scaler) = preprocess(series)?;
    let values = clean.values();

    let (train, test) = train_test_split(values, config.train_fraction);
    info!("Training size: {}, test size: {}", train.len(), test.len());

    let mut forecasts: Vec<ModelForecast> = Vec::new();

    // LLMTime
    match optimize_llmtime(&train, &test, client, &config.llm_grid) {
        Some(result) => {
            info!(
                "Best LLMTime RMSE: {:.4} ({})",
                result.rmse, result.params
            );
            forecasts.push(ModelForecast {
                name: "LLMTime".to_string(),
                score: score("LLMTime", &test, &result.predictions)?,
                predictions: result.predictions,
            });
        }
        None => warn!("No valid LLMTime predictions; omitting the model from the ranking"),
    }

    // ARIMA
    let arima_preds = match find_best_arima_params(&train, &config.arima_bounds) {
        Some(order) => {
            info!("Best ARIMA order: {}", order);
            match evaluate_arima(values, order, config.train_fraction) {
                Ok(evaluation) => evaluation.predictions,
                Err(err) => {
                    warn!("ARIMA evaluation failed ({}); using zero baseline", err);
                    vec![0.0; test.len()]
                }
            }
        }
        None => {
            warn!("No viable ARIMA parameters; using zero baseline");
            vec![0.0; test.len()]
        }
    };
    forecasts.push(ModelForecast {
        name: "ARIMA".to_string(),
        score: score("ARIMA", &test, &arima_preds)?,
        predictions: arima_preds,
    });

    // SARIMA
    let sarima_preds = match find_best_sarima_params(&train, config.seasonal_period) {
        Some(spec) => {
            info!("Best SARIMA order: {}", spec);
            match evaluate_sarima(values, spec, config.train_fraction) {
                Ok(evaluation) => evaluation.predictions,
                Err(err) => {
                    warn!("SARIMA evaluation failed ({}); using zero baseline", err);
                    vec![0.0; test.len()]
                }
            }
        }
        None => {
            warn!("No viable SARIMA parameters; using zero baseline");
            vec![0.0; test.len()]
        }
    };
    forecasts.push(ModelForecast {
        name: "SARIMA".to_string(),
        score: score("SARIMA", &test, &sarima_preds)?,
        predictions: sarima_preds,
    });

    // Exponential Smoothing
    let es_preds =
        match evaluate_exponential_smoothing(values, config.seasonal_period, config.train_fraction)
        {
            Ok(evaluation) => evaluation.predictions,
            Err(err) => {
                warn!(
                    "Exponential Smoothing evaluation failed ({}); using zero baseline",
                    err
                );
                vec![0.0; test.len()]
            }
        };
    forecasts.push(ModelForecast {
        name: "Exponential Smoothing".to_string(),
        score: score("Exponential Smoothing", &test, &es_preds)?,
        predictions: es_preds,
    });

    let records: Vec<ModelScore> = forecasts.iter().map(|f| f.score.clone()).collect();
    let comparison = compare_models(&records).ok_or_else(|| {
        ForecastError::ValidationError("No models were evaluated".to_string())
    })?;

    Ok(ComparisonReport {
        forecasts,
        comparison,
    })
}
