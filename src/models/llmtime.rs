//! LLMTime: forecasting by treating a language model as a probabilistic
//! sequence-completion oracle
//!
//! The pipeline per parameter combination: encode a trailing window of the
//! training series into a normalized textual sequence, sample several
//! stochastic completions, discard malformed ones, aggregate the survivors
//! elementwise into a point forecast, map back to the original scale, and
//! smooth. An exhaustive grid over the pipeline's knobs keeps the single
//! combination with the lowest RMSE against the held-out values.

use crate::error::Result;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::metrics::root_mean_squared_error;
use crate::preprocess::MinMaxScaler;
use crate::utils::{median, savgol_filter, trimmed_mean};
use log::{debug, warn};
use std::fmt;

/// Decimal places used when encoding values into the prompt.
const VALUE_PRECISION: usize = 3;

/// Fraction trimmed from each tail by the trimmed-mean aggregation.
const TRIM_PROPORTION: f64 = 0.1;

/// Output token budget per completion.
const MAX_TOKENS: usize = 1000;

const SYSTEM_PROMPT: &str = "You are a time series forecasting model. Given a sequence of numbers, predict the next values in the sequence.\nThe numbers are normalized between 0 and 1. Consider the following:\n1. Look for patterns and trends in the data\n2. Consider seasonal variations if present\n3. Account for any recent changes in the trend\n4. Return your predictions as a comma-separated list of numbers between 0 and 1.\nDo not include any explanations or additional text, just the numbers.";

/// How surviving sample vectors are collapsed into one point forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggMethod {
    /// Elementwise median across samples.
    Median,
    /// Elementwise mean after trimming 10% from each tail.
    TrimmedMean,
}

impl fmt::Display for AggMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggMethod::Median => write!(f, "median"),
            AggMethod::TrimmedMean => write!(f, "trimmed_mean"),
        }
    }
}

/// Search grid for the LLMTime pipeline.
#[derive(Debug, Clone)]
pub struct LlmTimeGrid {
    /// Trailing window lengths to encode.
    pub window_sizes: Vec<usize>,
    /// Sampling temperatures.
    pub temperatures: Vec<f64>,
    /// Stochastic completion counts per request.
    pub num_samples: Vec<usize>,
    /// Aggregation methods.
    pub agg_methods: Vec<AggMethod>,
    /// Savitzky-Golay window lengths (odd).
    pub smoothing_windows: Vec<usize>,
}

impl Default for LlmTimeGrid {
    fn default() -> Self {
        Self {
            window_sizes: vec![40, 60],
            temperatures: vec![0.05, 0.1],
            num_samples: vec![16],
            agg_methods: vec![AggMethod::Median, AggMethod::TrimmedMean],
            smoothing_windows: vec![5, 7],
        }
    }
}

/// One point in the LLMTime search grid.
#[derive(Debug, Clone)]
pub struct LlmTimeParams {
    /// Trailing window length encoded into the prompt.
    pub window_size: usize,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completions requested per call.
    pub num_samples: usize,
    /// Aggregation method.
    pub agg_method: AggMethod,
    /// Smoothing window length.
    pub smoothing_window: usize,
}

impl fmt::Display for LlmTimeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window={}, temp={}, samples={}, agg={}, smooth={}",
            self.window_size,
            self.temperature,
            self.num_samples,
            self.agg_method,
            self.smoothing_window
        )
    }
}

/// Best forecast found by the grid search.
#[derive(Debug, Clone)]
pub struct LlmTimeResult {
    /// Point forecast on the original scale, one value per held-out step.
    pub predictions: Vec<f64>,
    /// The winning parameter combination.
    pub params: LlmTimeParams,
    /// RMSE of the winning forecast against the held-out values.
    pub rmse: f64,
}

/// Encode a window for prompting: fresh min-max fit into [0, 1] and
/// fixed-precision formatting. Returns the formatted values, the scaler
/// needed to map predictions back, and the domain context line.
pub fn encode_window(window: &[f64]) -> Result<(Vec<String>, MinMaxScaler, String)> {
    let scaler = MinMaxScaler::fit(window)?;
    let scaled = scaler.transform(window);
    let formatted: Vec<String> = scaled
        .iter()
        .map(|v| format!("{:.*}", VALUE_PRECISION, v))
        .collect();

    let context = format!(
        "This is a time series of {} weekly observations of a market index tracking the health of the tech startup ecosystem. The values are normalized between 0 and 1, where higher values indicate a stronger ecosystem.",
        window.len()
    );

    Ok((formatted, scaler, context))
}

/// Build the forecasting prompt for an encoded window and horizon.
pub fn build_prompt(formatted: &[String], context: &str, horizon: usize) -> String {
    format!(
        "Context: {context}\n\nGiven the following sequence of {count} normalized weekly values:\n{sequence}\n\nThis data is from a real-world financial time series with both trend and seasonality.\nYour goal is to minimize the root mean squared error (RMSE) of your predictions.\nPlease predict the next {horizon} normalized values in the sequence, considering:\n- Recent trends and changes\n- Seasonal patterns (e.g., annual or quarterly cycles)\n- Any abrupt shifts or anomalies\nMinimize prediction error. Match the statistical properties of the sequence. Avoid abrupt jumps unless the data shows a clear anomaly.\n\nReturn only the predicted numbers, separated by commas, with no explanation or extra text.",
        context = context,
        count = formatted.len(),
        sequence = formatted.join(", "),
        horizon = horizon
    )
}

/// Parse one completion into a forecast vector.
///
/// Returns None when any token fails to parse or the value count differs
/// from the requested horizon. Parsed values are clamped to [0, 1] as a
/// safety net against out-of-range model output.
pub fn parse_completion(text: &str, horizon: usize) -> Option<Vec<f64>> {
    let cleaned = text.replace(['[', ']', '\n'], "");

    let mut values = Vec::new();
    for token in cleaned.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<f64>() {
            Ok(v) => values.push(v.clamp(0.0, 1.0)),
            Err(_) => return None,
        }
    }

    if values.len() == horizon {
        Some(values)
    } else {
        None
    }
}

/// Request completions and keep only the ones that parse to exactly the
/// requested horizon. An empty result is a valid outcome ("no valid
/// predictions"), not an error.
pub fn sample_forecasts(
    client: &dyn CompletionClient,
    prompt: &str,
    temperature: f64,
    num_samples: usize,
    horizon: usize,
) -> Result<Vec<Vec<f64>>> {
    let request = CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: prompt.to_string(),
        temperature,
        num_samples,
        max_tokens: MAX_TOKENS,
    };

    let completions = client.complete(&request)?;
    let survivors: Vec<Vec<f64>> = completions
        .iter()
        .filter_map(|text| parse_completion(text, horizon))
        .collect();

    debug!(
        "{} of {} completions parsed to the requested horizon",
        survivors.len(),
        completions.len()
    );

    Ok(survivors)
}

/// Collapse per-sample forecast vectors into one point forecast,
/// elementwise.
fn aggregate(samples: &[Vec<f64>], method: AggMethod) -> Vec<f64> {
    let horizon = samples[0].len();
    (0..horizon)
        .map(|i| {
            let column: Vec<f64> = samples.iter().map(|s| s[i]).collect();
            match method {
                AggMethod::Median => median(&column),
                AggMethod::TrimmedMean => trimmed_mean(&column, TRIM_PROPORTION),
            }
        })
        .collect()
}

/// Exhaustively search the LLMTime parameter grid.
///
/// For each combination the full encode, sample, aggregate, invert, and
/// smooth pipeline runs and is scored by RMSE against the true held-out
/// values; the single best-scoring combination survives. Combinations
/// whose samples all fail validation, or whose service call errors out,
/// are skipped the way a non-converging classical fit is. None means no
/// combination produced a valid forecast.
pub fn optimize_llmtime(
    train: &[f64],
    test: &[f64],
    client: &dyn CompletionClient,
    grid: &LlmTimeGrid,
) -> Option<LlmTimeResult> {
    if train.is_empty() || test.is_empty() {
        return None;
    }

    let train_min = train.iter().copied().fold(f64::INFINITY, f64::min);
    let train_max = train.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut best: Option<LlmTimeResult> = None;

    for &window_size in &grid.window_sizes {
        for &temperature in &grid.temperatures {
            for &num_samples in &grid.num_samples {
                for &agg_method in &grid.agg_methods {
                    debug!(
                        "Trying window={}, temp={}, samples={}, agg={}",
                        window_size, temperature, num_samples, agg_method
                    );

                    let window = &train[train.len().saturating_sub(window_size)..];
                    let (formatted, scaler, context) = match encode_window(window) {
                        Ok(encoded) => encoded,
                        Err(err) => {
                            warn!("Skipping window of {} points: {}", window.len(), err);
                            continue;
                        }
                    };
                    let prompt = build_prompt(&formatted, &context, test.len());

                    let samples = match sample_forecasts(
                        client,
                        &prompt,
                        temperature,
                        num_samples,
                        test.len(),
                    ) {
                        Ok(samples) => samples,
                        Err(err) => {
                            warn!("Completion call failed ({}); skipping combination", err);
                            continue;
                        }
                    };
                    if samples.is_empty() {
                        warn!("No valid predictions for window={}, temp={}", window_size, temperature);
                        continue;
                    }

                    let aggregated = aggregate(&samples, agg_method);
                    let rescaled = scaler.inverse_transform(&aggregated);
                    let clipped: Vec<f64> = rescaled
                        .iter()
                        .map(|v| v.clamp(train_min, train_max))
                        .collect();

                    for &smoothing_window in &grid.smoothing_windows {
                        let smoothed = if clipped.len() > smoothing_window {
                            savgol_filter(&clipped, smoothing_window)
                        } else {
                            clipped.clone()
                        };

                        let rmse = match root_mean_squared_error(test, &smoothed) {
                            Ok(rmse) => rmse,
                            Err(_) => continue,
                        };

                        let improved = match &best {
                            Some(current) => rmse < current.rmse,
                            None => true,
                        };
                        if improved {
                            best = Some(LlmTimeResult {
                                predictions: smoothed,
                                params: LlmTimeParams {
                                    window_size,
                                    temperature,
                                    num_samples,
                                    agg_method,
                                    smoothing_window,
                                },
                                rmse,
                            });
                        }
                    }
                }
            }
        }
    }

    best
}
