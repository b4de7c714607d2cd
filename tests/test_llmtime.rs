use assert_approx_eq::assert_approx_eq;
use ecosystem_forecast::error::{ForecastError, Result};
use ecosystem_forecast::llm::{CompletionClient, CompletionRequest};
use ecosystem_forecast::models::llmtime::{
    build_prompt, encode_window, optimize_llmtime, parse_completion, sample_forecasts, AggMethod,
    LlmTimeGrid,
};

/// Client that always returns the same scripted completions.
struct ScriptedClient {
    completions: Vec<String>,
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
        Ok(self.completions.clone())
    }
}

/// Client that fails every call, like an unreachable service.
struct FailingClient;

impl CompletionClient for FailingClient {
    fn complete(&self, _request: &CompletionRequest) -> Result<Vec<String>> {
        Err(ForecastError::LlmError("service unreachable".to_string()))
    }
}

fn csv_line(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.3}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn small_grid() -> LlmTimeGrid {
    LlmTimeGrid {
        window_sizes: vec![8],
        temperatures: vec![0.1],
        num_samples: vec![4],
        agg_methods: vec![AggMethod::Median],
        smoothing_windows: vec![5],
    }
}

#[test]
fn test_encode_window_formats_and_scales() {
    let window = vec![100.0, 150.0, 200.0];
    let (formatted, scaler, context) = encode_window(&window).unwrap();

    assert_eq!(formatted, vec!["0.000", "0.500", "1.000"]);
    assert_approx_eq!(scaler.data_min(), 100.0, 1e-12);
    assert_approx_eq!(scaler.data_max(), 200.0, 1e-12);
    assert!(context.contains("3 weekly observations"));
}

#[test]
fn test_build_prompt_states_horizon() {
    let formatted = vec!["0.100".to_string(), "0.200".to_string()];
    let prompt = build_prompt(&formatted, "Context line.", 7);

    assert!(prompt.contains("predict the next 7 normalized values"));
    assert!(prompt.contains("0.100, 0.200"));
    assert!(prompt.contains("separated by commas"));
}

#[test]
fn test_parse_completion_accepts_exact_horizon() {
    let parsed = parse_completion("0.1, 0.2, 0.3", 3).unwrap();
    assert_eq!(parsed, vec![0.1, 0.2, 0.3]);
}

#[test]
fn test_parse_completion_strips_brackets_and_newlines() {
    let parsed = parse_completion("[0.1,\n0.2,\n0.3]", 3).unwrap();
    assert_eq!(parsed.len(), 3);
}

#[test]
fn test_parse_completion_clamps_out_of_range_values() {
    let parsed = parse_completion("1.5, -0.2, 0.5", 3).unwrap();
    assert_eq!(parsed, vec![1.0, 0.0, 0.5]);
}

#[test]
fn test_parse_completion_rejects_wrong_length_or_garbage() {
    assert!(parse_completion("0.1, 0.2", 3).is_none());
    assert!(parse_completion("0.1, 0.2, 0.3, 0.4", 3).is_none());
    assert!(parse_completion("0.1, about 0.2, 0.3", 3).is_none());
}

#[test]
fn test_sample_filtering_keeps_only_full_length_completions() {
    // Horizon of 10; completions of lengths [10, 10, 9, 10] leave 3
    let good: Vec<f64> = (0..10).map(|i| 0.05 * i as f64).collect();
    let short: Vec<f64> = (0..9).map(|i| 0.05 * i as f64).collect();

    let client = ScriptedClient {
        completions: vec![
            csv_line(&good),
            csv_line(&good),
            csv_line(&short),
            csv_line(&good),
        ],
    };

    let samples = sample_forecasts(&client, "prompt", 0.1, 4, 10).unwrap();
    assert_eq!(samples.len(), 3);
}

#[test]
fn test_optimize_inverse_transforms_and_clips() {
    // Train occupies [100, 200]; constant 0.5 completions should map to
    // the middle of the window range after the inverse transform.
    let train: Vec<f64> = (0..20).map(|i| 100.0 + 5.0 * (i % 21) as f64).collect();
    let test = vec![150.0, 150.0, 150.0, 150.0];

    let client = ScriptedClient {
        completions: vec![csv_line(&[0.5; 4]); 4],
    };

    let result = optimize_llmtime(&train, &test, &client, &small_grid()).unwrap();

    assert_eq!(result.predictions.len(), 4);
    let window_min = train[train.len() - 8..]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let window_max = train[train.len() - 8..]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let expected = window_min + 0.5 * (window_max - window_min);
    for &p in &result.predictions {
        assert_approx_eq!(p, expected, 1e-9);
        assert!(p >= 100.0 && p <= 200.0);
    }
    assert!(result.rmse >= 0.0);
}

#[test]
fn test_optimize_returns_none_when_all_samples_invalid() {
    let train: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let test = vec![120.0, 121.0, 122.0];

    let client = ScriptedClient {
        completions: vec!["not a number at all".to_string(), "0.1, 0.2".to_string()],
    };

    assert!(optimize_llmtime(&train, &test, &client, &small_grid()).is_none());
}

#[test]
fn test_optimize_absorbs_service_failure() {
    let train: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let test = vec![120.0, 121.0, 122.0];

    assert!(optimize_llmtime(&train, &test, &FailingClient, &small_grid()).is_none());
}

#[test]
fn test_optimize_keeps_lowest_rmse_combination() {
    // Two aggregation methods: a skewed sample set makes the median and
    // the trimmed mean disagree, and the search must keep the better one.
    let train: Vec<f64> = (0..20).map(|i| (i % 11) as f64 * 10.0).collect();
    let test = vec![50.0, 50.0, 50.0];

    let grid = LlmTimeGrid {
        window_sizes: vec![10],
        temperatures: vec![0.1],
        num_samples: vec![3],
        agg_methods: vec![AggMethod::Median, AggMethod::TrimmedMean],
        smoothing_windows: vec![5],
    };

    let client = ScriptedClient {
        completions: vec![
            csv_line(&[0.5; 3]),
            csv_line(&[0.5; 3]),
            csv_line(&[0.9; 3]),
        ],
    };

    let result = optimize_llmtime(&train, &test, &client, &grid).unwrap();

    // Median of {0.5, 0.5, 0.9} is 0.5 -> exactly the held-out level,
    // while the (untruncated) trimmed mean lands higher.
    assert_eq!(result.params.agg_method, AggMethod::Median);
    assert!(result.rmse < 1e-6);
}

#[test]
fn test_smoothing_skipped_for_short_horizons() {
    // Horizon 4 < smoothing window 5: the jagged aggregate must survive
    let train: Vec<f64> = (0..20).map(|i| (i % 11) as f64 * 10.0).collect();
    let test = vec![10.0, 90.0, 10.0, 90.0];

    let client = ScriptedClient {
        completions: vec![csv_line(&[0.1, 0.9, 0.1, 0.9]); 3],
    };

    let grid = LlmTimeGrid {
        window_sizes: vec![10],
        temperatures: vec![0.1],
        num_samples: vec![3],
        agg_methods: vec![AggMethod::Median],
        smoothing_windows: vec![5],
    };

    let result = optimize_llmtime(&train, &test, &client, &grid).unwrap();

    // Window spans [0, 100]: 0.1 -> 10, 0.9 -> 90, untouched by smoothing
    assert_approx_eq!(result.predictions[0], 10.0, 1e-9);
    assert_approx_eq!(result.predictions[1], 90.0, 1e-9);
}
