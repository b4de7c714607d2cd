use chrono::{DateTime, Duration, TimeZone, Utc};
use ecosystem_forecast::comparison::{run_comparison, ComparisonConfig};
use ecosystem_forecast::data::SeriesData;
use ecosystem_forecast::llm::{CompletionClient, CompletionRequest};
use ecosystem_forecast::models::llmtime::{AggMethod, LlmTimeGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::cell::RefCell;

/// Offline stand-in for the completion service: answers with a noisy
/// seasonal continuation of the normalized range, so the whole comparison
/// pipeline can run without network access or an API key.
struct OfflineSeasonalClient {
    rng: RefCell<StdRng>,
}

impl OfflineSeasonalClient {
    fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CompletionClient for OfflineSeasonalClient {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> ecosystem_forecast::Result<Vec<String>> {
        let horizon = request
            .prompt
            .split("predict the next ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|token| token.parse::<usize>().ok())
            .unwrap_or(8);

        let mut rng = self.rng.borrow_mut();
        let completions = (0..request.num_samples)
            .map(|_| {
                (0..horizon)
                    .map(|h| {
                        let seasonal = 0.25 * (h as f64 * std::f64::consts::PI / 2.0).sin();
                        let value =
                            (0.5 + seasonal + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0);
                        format!("{:.3}", value)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect();
        Ok(completions)
    }
}

/// Build ~2.5 years of synthetic weekly index data: upward drift, a
/// quarterly bump, and Gaussian noise.
fn synthetic_index() -> SeriesData {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 4.0).unwrap();
    let base = Utc.with_ymd_and_hms(2021, 1, 4, 0, 0, 0).unwrap();

    let timestamps: Vec<DateTime<Utc>> = (0..130).map(|i| base + Duration::weeks(i)).collect();
    let values: Vec<f64> = (0..130)
        .map(|i| {
            let seasonal = [40.0, -10.0, -35.0, 5.0][(i % 4) as usize];
            1200.0 + 1.5 * i as f64 + seasonal + noise.sample(&mut rng)
        })
        .collect();

    SeriesData::new(timestamps, values).unwrap()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Ecosystem Forecast: Model Comparison Example");
    println!("============================================\n");

    let series = synthetic_index();
    println!("Generated {} weeks of synthetic index data", series.len());
    println!("{}", series.trend_summary()?);

    let config = ComparisonConfig {
        llm_grid: LlmTimeGrid {
            window_sizes: vec![24, 40],
            temperatures: vec![0.1],
            num_samples: vec![8],
            agg_methods: vec![AggMethod::Median, AggMethod::TrimmedMean],
            smoothing_windows: vec![5, 7],
        },
        ..ComparisonConfig::default()
    };

    let client = OfflineSeasonalClient::new(42);

    println!("Running the model comparison (this refits models at every held-out step)...\n");
    let report = run_comparison(&series, &config, &client)?;

    println!("{}", report);

    Ok(())
}
