//! # Ecosystem Forecast
//!
//! A Rust library for forecasting a proxy time series of startup-ecosystem
//! health (a weekly market index) and ranking competing forecasting
//! techniques by predictive accuracy.
//!
//! ## Features
//!
//! - Time series loading and weekly resampling
//! - Preprocessing (interpolation, outlier trimming, stationarity
//!   differencing, min-max scaling)
//! - Classical models with AIC-driven order search (ARIMA, SARIMA) and
//!   Holt-Winters exponential smoothing
//! - An LLM-based forecaster ("LLMTime") with sample aggregation,
//!   denoising, and RMSE-driven parameter optimization
//! - Walk-forward out-of-sample evaluation and cross-model ranking
//!   (MAE / RMSE / R2)
//!
//! ## Quick Start
//!
//! ```no_run
//! use ecosystem_forecast::comparison::{run_comparison, ComparisonConfig};
//! use ecosystem_forecast::data::DataLoader;
//! use ecosystem_forecast::llm::OpenAiClient;
//!
//! # fn main() -> ecosystem_forecast::Result<()> {
//! // Load data and resample to weekly granularity
//! let series = DataLoader::from_csv("index.csv")?.resample_weekly()?;
//!
//! // Evaluate and rank all model families
//! let client = OpenAiClient::from_env()?;
//! let report = run_comparison(&series, &ComparisonConfig::default(), &client)?;
//!
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod comparison;
pub mod data;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod optimize;
pub mod preprocess;
pub mod stationarity;
pub mod utils;

// Re-export commonly used types
pub use crate::comparison::{run_comparison, ComparisonConfig, ComparisonReport};
pub use crate::data::{DataLoader, SeriesData};
pub use crate::error::{ForecastError, Result};
pub use crate::llm::{CompletionClient, CompletionRequest, OpenAiClient};
pub use crate::metrics::{compare_models, ModelComparison, ModelScore};
pub use crate::preprocess::{preprocess, MinMaxScaler};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
