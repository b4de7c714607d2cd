use ecosystem_forecast::data::DataLoader;
use ecosystem_forecast::metrics::score;
use ecosystem_forecast::models::arima::{evaluate_arima, find_best_arima_params, ArimaSearchBounds};
use ecosystem_forecast::models::exponential_smoothing::evaluate_exponential_smoothing;
use ecosystem_forecast::preprocess::preprocess;
use std::io::Write;

/// End-to-end classical forecasting from a CSV file: load, resample to
/// weekly granularity, preprocess, search ARIMA orders, and evaluate with
/// walk-forward validation.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Ecosystem Forecast: CSV Forecasting Example");
    println!("===========================================\n");

    // Write a small daily CSV so the example is self-contained.
    let csv_path = std::env::temp_dir().join("ecosystem_forecast_example.csv");
    {
        let mut file = std::fs::File::create(&csv_path)?;
        writeln!(file, "date,close")?;
        let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        for i in 0..420i64 {
            let date = start + chrono::Duration::days(i);
            let week = (i / 7) as f64;
            let seasonal = [25.0, -5.0, -20.0, 0.0][((i / 7) % 4) as usize];
            let value = 900.0 + 1.2 * week + seasonal + ((i * 13) % 11) as f64 * 0.6;
            writeln!(file, "{},{:.2}", date.format("%Y-%m-%d"), value)?;
        }
    }

    let series = DataLoader::from_csv(&csv_path)?;
    println!("Loaded {} daily observations", series.len());

    let weekly = series.resample_weekly()?;
    println!("Resampled to {} weekly observations", weekly.len());

    let (clean, _scaler) = preprocess(&weekly)?;
    println!("Preprocessed series length: {}\n", clean.len());

    let values = clean.values();
    let train_size = (values.len() as f64 * 0.8).floor() as usize;
    let train = &values[..train_size];

    println!("Searching ARIMA orders by AIC...");
    let bounds = ArimaSearchBounds::default();
    match find_best_arima_params(train, &bounds) {
        Some(order) => {
            println!("Best order: {}", order);
            let evaluation = evaluate_arima(values, order, 0.8)?;
            let record = score("ARIMA", &evaluation.actuals, &evaluation.predictions)?;
            println!("{}\n", record);
        }
        None => println!("No viable ARIMA parameters for this series\n"),
    }

    println!("Evaluating Holt-Winters exponential smoothing...");
    let evaluation = evaluate_exponential_smoothing(values, 4, 0.8)?;
    let record = score(
        "Exponential Smoothing",
        &evaluation.actuals,
        &evaluation.predictions,
    )?;
    println!("{}", record);

    std::fs::remove_file(&csv_path).ok();

    Ok(())
}
