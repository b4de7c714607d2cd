use assert_approx_eq::assert_approx_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ecosystem_forecast::data::SeriesData;
use ecosystem_forecast::error::ForecastError;
use ecosystem_forecast::preprocess::{
    interpolate_missing, preprocess, remove_outliers, MinMaxScaler,
};
use ecosystem_forecast::stationarity::adf_test;

fn weekly_timestamps(n: usize) -> Vec<DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    (0..n).map(|i| base + Duration::weeks(i as i64)).collect()
}

fn weekly_series(values: Vec<f64>) -> SeriesData {
    SeriesData::new(weekly_timestamps(values.len()), values).unwrap()
}

#[test]
fn test_scaler_round_trip() {
    let values = vec![120.0, 80.0, 150.0, 95.0, 130.0];
    let scaler = MinMaxScaler::fit(&values).unwrap();

    let scaled = scaler.transform(&values);
    assert!(scaled.iter().all(|&v| (0.0..=1.0).contains(&v)));

    let recovered = scaler.inverse_transform(&scaled);
    for (orig, rec) in values.iter().zip(recovered.iter()) {
        assert_approx_eq!(orig, rec, 1e-10);
    }
}

#[test]
fn test_scaler_constant_series() {
    let values = vec![7.0; 5];
    let scaler = MinMaxScaler::fit(&values).unwrap();

    // Degenerate range maps everything to 0
    for &v in &scaler.transform(&values) {
        assert_approx_eq!(v, 0.0, 1e-12);
    }
}

#[test]
fn test_interpolation_is_time_aware() {
    // Unevenly spaced timestamps: the gap value must be weighted by time
    // distance, not by index position.
    let base = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    let timestamps = vec![
        base,
        base + Duration::days(1),
        base + Duration::days(4),
    ];
    let series = SeriesData::new(timestamps, vec![10.0, f64::NAN, 40.0]).unwrap();

    let filled = interpolate_missing(&series).unwrap();

    // One day into a four-day gap from 10 to 40: 10 + (1/4)*30 = 17.5
    assert_approx_eq!(filled.values()[1], 17.5, 1e-10);
}

#[test]
fn test_interpolation_holds_trailing_values() {
    let series = weekly_series(vec![1.0, 2.0, f64::NAN]);
    let filled = interpolate_missing(&series).unwrap();

    assert_approx_eq!(filled.values()[2], 2.0, 1e-10);
}

#[test]
fn test_outlier_removal_drops_spike() {
    let mut values: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
    values[15] = 10_000.0;
    let series = weekly_series(values);

    let trimmed = remove_outliers(&series).unwrap();

    assert_eq!(trimmed.len(), 29);
    assert!(trimmed.values().iter().all(|&v| v < 1000.0));
}

#[test]
fn test_outlier_removal_keeps_clean_series() {
    let values: Vec<f64> = (0..30).map(|i| 100.0 + (i % 7) as f64).collect();
    let series = weekly_series(values.clone());

    let trimmed = remove_outliers(&series).unwrap();
    assert_eq!(trimmed.len(), values.len());
}

#[test]
fn test_adf_flags_trend_as_non_stationary() {
    let values: Vec<f64> = (0..200)
        .map(|i| i as f64 * 0.5 + ((i * 13) % 7) as f64 * 0.01)
        .collect();

    let result = adf_test(&values);

    assert!(!result.statistic.is_nan());
    assert!(!result.is_stationary);
}

#[test]
fn test_adf_accepts_noise_as_stationary() {
    let values: Vec<f64> = (0..200)
        .map(|i| ((i * 17 + 13) % 97) as f64 / 50.0 - 1.0)
        .collect();

    let result = adf_test(&values);

    assert!(result.statistic < 0.0);
    assert!(result.is_stationary);
}

#[test]
fn test_adf_short_series() {
    let result = adf_test(&[1.0, 2.0, 3.0]);
    assert!(result.statistic.is_nan());
    assert!(!result.is_stationary);
}

#[test]
fn test_preprocess_scales_into_unit_interval() {
    let values: Vec<f64> = (0..60)
        .map(|i| ((i * 17 + 13) % 97) as f64 + 100.0)
        .collect();
    let series = weekly_series(values);

    let (clean, scaler) = preprocess(&series).unwrap();

    assert!(!clean.is_empty());
    assert!(clean.values().iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert!(scaler.data_max() > scaler.data_min());
}

#[test]
fn test_preprocess_differences_trending_series() {
    let values: Vec<f64> = (0..100)
        .map(|i| 50.0 + 2.0 * i as f64 + ((i * 13) % 7) as f64 * 0.05)
        .collect();
    let series = weekly_series(values.clone());

    let (clean, _) = preprocess(&series).unwrap();

    // At least one differencing pass consumed at least one observation
    assert!(clean.len() < values.len());
    // Timestamps stay aligned with the surviving observations
    assert_eq!(clean.timestamps().len(), clean.values().len());
}

#[test]
fn test_preprocess_rejects_tiny_series() {
    let series = weekly_series(vec![1.0, 2.0, 3.0]);

    match preprocess(&series) {
        Err(ForecastError::InsufficientData { .. }) => {}
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}
