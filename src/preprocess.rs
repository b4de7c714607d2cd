//! Preprocessing pipeline: interpolation, outlier trimming, differencing,
//! scaling

use crate::data::SeriesData;
use crate::error::{ForecastError, Result};
use crate::stationarity::adf_test;
use crate::utils::difference;
use log::{debug, info};
use statrs::statistics::{Data, OrderStatistics};

/// Minimum usable length after cleaning; shorter series cannot support the
/// seasonal models or a meaningful train/test split.
pub const MIN_PREPROCESSED_LEN: usize = 10;

/// IQR multiplier for the outlier fences.
const IQR_FENCE: f64 = 1.5;

/// Fitted min-max transform into [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler on the observed range of `values`.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Err(ForecastError::DataError(
                "Cannot fit a scaler on non-finite values".to_string(),
            ));
        }

        Ok(Self { min, max })
    }

    /// Fitted minimum.
    pub fn data_min(&self) -> f64 {
        self.min
    }

    /// Fitted maximum.
    pub fn data_max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range.abs() < 1e-12 {
            1.0
        } else {
            range
        }
    }

    /// Map values into [0, 1] using the fitted range.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        let range = self.range();
        values.iter().map(|&x| (x - self.min) / range).collect()
    }

    /// Map scaled values back to the original range.
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        let range = self.range();
        values.iter().map(|&x| x * range + self.min).collect()
    }
}

/// Clean and scale a raw series.
///
/// Steps run in fixed order: time-aware interpolation of missing values,
/// IQR outlier trimming, stationarity differencing (at most two passes),
/// then a min-max fit on whatever data remains. Returns the cleaned,
/// scaled series together with the fitted scaler.
pub fn preprocess(series: &SeriesData) -> Result<(SeriesData, MinMaxScaler)> {
    let interpolated = interpolate_missing(series)?;
    let trimmed = remove_outliers(&interpolated)?;

    ensure_usable(trimmed.len())?;

    let (timestamps, values) = apply_differencing(&trimmed);
    ensure_usable(values.len())?;

    let scaler = MinMaxScaler::fit(&values)?;
    let scaled = scaler.transform(&values);

    Ok((SeriesData::new(timestamps, scaled)?, scaler))
}

fn ensure_usable(len: usize) -> Result<()> {
    if len < MIN_PREPROCESSED_LEN {
        return Err(ForecastError::InsufficientData {
            needed: MIN_PREPROCESSED_LEN,
            got: len,
        });
    }
    Ok(())
}

/// Fill NaN values by linear interpolation in time (not in index), so
/// unevenly spaced gaps are weighted by their actual distance. Trailing
/// gaps hold the last observed value; leading gaps are dropped.
pub fn interpolate_missing(series: &SeriesData) -> Result<SeriesData> {
    let timestamps = series.timestamps();
    let values = series.values();

    let first_valid = match values.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => {
            return Err(ForecastError::DataError(
                "Series contains no observed values".to_string(),
            ))
        }
    };

    let mut out_ts = Vec::with_capacity(values.len() - first_valid);
    let mut out_vals = Vec::with_capacity(values.len() - first_valid);

    for i in first_valid..values.len() {
        let v = values[i];
        let filled = if v.is_nan() {
            let prev = (0..i).rev().find(|&j| !values[j].is_nan());
            let next = (i + 1..values.len()).find(|&j| !values[j].is_nan());
            match (prev, next) {
                (Some(p), Some(n)) => {
                    let span = (timestamps[n] - timestamps[p]).num_seconds() as f64;
                    let offset = (timestamps[i] - timestamps[p]).num_seconds() as f64;
                    let weight = if span > 0.0 { offset / span } else { 0.5 };
                    values[p] + weight * (values[n] - values[p])
                }
                (Some(p), None) => values[p],
                _ => unreachable!("first_valid guarantees a previous observation"),
            }
        } else {
            v
        };
        out_ts.push(timestamps[i]);
        out_vals.push(filled);
    }

    SeriesData::new(out_ts, out_vals)
}

/// Drop observations outside [Q1 - 1.5 IQR, Q3 + 1.5 IQR], quartiles taken
/// from the series itself.
pub fn remove_outliers(series: &SeriesData) -> Result<SeriesData> {
    if series.is_empty() {
        return Err(ForecastError::DataError(
            "Cannot trim outliers from an empty series".to_string(),
        ));
    }

    let mut data = Data::new(series.values().to_vec());
    let q1 = data.lower_quartile();
    let q3 = data.upper_quartile();
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let mut timestamps = Vec::new();
    let mut values = Vec::new();
    for (ts, &v) in series.timestamps().iter().zip(series.values()) {
        if v >= lower && v <= upper {
            timestamps.push(*ts);
            values.push(v);
        }
    }

    let dropped = series.len() - values.len();
    if dropped > 0 {
        debug!("Outlier trimming dropped {} of {} points", dropped, series.len());
    }

    SeriesData::new(timestamps, values)
}

/// Difference until stationary, capped at two passes. The second pass is
/// applied without a further re-test.
fn apply_differencing(series: &SeriesData) -> (Vec<chrono::DateTime<chrono::Utc>>, Vec<f64>) {
    let mut values = series.values().to_vec();
    let mut passes = 0usize;

    let first = adf_test(&values);
    if !first.is_stationary {
        info!(
            "Series is not stationary (ADF p={:.3}); applying first differencing",
            first.p_value
        );
        values = difference(&values, 1);
        passes = 1;

        let second = adf_test(&values);
        if !second.is_stationary {
            info!(
                "Series is still not stationary (ADF p={:.3}); applying second differencing",
                second.p_value
            );
            values = difference(&values, 1);
            passes = 2;
        }
    }

    // Each differencing pass consumes one leading observation.
    let timestamps = series.timestamps()[passes..].to_vec();
    (timestamps, values)
}
