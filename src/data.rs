//! Time series data handling for the forecasting harness

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// A univariate time series of (timestamp, value) observations.
///
/// Timestamps are strictly increasing. Values may be NaN before
/// preprocessing (missing observations); after preprocessing the series is
/// gap-free and NaN-free.
#[derive(Debug, Clone)]
pub struct SeriesData {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl SeriesData {
    /// Create a new series, validating alignment and timestamp ordering.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Timestamp count ({}) doesn't match value count ({})",
                timestamps.len(),
                values.len()
            )));
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "Timestamps must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { timestamps, values })
    }

    /// Get the timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get the values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resample to weekly granularity: one observation per calendar week
    /// (labelled with the week's Sunday), holding the mean of that week's
    /// values. Weeks with no observations are forward-filled from the
    /// previous week.
    pub fn resample_weekly(&self) -> Result<SeriesData> {
        if self.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot resample an empty series".to_string(),
            ));
        }

        let week_end = |ts: &DateTime<Utc>| -> NaiveDate {
            let date = ts.date_naive();
            let back = date.weekday().num_days_from_monday() as i64;
            date - Duration::days(back) + Duration::days(6)
        };

        let first_week = week_end(&self.timestamps[0]);
        let last_week = week_end(self.timestamps.last().unwrap());

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        let mut cursor = 0usize;
        let mut previous: Option<f64> = None;

        let mut week = first_week;
        while week <= last_week {
            let mut sum = 0.0;
            let mut count = 0usize;
            while cursor < self.len() && week_end(&self.timestamps[cursor]) == week {
                let v = self.values[cursor];
                if !v.is_nan() {
                    sum += v;
                    count += 1;
                }
                cursor += 1;
            }

            let mean = if count > 0 {
                Some(sum / count as f64)
            } else {
                previous
            };

            if let Some(v) = mean {
                let label = Utc.from_utc_datetime(&week.and_hms_opt(0, 0, 0).unwrap());
                timestamps.push(label);
                values.push(v);
                previous = Some(v);
            }

            week += Duration::days(7);
        }

        SeriesData::new(timestamps, values)
    }

    /// Summarize the growth characteristics of the series.
    pub fn trend_summary(&self) -> Result<TrendSummary> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }
        let first = self.values[0];
        let last = *self.values.last().unwrap();
        if first == 0.0 {
            return Err(ForecastError::DataError(
                "Cannot compute growth from a zero-valued first observation".to_string(),
            ));
        }

        let total_growth_pct = (last - first) / first * 100.0;

        let changes: Vec<f64> = self
            .values
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0] * 100.0)
            .collect();
        let mean_change = changes.iter().sum::<f64>() / changes.len().max(1) as f64;
        let change_std = if changes.len() > 1 {
            (changes
                .iter()
                .map(|c| (c - mean_change).powi(2))
                .sum::<f64>()
                / (changes.len() - 1) as f64)
                .sqrt()
        } else {
            0.0
        };

        // Quarterly means, then quarter-over-quarter growth rates.
        let mut quarter_keys: Vec<(i32, u32)> = Vec::new();
        let mut quarter_means: Vec<(f64, usize)> = Vec::new();
        for (ts, &v) in self.timestamps.iter().zip(self.values.iter()) {
            let key = (ts.year(), (ts.month() - 1) / 3);
            match quarter_keys.last() {
                Some(last_key) if *last_key == key => {
                    let entry = quarter_means.last_mut().unwrap();
                    entry.0 += v;
                    entry.1 += 1;
                }
                _ => {
                    quarter_keys.push(key);
                    quarter_means.push((v, 1));
                }
            }
        }
        let means: Vec<f64> = quarter_means
            .iter()
            .map(|(sum, count)| sum / *count as f64)
            .collect();
        let quarterly_growth_pct: Vec<f64> = means
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0] * 100.0)
            .collect();

        Ok(TrendSummary {
            total_growth_pct,
            avg_weekly_change_pct: mean_change,
            weekly_change_std_pct: change_std,
            quarterly_growth_pct,
        })
    }
}

/// Growth summary of a weekly series.
#[derive(Debug, Clone)]
pub struct TrendSummary {
    /// Total growth over the whole series, in percent.
    pub total_growth_pct: f64,
    /// Mean week-over-week percent change.
    pub avg_weekly_change_pct: f64,
    /// Sample standard deviation of the weekly percent changes.
    pub weekly_change_std_pct: f64,
    /// Quarter-over-quarter growth of quarterly mean levels, in percent.
    pub quarterly_growth_pct: Vec<f64>,
}

impl std::fmt::Display for TrendSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Trend Summary:")?;
        writeln!(f, "  Total Growth:     {:.2}%", self.total_growth_pct)?;
        writeln!(f, "  Avg Weekly Change: {:.2}%", self.avg_weekly_change_pct)?;
        writeln!(f, "  Weekly Volatility: {:.2}%", self.weekly_change_std_pct)?;
        Ok(())
    }
}

/// Loader for univariate time series files.
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a time series from a CSV file with a date column and a value
    /// column.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SeriesData> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Build a series from an existing DataFrame.
    pub fn from_dataframe(df: DataFrame) -> Result<SeriesData> {
        let time_column = Self::detect_time_column(&df)?;
        let value_column = Self::detect_value_column(&df, &time_column)?;

        let timestamps = Self::extract_timestamps(&df, &time_column)?;
        let values = Self::extract_values(&df, &value_column)?;

        if timestamps.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' and '{}' have different lengths",
                time_column, value_column
            )));
        }

        // Sort observations chronologically before validating.
        let mut paired: Vec<(DateTime<Utc>, f64)> =
            timestamps.into_iter().zip(values).collect();
        paired.sort_by_key(|(ts, _)| *ts);
        let (timestamps, values): (Vec<_>, Vec<_>) = paired.into_iter().unzip();

        SeriesData::new(timestamps, values)
    }

    /// Detect the time column by name, falling back to the first temporal
    /// column.
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        for name in df.get_column_names() {
            let lower = name.to_lowercase();
            if lower.contains("time") || lower.contains("date") {
                return Ok(name.to_string());
            }
        }

        for col in df.get_columns() {
            if col.dtype().is_temporal() {
                return Ok(col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No time column found in data".to_string(),
        ))
    }

    /// Detect the value column by common names, falling back to the first
    /// numeric non-time column.
    fn detect_value_column(df: &DataFrame, time_column: &str) -> Result<String> {
        let preferred = ["close", "value", "price", "index"];
        for wanted in preferred {
            for name in df.get_column_names() {
                if name != time_column && name.to_lowercase().contains(wanted) {
                    return Ok(name.to_string());
                }
            }
        }

        for col in df.get_columns() {
            if col.name() != time_column && col.dtype().is_numeric() {
                return Ok(col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No value column found in data".to_string(),
        ))
    }

    fn extract_timestamps(df: &DataFrame, column: &str) -> Result<Vec<DateTime<Utc>>> {
        let col = df.column(column)?;

        match col.dtype() {
            DataType::Datetime(unit, _) => {
                let unit = *unit;
                col.datetime()?
                    .into_iter()
                    .map(|opt| {
                        opt.map(|raw| Self::from_epoch(raw, unit)).ok_or_else(|| {
                            ForecastError::DataError(format!(
                                "Null timestamp in column '{}'",
                                column
                            ))
                        })
                    })
                    .collect()
            }
            DataType::Date => col
                .date()?
                .into_iter()
                .map(|opt| {
                    opt.map(|days| {
                        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
                            + Duration::days(days as i64);
                        Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
                    })
                    .ok_or_else(|| {
                        ForecastError::DataError(format!("Null date in column '{}'", column))
                    })
                })
                .collect(),
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .map(|opt| match opt {
                    Some(text) => Self::parse_timestamp(text),
                    None => Err(ForecastError::DataError(format!(
                        "Null date in column '{}'",
                        column
                    ))),
                })
                .collect(),
            other => Err(ForecastError::DataError(format!(
                "Column '{}' has unsupported time type {:?}",
                column, other
            ))),
        }
    }

    fn from_epoch(raw: i64, unit: TimeUnit) -> DateTime<Utc> {
        let (secs, nanos) = match unit {
            TimeUnit::Nanoseconds => (raw.div_euclid(1_000_000_000), raw.rem_euclid(1_000_000_000)),
            TimeUnit::Microseconds => (
                raw.div_euclid(1_000_000),
                raw.rem_euclid(1_000_000) * 1_000,
            ),
            TimeUnit::Milliseconds => (raw.div_euclid(1_000), raw.rem_euclid(1_000) * 1_000_000),
        };
        DateTime::<Utc>::from_timestamp(secs, nanos as u32).unwrap_or_default()
    }

    fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Utc.from_utc_datetime(&dt));
            }
        }
        Err(ForecastError::DataError(format!(
            "Cannot parse '{}' as a date",
            text
        )))
    }

    /// Extract a numeric column, keeping nulls as NaN so preprocessing can
    /// interpolate them.
    fn extract_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        let col = df.column(column)?;
        let casted = col.cast(&DataType::Float64)?;
        Ok(casted
            .f64()?
            .into_iter()
            .map(|opt| opt.unwrap_or(f64::NAN))
            .collect())
    }
}
