use assert_approx_eq::assert_approx_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ecosystem_forecast::data::{DataLoader, SeriesData};
use std::io::Write;

fn day(offset: i64) -> DateTime<Utc> {
    // 2022-01-03 is a Monday
    Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap() + Duration::days(offset)
}

#[test]
fn test_series_data_validates_alignment() {
    let result = SeriesData::new(vec![day(0), day(1)], vec![1.0]);
    assert!(result.is_err());
}

#[test]
fn test_series_data_requires_increasing_timestamps() {
    let result = SeriesData::new(vec![day(1), day(0)], vec![1.0, 2.0]);
    assert!(result.is_err());

    let duplicate = SeriesData::new(vec![day(0), day(0)], vec![1.0, 2.0]);
    assert!(duplicate.is_err());
}

#[test]
fn test_resample_weekly_averages_within_weeks() {
    // Three observations in week one, one in week two
    let series = SeriesData::new(
        vec![day(0), day(2), day(4), day(7)],
        vec![10.0, 20.0, 30.0, 50.0],
    )
    .unwrap();

    let weekly = series.resample_weekly().unwrap();

    assert_eq!(weekly.len(), 2);
    assert_approx_eq!(weekly.values()[0], 20.0, 1e-10);
    assert_approx_eq!(weekly.values()[1], 50.0, 1e-10);
}

#[test]
fn test_resample_weekly_forward_fills_gaps() {
    // Observations in week one and week three; week two is empty
    let series = SeriesData::new(vec![day(0), day(15)], vec![10.0, 30.0]).unwrap();

    let weekly = series.resample_weekly().unwrap();

    assert_eq!(weekly.len(), 3);
    assert_approx_eq!(weekly.values()[1], 10.0, 1e-10);
    // Weekly timestamps step by exactly one week
    for pair in weekly.timestamps().windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::weeks(1));
    }
}

#[test]
fn test_trend_summary_growth() {
    let timestamps: Vec<DateTime<Utc>> = (0..8).map(|i| day(i * 7)).collect();
    let values = vec![100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, 114.0];
    let series = SeriesData::new(timestamps, values).unwrap();

    let summary = series.trend_summary().unwrap();

    assert_approx_eq!(summary.total_growth_pct, 14.0, 1e-10);
    assert!(summary.avg_weekly_change_pct > 0.0);
    assert!(summary.weekly_change_std_pct >= 0.0);
}

#[test]
fn test_csv_loader_round_trip() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "date,close").unwrap();
    writeln!(file, "2022-01-03,100.5").unwrap();
    writeln!(file, "2022-01-10,101.25").unwrap();
    writeln!(file, "2022-01-17,99.75").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.len(), 3);
    assert_approx_eq!(series.values()[0], 100.5, 1e-10);
    assert_approx_eq!(series.values()[2], 99.75, 1e-10);
    assert_eq!(series.timestamps()[0], day(0));
}

#[test]
fn test_csv_loader_sorts_rows() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "date,value").unwrap();
    writeln!(file, "2022-01-17,3.0").unwrap();
    writeln!(file, "2022-01-03,1.0").unwrap();
    writeln!(file, "2022-01-10,2.0").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
}

#[test]
fn test_csv_loader_keeps_missing_values_as_nan() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "date,close").unwrap();
    writeln!(file, "2022-01-03,100.0").unwrap();
    writeln!(file, "2022-01-10,").unwrap();
    writeln!(file, "2022-01-17,102.0").unwrap();
    file.flush().unwrap();

    let series = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(series.len(), 3);
    assert!(series.values()[1].is_nan());
}

#[test]
fn test_csv_loader_rejects_missing_columns() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,b").unwrap();
    writeln!(file, "1,2").unwrap();
    file.flush().unwrap();

    assert!(DataLoader::from_csv(file.path()).is_err());
}
