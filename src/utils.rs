//! Shared numeric helpers: splitting, differencing, aggregation, smoothing

/// Split a series into training and test slices at `train_fraction`.
///
/// The split index is `floor(len * train_fraction)`, matching the 80/20
/// convention used throughout the evaluation harness.
pub fn train_test_split(values: &[f64], train_fraction: f64) -> (Vec<f64>, Vec<f64>) {
    if values.is_empty() || train_fraction <= 0.0 || train_fraction >= 1.0 {
        return (values.to_vec(), Vec::new());
    }

    let train_size = (values.len() as f64 * train_fraction).floor() as usize;
    let train = values[..train_size].to_vec();
    let test = values[train_size..].to_vec();

    (train, test)
}

/// Apply ordinary differencing of order `d`.
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || values.is_empty() {
        return values.to_vec();
    }

    let mut result = values.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing of order `d` at the given period.
pub fn seasonal_difference(values: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 || values.len() <= period {
        return values.to_vec();
    }

    let mut result = values.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            break;
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Integrate (undo ordinary differencing) a forecast made on the
/// differenced scale, using the original series for initial values.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let init = if level == 0 {
            *original.last().unwrap_or(&0.0)
        } else {
            *difference(original, level).last().unwrap_or(&0.0)
        };

        let mut cumsum = init;
        result = result
            .iter()
            .map(|&diff| {
                cumsum += diff;
                cumsum
            })
            .collect();
    }

    result
}

/// Integrate (undo seasonal differencing) a forecast made on the
/// seasonally differenced scale. `original` is the series as it looked
/// before the seasonal differencing was applied.
pub fn seasonal_integrate(
    differenced: &[f64],
    original: &[f64],
    d: usize,
    period: usize,
) -> Vec<f64> {
    if d == 0 || period == 0 || differenced.is_empty() {
        return differenced.to_vec();
    }

    let mut result = differenced.to_vec();

    for level in (0..d).rev() {
        let mut history = seasonal_difference(original, level, period);
        if history.len() < period {
            return result;
        }

        let mut integrated = Vec::with_capacity(result.len());
        for &w in &result {
            let x = w + history[history.len() - period];
            history.push(x);
            integrated.push(x);
        }
        result = integrated;
    }

    result
}

/// Median of a slice. Returns NaN on empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Mean after discarding `floor(n * proportion)` values from each tail of
/// the sorted sample. Returns NaN on empty input.
pub fn trimmed_mean(values: &[f64], proportion: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let cut = (sorted.len() as f64 * proportion).floor() as usize;
    let kept = &sorted[cut..sorted.len() - cut];
    if kept.is_empty() {
        return median(&sorted);
    }
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Savitzky-Golay smoothing with a degree-2 local polynomial.
///
/// `window` must be odd and at least 3; the input must be at least as long
/// as the window. Interior points use the closed-form quadratic kernel;
/// the first and last half-windows are smoothed by fitting a quadratic to
/// the leading (trailing) `window` points and evaluating it there.
pub fn savgol_filter(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window < 3 || window % 2 == 0 || n < window {
        return values.to_vec();
    }

    let m = window / 2;
    let kernel = quadratic_kernel(m);

    let mut smoothed = vec![0.0; n];
    for t in m..n - m {
        let mut acc = 0.0;
        for (k, &c) in kernel.iter().enumerate() {
            acc += c * values[t - m + k];
        }
        smoothed[t] = acc;
    }

    // Edge handling: evaluate a quadratic fitted over the boundary window.
    let head = fit_quadratic(&values[..window]);
    for (t, out) in smoothed.iter_mut().take(m).enumerate() {
        *out = eval_quadratic(&head, t as f64);
    }
    let tail = fit_quadratic(&values[n - window..]);
    for t in n - m..n {
        let x = (t - (n - window)) as f64;
        smoothed[t] = eval_quadratic(&tail, x);
    }

    smoothed
}

/// Closed-form degree-2 Savitzky-Golay kernel for half-width `m`.
fn quadratic_kernel(m: usize) -> Vec<f64> {
    let mf = m as f64;
    let norm = (2.0 * mf + 3.0) * (2.0 * mf + 1.0) * (2.0 * mf - 1.0);
    let base = 3.0 * (3.0 * mf * mf + 3.0 * mf - 1.0);

    (-(m as i64)..=m as i64)
        .map(|i| {
            let fi = i as f64;
            (base - 15.0 * fi * fi) / norm
        })
        .collect()
}

/// Least-squares quadratic fit over `values` at positions 0..len.
/// Returns coefficients (c0, c1, c2) of c0 + c1*x + c2*x^2.
fn fit_quadratic(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;

    let (mut sx, mut sx2, mut sx3, mut sx4) = (0.0, 0.0, 0.0, 0.0);
    let (mut sy, mut sxy, mut sx2y) = (0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        sx += x;
        sx2 += x2;
        sx3 += x2 * x;
        sx4 += x2 * x2;
        sy += y;
        sxy += x * y;
        sx2y += x2 * y;
    }

    // Solve the 3x3 normal equations by Cramer's rule.
    let det = det3(n, sx, sx2, sx, sx2, sx3, sx2, sx3, sx4);
    if det.abs() < 1e-12 {
        let mean = sy / n;
        return (mean, 0.0, 0.0);
    }

    let c0 = det3(sy, sx, sx2, sxy, sx2, sx3, sx2y, sx3, sx4) / det;
    let c1 = det3(n, sy, sx2, sx, sxy, sx3, sx2, sx2y, sx4) / det;
    let c2 = det3(n, sx, sy, sx, sx2, sxy, sx2, sx3, sx2y) / det;

    (c0, c1, c2)
}

fn eval_quadratic(coeffs: &(f64, f64, f64), x: f64) -> f64 {
    coeffs.0 + coeffs.1 * x + coeffs.2 * x * x
}

#[allow(clippy::too_many_arguments)]
fn det3(
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
) -> f64 {
    a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
}
