//! Bounded Nelder-Mead simplex minimization for parameter estimation
//!
//! Used by the conditional-least-squares ARIMA/SARIMA estimators and the
//! Holt-Winters SSE optimization. Fully deterministic: the same objective
//! and starting point always produce the same optimum.

/// Standard simplex coefficients (reflection, expansion, contraction, shrink).
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Initial simplex step relative to each coordinate.
const INITIAL_STEP: f64 = 0.05;

/// Outcome of a minimization run.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// The best point found.
    pub point: Vec<f64>,
    /// Objective value at that point.
    pub value: f64,
    /// Whether the simplex converged within the iteration budget.
    pub converged: bool,
}

/// Minimize `objective` starting from `initial`, with per-coordinate
/// `bounds` clamped at every step.
pub fn minimize<F>(
    objective: F,
    initial: &[f64],
    bounds: &[(f64, f64)],
    max_iters: usize,
    tolerance: f64,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Minimum {
            point: vec![],
            value: f64::NAN,
            converged: false,
        };
    }

    let clamp = |point: &[f64]| -> Vec<f64> {
        point
            .iter()
            .enumerate()
            .map(|(i, &x)| match bounds.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect()
    };

    // Build the initial simplex: the start point plus one perturbed vertex
    // per coordinate.
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            INITIAL_STEP * initial[i].abs()
        } else {
            INITIAL_STEP
        };
        vertex[i] += step;
        simplex.push(clamp(&vertex));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();
    let mut converged = false;

    for _ in 0..max_iters {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst] - values[best] < tolerance {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; n];
        for (i, vertex) in simplex.iter().enumerate() {
            if i != worst {
                for (c, &x) in centroid.iter_mut().zip(vertex.iter()) {
                    *c += x;
                }
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }

        let blend = |towards: &[f64], coeff: f64| -> Vec<f64> {
            let moved: Vec<f64> = centroid
                .iter()
                .zip(towards.iter())
                .map(|(c, t)| c + coeff * (t - c))
                .collect();
            clamp(&moved)
        };

        // Reflection.
        let reflected = blend(&simplex[worst], -REFLECT);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            // Expansion.
            let expanded = blend(&reflected, EXPAND);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside depending on the reflected value.
        let contracted = if reflected_value < values[worst] {
            blend(&reflected, CONTRACT)
        } else {
            blend(&simplex[worst], CONTRACT)
        };
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink every vertex towards the best.
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for (x, &a) in simplex[i].iter_mut().zip(anchor.iter()) {
                    *x = a + SHRINK * (*x - a);
                }
                simplex[i] = clamp(&simplex[i]);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Minimum {
        point: simplex[best].clone(),
        value: values[best],
        converged,
    }
}
