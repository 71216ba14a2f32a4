use log::debug;
use crate::manager_prophet::errors::ProphetError;

/// Standard deviation of the normal priors on the growth rate and offset
const TREND_PRIOR_SD: f64 = 5.0;

/// Smallest observation noise the fit will settle on, in scaled units
const SIGMA_FLOOR: f64 = 1e-4;

/// Smallest delta magnitude used when reweighting the Laplace prior
const DELTA_FLOOR: f64 = 1e-8;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-9;

/// Prior settings of the MAP problem
#[derive(Debug, Clone, Copy)]
pub struct Priors {
    pub n_changepoints: usize,
    pub n_seasonal: usize,
    /// Laplace scale of the changepoint deltas
    pub changepoint_prior_scale: f64,
    /// Normal standard deviation of the seasonal coefficients
    pub seasonality_prior_scale: f64,
}

impl Priors {
    fn width(&self) -> usize {
        2 + self.n_changepoints + self.n_seasonal
    }
}

/// Maximum a posteriori parameters
///
/// `theta` is laid out as `[k, m, deltas..., betas...]`.
#[derive(Debug, Clone)]
pub struct MapFit {
    pub theta: Vec<f64>,
    pub sigma: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Finds the MAP estimate of the additive model
///
/// Minimizes `RSS/2σ² + N ln σ + (k² + m²)/2·5² + Σ|δ|/τ + 2σ² + Σβ²/2s²`. The Laplace prior on
/// the deltas is replaced by a quadratic bound around the previous iterate so every step is a
/// ridge regression solved through the normal equations, followed by the closed form update
/// of σ given the residuals.
///
/// # Arguments
///
/// * 'x' - design matrix rows `[t, 1, ramps..., fourier...]`
/// * 'y' - scaled observations
/// * 'priors' - prior settings
/// * 'init' - starting parameters
pub fn fit_map(x: &[Vec<f64>], y: &[f64], priors: &Priors, init: &[f64]) -> Result<MapFit, ProphetError> {
    let p = priors.width();
    if init.len() != p || x.iter().any(|row| row.len() != p) || x.len() != y.len() {
        return Err(ProphetError::Fit(format!("design matrix does not match {} parameters", p)));
    }

    let (xtx, xty) = normal_equations(x, y);
    let n = y.len() as f64;

    let mut theta = init.to_vec();
    let mut delta_scale = vec![priors.changepoint_prior_scale; priors.n_changepoints];
    let mut sigma2 = sigma_squared(residual_sum_of_squares(x, y, &theta), n);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let precision = precisions(priors, &delta_scale);
        let mut a = xtx.clone();
        for (i, row) in a.iter_mut().enumerate() {
            row[i] += sigma2 * precision[i];
        }

        let next = solve_with_jitter(&a, &xty)
            .ok_or_else(|| ProphetError::Fit("normal equations are singular".to_string()))?;
        let next_sigma2 = sigma_squared(residual_sum_of_squares(x, y, &next), n);

        let step = next.iter().zip(theta.iter()).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
        let sigma_step = (next_sigma2 - sigma2).abs() / sigma2;

        theta = next;
        sigma2 = next_sigma2;
        for (j, scale) in delta_scale.iter_mut().enumerate() {
            *scale = theta[2 + j].abs().max(DELTA_FLOOR);
        }

        if step < TOLERANCE && sigma_step < TOLERANCE {
            converged = true;
            break;
        }
    }

    if theta.iter().any(|v| !v.is_finite()) || !sigma2.is_finite() {
        return Err(ProphetError::Fit("parameters are not finite".to_string()));
    }

    debug!("map fit: {} iterations, converged: {}, sigma: {:.6}", iterations, converged, sigma2.sqrt());

    Ok(MapFit { theta, sigma: sigma2.sqrt(), iterations, converged })
}

/// Prior precisions per parameter, deltas reweighted from their current magnitude
fn precisions(priors: &Priors, delta_scale: &[f64]) -> Vec<f64> {
    let trend = 1.0 / (TREND_PRIOR_SD * TREND_PRIOR_SD);
    let seasonal = 1.0 / (priors.seasonality_prior_scale * priors.seasonality_prior_scale);

    let mut precision = Vec::with_capacity(priors.width());
    precision.push(trend);
    precision.push(trend);
    precision.extend(delta_scale.iter().map(|d| 1.0 / (priors.changepoint_prior_scale * d)));
    precision.extend(std::iter::repeat_n(seasonal, priors.n_seasonal));

    precision
}

/// σ² minimizing `RSS/2σ² + N ln σ + 2σ²`, i.e. the positive root of `4σ⁴ + Nσ² - RSS = 0`
///
/// # Arguments
///
/// * 'rss' - residual sum of squares
/// * 'n' - number of observations
pub fn sigma_squared(rss: f64, n: f64) -> f64 {
    let root = (-n + (n * n + 16.0 * rss).sqrt()) / 8.0;
    root.max(SIGMA_FLOOR * SIGMA_FLOOR)
}

fn normal_equations(x: &[Vec<f64>], y: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let p = x.first().map(|r| r.len()).unwrap_or(0);
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for (row, y) in x.iter().zip(y) {
        for i in 0..p {
            xty[i] += row[i] * y;
            for j in i..p {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..p {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    (xtx, xty)
}

fn residual_sum_of_squares(x: &[Vec<f64>], y: &[f64], theta: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(row, y)| {
            let fitted = row.iter().zip(theta).map(|(a, b)| a * b).sum::<f64>();
            (y - fitted).powi(2)
        })
        .sum()
}

/// Solves `a·x = b`, adding a growing ridge to the diagonal if `a` is not numerically
/// positive definite
fn solve_with_jitter(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    if let Some(x) = cholesky_solve(a, b) {
        return Some(x);
    }

    let p = a.len();
    let mean_diag = (0..p).map(|i| a[i][i].abs()).sum::<f64>() / p.max(1) as f64;
    let mut jitter = mean_diag.max(1.0) * 1e-12;
    for _ in 0..8 {
        let mut jittered = a.to_vec();
        for (i, row) in jittered.iter_mut().enumerate() {
            row[i] += jitter;
        }
        if let Some(x) = cholesky_solve(&jittered, b) {
            return Some(x);
        }
        jitter *= 100.0;
    }

    None
}

/// Cholesky decomposition and forward/back substitution of a symmetric positive definite system
///
/// # Arguments
///
/// * 'a' - symmetric matrix
/// * 'b' - right hand side
pub fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let p = a.len();
    let mut l = vec![vec![0.0; p]; p];

    for i in 0..p {
        for j in 0..=i {
            let sum = (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                let d = a[i][i] - sum;
                if d <= 0.0 || !d.is_finite() {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; p];
    for i in 0..p {
        let sum = (0..i).map(|k| l[i][k] * z[k]).sum::<f64>();
        z[i] = (b[i] - sum) / l[i][i];
    }

    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let sum = (i + 1..p).map(|k| l[k][i] * x[k]).sum::<f64>();
        x[i] = (z[i] - sum) / l[i][i];
    }

    Some(x)
}
