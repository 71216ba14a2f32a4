use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use crate::manager_prophet::errors::ProphetError;

/// Inputs needed to simulate forecast uncertainty for a set of prediction rows
pub struct UncertaintyInput<'a> {
    /// Scaled times of the prediction rows
    pub t: &'a [f64],
    /// Point forecasts of the prediction rows, unscaled
    pub yhat: &'a [f64],
    /// Fitted changepoint deltas
    pub deltas: &'a [f64],
    /// Number of changepoints the model was fitted with
    pub n_changepoints: usize,
    /// Scaled observation noise
    pub sigma: f64,
    pub y_scale: f64,
}

/// Simulates the predictive distribution and returns lower and upper bounds per row
///
/// Every draw samples new changepoints beyond the end of the history (Poisson count at the
/// historical changepoint rate, uniform positions, Laplace magnitudes with the mean absolute
/// fitted delta as scale) and Gaussian observation noise. Each draw is used together with
/// its mirror around the point forecast. Bounds are linearly interpolated quantiles of the
/// samples at `(1 ∓ width) / 2`, kept on either side of the point forecast.
///
/// # Arguments
///
/// * 'input' - rows and fitted quantities
/// * 'samples' - number of samples per row
/// * 'interval_width' - probability mass between the bounds
/// * 'seed' - seed of the random generator
pub fn interval_bounds(input: &UncertaintyInput, samples: usize, interval_width: f64, seed: u64)
    -> Result<Vec<(f64, f64)>, ProphetError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = input.t.len();
    let draws = samples.div_ceil(2).max(1);
    let t_max = input.t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let noise = Normal::new(0.0, input.sigma)
        .map_err(|e| ProphetError::Sampling(format!("observation noise: {}", e)))?;
    let magnitude = Exp::new(1.0 / (mean_abs(input.deltas) + 1e-8))
        .map_err(|e| ProphetError::Sampling(format!("changepoint magnitude: {}", e)))?;
    let rate = input.n_changepoints as f64 * (t_max - 1.0);
    let changes = if rate > 0.0 {
        Some(Poisson::new(rate).map_err(|e| ProphetError::Sampling(format!("changepoint count: {}", e)))?)
    } else {
        None
    };

    let mut sampled: Vec<Vec<f64>> = vec![Vec::with_capacity(2 * draws); rows];

    for _ in 0..draws {
        let n_changes = match &changes {
            Some(poisson) => {
                let count: f64 = poisson.sample(&mut rng);
                count as usize
            },
            None => 0,
        };
        let new_changepoints = (0..n_changes)
            .map(|_| {
                let s = 1.0 + rng.gen_range(0.0..1.0) * (t_max - 1.0);
                (s, laplace(&mut rng, &magnitude))
            })
            .collect::<Vec<(f64, f64)>>();

        for (i, t) in input.t.iter().enumerate() {
            let trend = new_changepoints.iter()
                .filter(|(s, _)| *t >= *s)
                .map(|(s, delta)| delta * (t - s))
                .sum::<f64>();
            let deviation = (trend + noise.sample(&mut rng)) * input.y_scale;

            sampled[i].push(input.yhat[i] + deviation);
            sampled[i].push(input.yhat[i] - deviation);
        }
    }

    let lower_q = (1.0 - interval_width) / 2.0;
    let upper_q = (1.0 + interval_width) / 2.0;

    let bounds = sampled.iter_mut()
        .zip(input.yhat)
        .map(|(values, yhat)| {
            values.sort_by(|a, b| a.total_cmp(b));
            let lower = quantile(values, lower_q).min(*yhat);
            let upper = quantile(values, upper_q).max(*yhat);
            (lower, upper)
        })
        .collect();

    Ok(bounds)
}

/// Linearly interpolated quantile of sorted values
///
/// # Arguments
///
/// * 'sorted' - values sorted ascending
/// * 'q' - quantile in [0, 1]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = position.floor() as usize;
    let hi = position.ceil() as usize;
    let fraction = position - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * fraction
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Laplace draw with location zero, an exponential magnitude with a random sign
fn laplace(rng: &mut StdRng, magnitude: &Exp<f64>) -> f64 {
    let value = magnitude.sample(rng);
    if rng.gen_bool(0.5) { value } else { -value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(t: &'a [f64], yhat: &'a [f64], deltas: &'a [f64]) -> UncertaintyInput<'a> {
        UncertaintyInput { t, yhat, deltas, n_changepoints: deltas.len(), sigma: 0.1, y_scale: 10.0 }
    }

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 0.5), 3.0);
        assert_eq!(quantile(&v, 1.0), 5.0);
        assert_eq!(quantile(&v, 0.125), 1.5);
    }

    #[test]
    fn bounds_surround_point_forecast() {
        let t = [0.0, 0.5, 1.0, 1.02];
        let yhat = [1.0, 2.0, 3.0, 3.1];
        let deltas = [0.2, -0.1, 0.05];

        let bounds = interval_bounds(&input(&t, &yhat, &deltas), 1000, 0.8, 0).unwrap();
        for ((lower, upper), y) in bounds.iter().zip(yhat.iter()) {
            assert!(lower < y && y < upper);
        }
    }

    #[test]
    fn historical_width_matches_noise() {
        let t = [0.0, 0.5, 1.0];
        let yhat = [0.0, 0.0, 0.0];
        let deltas = [0.0];

        let bounds = interval_bounds(&input(&t, &yhat, &deltas), 4000, 0.95, 7).unwrap();
        // noise sd is 0.1 * 10 = 1, so the 95% interval is about +-1.96
        for (lower, upper) in bounds {
            assert!((upper - 1.96).abs() < 0.2);
            assert!((lower + 1.96).abs() < 0.2);
        }
    }

    #[test]
    fn wider_interval_never_narrower() {
        let t = [0.0, 0.5, 1.0, 1.05];
        let yhat = [1.0, 2.0, 3.0, 3.1];
        let deltas = [0.2, -0.1, 0.05];
        let i = input(&t, &yhat, &deltas);

        let narrow = interval_bounds(&i, 1000, 0.5, 3).unwrap();
        let wide = interval_bounds(&i, 1000, 0.95, 3).unwrap();
        for (n, w) in narrow.iter().zip(wide.iter()) {
            assert!(w.0 <= n.0);
            assert!(w.1 >= n.1);
        }
    }

    #[test]
    fn same_seed_same_bounds() {
        let t = [0.0, 1.0, 1.1];
        let yhat = [1.0, 2.0, 2.1];
        let deltas = [0.3];
        let i = input(&t, &yhat, &deltas);

        assert_eq!(interval_bounds(&i, 200, 0.9, 11).unwrap(), interval_bounds(&i, 200, 0.9, 11).unwrap());
    }

    #[test]
    fn undefined_noise_is_a_sampling_error() {
        let t = [0.0, 1.0];
        let yhat = [1.0, 2.0];
        let deltas = [0.1];
        let i = UncertaintyInput { t: &t, yhat: &yhat, deltas: &deltas, n_changepoints: 1, sigma: f64::NAN, y_scale: 1.0 };

        assert!(matches!(interval_bounds(&i, 10, 0.8, 0), Err(ProphetError::Sampling(_))));
    }

    #[test]
    fn laplace_is_centered() {
        let mut rng = StdRng::seed_from_u64(2);
        let n = 20000;
        let magnitude = Exp::new(1.0).unwrap();
        let draws = (0..n).map(|_| laplace(&mut rng, &magnitude)).collect::<Vec<f64>>();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let mean_abs = mean_abs(&draws);
        assert!(mean.abs() < 0.05);
        assert!((mean_abs - 1.0).abs() < 0.05);
    }
}
