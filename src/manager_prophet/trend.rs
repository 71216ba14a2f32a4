/// Places changepoints evenly over the first part of the history
///
/// Positions are taken from the sorted history at indices `round(linspace(0, hist_size - 1,
/// n + 1))[1..]` where `hist_size` is the share of the history given by `changepoint_range`.
/// The number of changepoints shrinks if the history is too short. Without any changepoint a
/// single dummy changepoint at time zero is returned so the trend always carries a delta.
///
/// # Arguments
///
/// * 't' - scaled history times, sorted ascending
/// * 'n_changepoints' - wanted number of changepoints
/// * 'changepoint_range' - share of the history where changepoints may be placed
pub fn changepoint_times(t: &[f64], n_changepoints: usize, changepoint_range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * changepoint_range).floor() as usize;
    let n_changepoints = if n_changepoints + 1 > hist_size {
        hist_size.saturating_sub(1)
    } else {
        n_changepoints
    };

    if n_changepoints == 0 {
        return vec![0.0];
    }

    let step = (hist_size - 1) as f64 / n_changepoints as f64;
    (1..=n_changepoints)
        .map(|i| {
            let position = if i == n_changepoints {
                (hist_size - 1) as f64
            } else {
                i as f64 * step
            };
            t[position.round_ties_even() as usize]
        })
        .collect()
}

/// Evaluates the piecewise linear trend at time t
///
/// # Arguments
///
/// * 't' - scaled time
/// * 'k' - base growth rate
/// * 'm' - offset
/// * 'deltas' - rate adjustments, one per changepoint
/// * 'changepoints' - scaled changepoint times
pub fn piecewise_linear(t: f64, k: f64, m: f64, deltas: &[f64], changepoints: &[f64]) -> f64 {
    let mut value = k * t + m;
    for (delta, s) in deltas.iter().zip(changepoints) {
        if t >= *s {
            value += delta * (t - s);
        }
    }

    value
}

/// Trend columns of one design matrix row: t, 1 and one ramp per changepoint
///
/// # Arguments
///
/// * 't' - scaled time
/// * 'changepoints' - scaled changepoint times
pub fn trend_features(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(t);
    row.push(1.0);
    for s in changepoints {
        row.push(if t >= *s { t - s } else { 0.0 });
    }

    row
}

/// Linear trend through the first and last observation, used to start the fit
///
/// # Arguments
///
/// * 't' - scaled times, sorted
/// * 'y' - scaled values
pub fn linear_init(t: &[f64], y: &[f64]) -> (f64, f64) {
    let (t0, t1) = (t[0], t[t.len() - 1]);
    let (y0, y1) = (y[0], y[y.len() - 1]);
    let k = if t1 - t0 > 0.0 { (y1 - y0) / (t1 - t0) } else { 0.0 };
    let m = y0 - k * t0;

    (k, m)
}
