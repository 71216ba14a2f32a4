pub mod errors;
mod seasonality;
mod solver;
mod trend;
mod uncertainty;

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};
use crate::config::ModelParameters;
use crate::forecaster::{horizon_step, ForecastRow, ForecastTable, Forecaster, ModelParams, HORIZON_PERIODS};
use crate::manager_prophet::errors::ProphetError;
use crate::manager_prophet::seasonality::{detect_seasonalities, fourier_features, Seasonality};
use crate::manager_prophet::solver::{fit_map, Priors};
use crate::manager_prophet::trend::{changepoint_times, linear_init, piecewise_linear, trend_features};
use crate::manager_prophet::uncertainty::{interval_bounds, UncertaintyInput};
use crate::series::{Series, MIN_OBSERVATIONS};

/// Fitted quantities needed for prediction
struct FittedModel {
    start: NaiveDateTime,
    t_scale: f64,
    y_scale: f64,
    changepoints_t: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    k: f64,
    m: f64,
    deltas: Vec<f64>,
    betas: Vec<f64>,
    sigma: f64,
    history_dates: Vec<NaiveDateTime>,
}

/// Additive regression forecasting model with a piecewise linear trend and Fourier seasonalities
///
/// The model is `y(t) = g(t) + s(t) + e` where `g` is linear with rate changes at changepoints
/// spread over the early history (Laplace prior on the changes), `s` is a sum of Fourier series
/// for the seasonalities the history supports, and `e` is Gaussian noise. Parameters are the
/// MAP estimate. Uncertainty intervals come from simulating future trend changes and noise.
pub struct Prophet {
    settings: ModelParameters,
    changepoint_prior_scale: f64,
    interval_width: f64,
    fitted: Option<FittedModel>,
}

impl Prophet {
    /// Returns a new, unfitted, model
    ///
    /// # Arguments
    ///
    /// * 'settings' - engine settings
    /// * 'params' - the request supplied changepoint prior scale and interval width
    pub fn new(settings: &ModelParameters, params: &ModelParams) -> Result<Prophet, ProphetError> {
        if !(params.changepoint_prior_scale > 0.0 && params.changepoint_prior_scale.is_finite()) {
            return Err(ProphetError::InvalidParameter(
                format!("changepoint_prior_scale must be positive, got {}", params.changepoint_prior_scale)));
        }
        if !(params.interval_width > 0.0 && params.interval_width < 1.0) {
            return Err(ProphetError::InvalidParameter(
                format!("interval_width must be in (0, 1), got {}", params.interval_width)));
        }

        Ok(Prophet {
            settings: settings.clone(),
            changepoint_prior_scale: params.changepoint_prior_scale,
            interval_width: params.interval_width,
            fitted: None,
        })
    }

    /// Fits the model to the observed rows of the series
    ///
    /// Rows are sorted by timestamp first, rows without a value are left out of the fit but
    /// their timestamps remain part of the history.
    ///
    /// # Arguments
    ///
    /// * 'series' - the series table
    pub fn fit(&mut self, series: &Series) -> Result<(), ProphetError> {
        let mut history = series.observed().collect::<Vec<(NaiveDateTime, f64)>>();
        if history.len() < MIN_OBSERVATIONS {
            return Err(ProphetError::InsufficientData { needed: MIN_OBSERVATIONS, got: history.len() });
        }
        history.sort_by_key(|(ds, _)| *ds);

        let start = history[0].0;
        let end = history[history.len() - 1].0;
        let t_scale = seconds(end - start);
        if t_scale <= 0.0 {
            let mut distinct = history.iter().map(|(ds, _)| *ds).collect::<Vec<NaiveDateTime>>();
            distinct.dedup();
            return Err(ProphetError::InsufficientData { needed: MIN_OBSERVATIONS, got: distinct.len() });
        }

        let y_scale = match history.iter().map(|(_, y)| y.abs()).fold(0.0, f64::max) {
            s if s > 0.0 => s,
            _ => 1.0,
        };

        let dates = history.iter().map(|(ds, _)| *ds).collect::<Vec<NaiveDateTime>>();
        let t = dates.iter().map(|ds| seconds(*ds - start) / t_scale).collect::<Vec<f64>>();
        let y = history.iter().map(|(_, y)| y / y_scale).collect::<Vec<f64>>();

        let changepoints_t = changepoint_times(&t, self.settings.n_changepoints, self.settings.changepoint_range);
        let seasonalities = detect_seasonalities(&dates);
        let n_seasonal = seasonalities.iter().map(|s| s.width()).sum::<usize>();

        let x = dates.iter()
            .zip(t.iter())
            .map(|(ds, t)| {
                let mut row = trend_features(*t, &changepoints_t);
                row.extend(fourier_features(ds, &seasonalities));
                row
            })
            .collect::<Vec<Vec<f64>>>();

        let (k0, m0) = linear_init(&t, &y);
        let mut init = vec![0.0; 2 + changepoints_t.len() + n_seasonal];
        init[0] = k0;
        init[1] = m0;

        let priors = Priors {
            n_changepoints: changepoints_t.len(),
            n_seasonal,
            changepoint_prior_scale: self.changepoint_prior_scale,
            seasonality_prior_scale: self.settings.seasonality_prior_scale,
        };
        let fit = fit_map(&x, &y, &priors, &init)?;
        if !fit.converged {
            warn!("model fit stopped after {} iterations without converging", fit.iterations);
        }

        debug!("fitted {} rows, {} changepoints, seasonalities: [{}]",
            history.len(), changepoints_t.len(),
            seasonalities.iter().map(|s| s.name).collect::<Vec<&str>>().join(", "));

        let n_cp = changepoints_t.len();
        let mut history_dates = series.timestamps().collect::<Vec<NaiveDateTime>>();
        history_dates.sort();
        history_dates.dedup();

        self.fitted = Some(FittedModel {
            start,
            t_scale,
            y_scale,
            changepoints_t,
            seasonalities,
            k: fit.theta[0],
            m: fit.theta[1],
            deltas: fit.theta[2..2 + n_cp].to_vec(),
            betas: fit.theta[2 + n_cp..].to_vec(),
            sigma: fit.sigma,
            history_dates,
        });

        Ok(())
    }

    /// Returns the distinct history timestamps, ascending, extended by `periods` steps of `freq`
    /// past the last one
    ///
    /// # Arguments
    ///
    /// * 'periods' - number of future periods
    /// * 'freq' - step between future periods
    pub fn make_future_dates(&self, periods: usize, freq: TimeDelta) -> Result<Vec<NaiveDateTime>, ProphetError> {
        let fitted = self.fitted.as_ref().ok_or(ProphetError::NotFitted)?;
        if freq <= TimeDelta::zero() {
            return Err(ProphetError::InvalidParameter("future frequency must be positive".to_string()));
        }

        let mut dates = fitted.history_dates.clone();
        let last = *dates.last().ok_or(ProphetError::NotFitted)?;
        for i in 1..=periods {
            let step = freq.checked_mul(i as i32)
                .ok_or_else(|| ProphetError::InvalidParameter("future horizon overflows".to_string()))?;
            let ds = last.checked_add_signed(step)
                .ok_or_else(|| ProphetError::InvalidParameter("future horizon overflows".to_string()))?;
            dates.push(ds);
        }

        Ok(dates)
    }

    /// Predicts point forecasts and uncertainty bounds for the given timestamps
    ///
    /// # Arguments
    ///
    /// * 'dates' - timestamps to predict for
    pub fn predict(&self, dates: &[NaiveDateTime]) -> Result<ForecastTable, ProphetError> {
        let fitted = self.fitted.as_ref().ok_or(ProphetError::NotFitted)?;

        let t = dates.iter()
            .map(|ds| seconds(*ds - fitted.start) / fitted.t_scale)
            .collect::<Vec<f64>>();

        let yhat = dates.iter()
            .zip(t.iter())
            .map(|(ds, t)| {
                let trend = piecewise_linear(*t, fitted.k, fitted.m, &fitted.deltas, &fitted.changepoints_t);
                let seasonal = fourier_features(ds, &fitted.seasonalities)
                    .iter()
                    .zip(fitted.betas.iter())
                    .map(|(x, b)| x * b)
                    .sum::<f64>();
                (trend + seasonal) * fitted.y_scale
            })
            .collect::<Vec<f64>>();

        let input = UncertaintyInput {
            t: &t,
            yhat: &yhat,
            deltas: &fitted.deltas,
            n_changepoints: fitted.changepoints_t.len(),
            sigma: fitted.sigma,
            y_scale: fitted.y_scale,
        };
        let bounds = interval_bounds(&input, self.settings.uncertainty_samples, self.interval_width, self.settings.seed)?;

        let rows = dates.iter()
            .zip(yhat.iter())
            .zip(bounds.iter())
            .map(|((ds, yhat), (lower, upper))| ForecastRow {
                ds: *ds,
                yhat: *yhat,
                yhat_lower: *lower,
                yhat_upper: *upper,
            })
            .collect();

        Ok(ForecastTable { rows })
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Forecaster running a fresh model per call with a one hour, one period horizon
pub struct ProphetForecaster {
    settings: ModelParameters,
}

impl ProphetForecaster {
    pub fn new(settings: ModelParameters) -> Self {
        Self { settings }
    }
}

impl Forecaster for ProphetForecaster {
    type Error = ProphetError;

    fn forecast(&self, series: &Series, params: &ModelParams) -> Result<ForecastTable, ProphetError> {
        let mut model = Prophet::new(&self.settings, params)?;
        model.fit(series)?;
        let future = model.make_future_dates(HORIZON_PERIODS, horizon_step())?;

        model.predict(&future)
    }
}
