use std::f64::consts::PI;
use chrono::{NaiveDateTime, TimeDelta};

/// A Fourier series seasonal component
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    /// Period in days
    pub period: f64,
    pub fourier_order: usize,
}

impl Seasonality {
    /// Number of design matrix columns this seasonality adds
    pub fn width(&self) -> usize {
        2 * self.fourier_order
    }
}

/// Picks the default seasonalities the history can support
///
/// A seasonality is added when the history covers at least two of its periods and the
/// smallest spacing between distinct timestamps is shorter than the period (yearly only
/// checks the span).
///
/// # Arguments
///
/// * 'dates' - history timestamps, sorted ascending
pub fn detect_seasonalities(dates: &[NaiveDateTime]) -> Vec<Seasonality> {
    let mut seasonalities = Vec::new();
    let (first, last) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return seasonalities,
    };
    let span = last - first;
    let min_spacing = dates.windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > TimeDelta::zero())
        .min();

    if span >= TimeDelta::days(730) {
        seasonalities.push(Seasonality { name: "yearly", period: 365.25, fourier_order: 10 });
    }
    if span >= TimeDelta::weeks(2) && min_spacing.is_some_and(|d| d < TimeDelta::weeks(1)) {
        seasonalities.push(Seasonality { name: "weekly", period: 7.0, fourier_order: 3 });
    }
    if span >= TimeDelta::days(2) && min_spacing.is_some_and(|d| d < TimeDelta::days(1)) {
        seasonalities.push(Seasonality { name: "daily", period: 1.0, fourier_order: 4 });
    }

    seasonalities
}

/// Seasonal columns of one design matrix row
///
/// Columns are ordered sin(1), cos(1), sin(2), cos(2), ... per seasonality, with time
/// measured in days since the unix epoch.
///
/// # Arguments
///
/// * 'ds' - the timestamp
/// * 'seasonalities' - the model seasonalities
pub fn fourier_features(ds: &NaiveDateTime, seasonalities: &[Seasonality]) -> Vec<f64> {
    let days = ds.and_utc().timestamp_millis() as f64 / 1000.0 / 86400.0;
    let mut row = Vec::with_capacity(seasonalities.iter().map(|s| s.width()).sum());

    for s in seasonalities {
        for i in 1..=s.fourier_order {
            let x = 2.0 * i as f64 * PI * days / s.period;
            row.push(x.sin());
            row.push(x.cos());
        }
    }

    row
}
