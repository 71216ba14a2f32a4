use std::fmt::Display;
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize, Serializer};
use serde::ser::SerializeMap;
use crate::series::Series;

/// Number of future periods appended to the time axis before prediction
pub const HORIZON_PERIODS: usize = 1;

/// Step between future periods
pub fn horizon_step() -> TimeDelta {
    TimeDelta::hours(1)
}

/// Request supplied model parameters, everything else keeps engine defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub changepoint_prior_scale: f64,
    pub interval_width: f64,
}

/// Narrow interface to the forecasting engine
///
/// Takes the historical series and the two request parameters and returns one forecast row
/// per historical timestamp plus the future rows.
pub trait Forecaster {
    type Error: Display;

    fn forecast(&self, series: &Series, params: &ModelParams) -> Result<ForecastTable, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRow {
    pub ds: NaiveDateTime,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Layout of the serialized forecast table
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodyLayout {
    /// Column oriented with row index keys and epoch millisecond timestamps
    #[default]
    Columns,
    /// Column oriented plain arrays with ISO-8601 timestamps
    Arrays,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the ds, yhat, yhat_lower and yhat_upper columns
    ///
    /// # Arguments
    ///
    /// * 'layout' - the body layout to produce
    pub fn to_json(&self, layout: BodyLayout) -> Result<String, serde_json::Error> {
        match layout {
            BodyLayout::Columns => {
                let body = IndexedBody {
                    ds: IndexedColumn(self.rows.iter().map(|r| r.ds.and_utc().timestamp_millis()).collect()),
                    yhat: IndexedColumn(self.rows.iter().map(|r| r.yhat).collect()),
                    yhat_lower: IndexedColumn(self.rows.iter().map(|r| r.yhat_lower).collect()),
                    yhat_upper: IndexedColumn(self.rows.iter().map(|r| r.yhat_upper).collect()),
                };
                serde_json::to_string(&body)
            },
            BodyLayout::Arrays => {
                let body = ArrayBody {
                    ds: self.rows.iter().map(|r| format_timestamp(&r.ds)).collect(),
                    yhat: self.rows.iter().map(|r| r.yhat).collect(),
                    yhat_lower: self.rows.iter().map(|r| r.yhat_lower).collect(),
                    yhat_upper: self.rows.iter().map(|r| r.yhat_upper).collect(),
                };
                serde_json::to_string(&body)
            },
        }
    }
}

/// Formats a timestamp the way the input timestamps are usually given
///
/// # Arguments
///
/// * 'ds' - the timestamp to format
pub fn format_timestamp(ds: &NaiveDateTime) -> String {
    ds.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// A column serialized as an object keyed by row index, in row order
struct IndexedColumn<T>(Vec<T>);

impl<T: Serialize> Serialize for IndexedColumn<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, v) in self.0.iter().enumerate() {
            map.serialize_entry(&i.to_string(), v)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct IndexedBody {
    ds: IndexedColumn<i64>,
    yhat: IndexedColumn<f64>,
    yhat_lower: IndexedColumn<f64>,
    yhat_upper: IndexedColumn<f64>,
}

#[derive(Serialize)]
struct ArrayBody {
    ds: Vec<String>,
    yhat: Vec<f64>,
    yhat_lower: Vec<f64>,
    yhat_upper: Vec<f64>,
}
