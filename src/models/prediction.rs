use std::collections::BTreeMap;
use serde::Deserialize;

/// Request body of a prediction invocation
#[derive(Deserialize, Debug)]
pub struct PredictionInput {
    pub input: PredictionDataFrame,
    pub changepoint_prior_scale: f64,
    pub interval_width: f64,
    /// Sent by some callers, the horizon step does not depend on it
    #[serde(default)]
    pub interval_seconds: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct PredictionDataFrame {
    pub ds: Column<String>,
    pub y: Column<Option<f64>>,
}

/// A data frame column, either a plain array or an object keyed by row index
#[derive(Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Column<T> {
    List(Vec<T>),
    Indexed(BTreeMap<String, T>),
}

impl<T> Column<T> {
    pub fn len(&self) -> usize {
        match self {
            Column::List(v) => v.len(),
            Column::Indexed(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the column shape as used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Column::List(_) => "an array",
            Column::Indexed(_) => "an indexed object",
        }
    }
}
