use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crate::errors::SeriesError;
use crate::models::prediction::{Column, PredictionDataFrame};

/// Fewest observed rows a model can be fitted on
pub const MIN_OBSERVATIONS: usize = 2;

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// One row of the series table, a missing value is kept on the time axis but not fitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ds: NaiveDateTime,
    pub y: Option<f64>,
}

/// Ordered timestamp/value pairs in the order they were given
///
/// No sorting, deduplication or gap filling is done here.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    rows: Vec<Observation>,
}

impl Series {
    /// Builds a series from parallel columns
    ///
    /// # Arguments
    ///
    /// * 'ds' - timestamps
    /// * 'y' - observed values, None for missing
    pub fn new(ds: Vec<NaiveDateTime>, y: Vec<Option<f64>>) -> Result<Series, SeriesError> {
        if ds.len() != y.len() {
            return Err(SeriesError::LengthMismatch { ds: ds.len(), y: y.len() });
        }

        let rows = ds.into_iter()
            .zip(y)
            .map(|(ds, y)| Observation { ds, y: y.filter(|v| v.is_finite()) })
            .collect::<Vec<Observation>>();

        let observed = rows.iter().filter(|r| r.y.is_some()).count();
        if observed < MIN_OBSERVATIONS {
            return Err(SeriesError::InsufficientData { needed: MIN_OBSERVATIONS, got: observed });
        }

        Ok(Series { rows })
    }

    /// Builds a series from the request data frame
    ///
    /// Array columns are paired by position, indexed columns by row key in ascending
    /// numeric key order.
    ///
    /// # Arguments
    ///
    /// * 'frame' - the input data frame of the request
    pub fn from_frame(frame: &PredictionDataFrame) -> Result<Series, SeriesError> {
        let (ds, y) = align_columns(&frame.ds, &frame.y)?;
        let ds = ds.iter()
            .map(|s| parse_timestamp(s))
            .collect::<Result<Vec<NaiveDateTime>, SeriesError>>()?;

        Series::new(ds, y)
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with an observed value
    pub fn observed(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.rows.iter().filter_map(|r| r.y.map(|y| (r.ds, y)))
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows.iter().map(|r| r.ds)
    }
}

/// Pairs up the ds and y columns into two equally long vectors
///
/// # Arguments
///
/// * 'ds' - the timestamp column
/// * 'y' - the value column
fn align_columns(ds: &Column<String>, y: &Column<Option<f64>>) -> Result<(Vec<String>, Vec<Option<f64>>), SeriesError> {
    match (ds, y) {
        (Column::List(ds), Column::List(y)) => {
            if ds.len() != y.len() {
                return Err(SeriesError::LengthMismatch { ds: ds.len(), y: y.len() });
            }
            Ok((ds.clone(), y.clone()))
        },
        (Column::Indexed(ds_map), Column::Indexed(y_map)) => {
            if ds_map.len() != y_map.len() {
                return Err(SeriesError::LengthMismatch { ds: ds_map.len(), y: y_map.len() });
            }

            let mut keys = Vec::with_capacity(ds_map.len());
            for key in ds_map.keys() {
                if !y_map.contains_key(key) {
                    return Err(SeriesError::KeyMismatch(key.clone()));
                }
                let index = key.parse::<u64>().map_err(|_| SeriesError::KeyMismatch(key.clone()))?;
                keys.push((index, key));
            }
            keys.sort_by_key(|(index, _)| *index);

            let ds = keys.iter().map(|(_, k)| ds_map[*k].clone()).collect();
            let y = keys.iter().map(|(_, k)| y_map[*k]).collect();
            Ok((ds, y))
        },
        _ => Err(SeriesError::ColumnShape { ds: ds.shape(), y: y.shape() }),
    }
}

/// Parses a naive date-time, date only values are taken as midnight
///
/// Values carrying a time zone or offset are rejected.
///
/// # Arguments
///
/// * 'value' - the timestamp string
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, SeriesError> {
    let value = value.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(ds) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ds);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(ds) = date.and_hms_opt(0, 0, 0) {
            return Ok(ds);
        }
    }

    if DateTime::parse_from_rfc3339(value).is_ok() {
        return Err(SeriesError::TimeZone(value.to_string()));
    }

    Err(SeriesError::Timestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::Timelike;

    fn frame(ds: Column<String>, y: Column<Option<f64>>) -> PredictionDataFrame {
        PredictionDataFrame { ds, y }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_common_timestamp_forms() {
        let a = parse_timestamp("2024-10-08T17:40:00").unwrap();
        let b = parse_timestamp("2024-10-08 17:40:00").unwrap();
        let c = parse_timestamp("2024-10-08T17:40").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let d = parse_timestamp("2024-10-08").unwrap();
        assert_eq!(d.hour(), 0);

        let e = parse_timestamp("2024-10-08T17:40:00.250").unwrap();
        assert_eq!(e.nanosecond(), 250_000_000);
    }

    #[test]
    fn rejects_time_zones_and_garbage() {
        assert_eq!(
            parse_timestamp("2024-10-08T17:40:00Z"),
            Err(SeriesError::TimeZone("2024-10-08T17:40:00Z".to_string()))
        );
        assert_eq!(
            parse_timestamp("2024-10-08T17:40:00+02:00"),
            Err(SeriesError::TimeZone("2024-10-08T17:40:00+02:00".to_string()))
        );
        assert_eq!(
            parse_timestamp("not a date"),
            Err(SeriesError::Timestamp("not a date".to_string()))
        );
    }

    #[test]
    fn keeps_input_order() {
        let f = frame(
            Column::List(strings(&["2024-10-08T18:10:00", "2024-10-08T17:40:00", "2024-10-08T18:10:00"])),
            Column::List(vec![Some(1.0), Some(2.0), Some(3.0)]),
        );
        let series = Series::from_frame(&f).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.rows()[0].ds, parse_timestamp("2024-10-08T18:10:00").unwrap());
        assert_eq!(series.rows()[1].y, Some(2.0));
        assert_eq!(series.rows()[2].ds, series.rows()[0].ds);
    }

    #[test]
    fn length_mismatch() {
        let f = frame(
            Column::List(strings(&["2024-10-08T17:40:00", "2024-10-08T18:10:00"])),
            Column::List(vec![Some(1.0)]),
        );
        assert_eq!(Series::from_frame(&f), Err(SeriesError::LengthMismatch { ds: 2, y: 1 }));
    }

    #[test]
    fn mixed_column_shapes() {
        let mut y = BTreeMap::new();
        y.insert("0".to_string(), Some(1.0));
        y.insert("1".to_string(), Some(2.0));
        let f = frame(
            Column::List(strings(&["2024-10-08T17:40:00", "2024-10-08T18:10:00"])),
            Column::Indexed(y),
        );

        let err = Series::from_frame(&f).unwrap_err();
        assert_eq!(err, SeriesError::ColumnShape { ds: "an array", y: "an indexed object" });
        assert_eq!(err.to_string(),
            "SeriesError::ColumnShape: ds is an array but y is an indexed object, both columns must have the same shape");
    }

    #[test]
    fn indexed_columns_are_ordered_numerically() {
        let mut ds = BTreeMap::new();
        let mut y = BTreeMap::new();
        for i in 0..12 {
            ds.insert(i.to_string(), format!("2024-10-08T{:02}:00:00", i));
            y.insert(i.to_string(), Some(i as f64));
        }
        let series = Series::from_frame(&frame(Column::Indexed(ds), Column::Indexed(y))).unwrap();

        let values = series.observed().map(|(_, y)| y).collect::<Vec<f64>>();
        assert_eq!(values, (0..12).map(|i| i as f64).collect::<Vec<f64>>());
    }

    #[test]
    fn indexed_key_mismatch() {
        let mut ds = BTreeMap::new();
        ds.insert("0".to_string(), "2024-10-08T17:40:00".to_string());
        ds.insert("1".to_string(), "2024-10-08T18:10:00".to_string());
        let mut y = BTreeMap::new();
        y.insert("0".to_string(), Some(1.0));
        y.insert("2".to_string(), Some(1.0));

        assert_eq!(
            Series::from_frame(&frame(Column::Indexed(ds), Column::Indexed(y))),
            Err(SeriesError::KeyMismatch("1".to_string()))
        );
    }

    #[test]
    fn missing_values_stay_on_the_axis() {
        let f = frame(
            Column::List(strings(&["2024-10-08T17:40:00", "2024-10-08T18:10:00", "2024-10-08T18:40:00"])),
            Column::List(vec![Some(1.0), None, Some(3.0)]),
        );
        let series = Series::from_frame(&f).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.observed().count(), 2);
    }

    #[test]
    fn too_few_observations() {
        let f = frame(
            Column::List(strings(&["2024-10-08T17:40:00", "2024-10-08T18:10:00"])),
            Column::List(vec![Some(1.0), None]),
        );
        assert_eq!(Series::from_frame(&f), Err(SeriesError::InsufficientData { needed: 2, got: 1 }));
    }

    #[test]
    fn bad_timestamp_fails_the_series() {
        let f = frame(
            Column::List(strings(&["2024-10-08T17:40:00", "tomorrow"])),
            Column::List(vec![Some(1.0), Some(2.0)]),
        );
        assert_eq!(Series::from_frame(&f), Err(SeriesError::Timestamp("tomorrow".to_string())));
    }
}
