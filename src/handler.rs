use log::{debug, info};
use crate::errors::HandlerError;
use crate::forecaster::{BodyLayout, Forecaster, ModelParams};
use crate::models::event::{Event, Response};
use crate::models::prediction::PredictionInput;
use crate::series::Series;

/// Status code of every successful invocation
pub const STATUS_OK: u16 = 200;

/// Handles one forecast invocation
///
/// The event is logged as received before anything else happens. Any failure is returned as
/// an error, nothing is retried and no partial result is produced.
///
/// # Arguments
///
/// * 'event' - the invocation event, its body holds the JSON encoded request
/// * 'forecaster' - the forecasting engine
/// * 'layout' - layout of the response body
pub fn lambda_handler<F: Forecaster>(event: &Event, forecaster: &F, layout: BodyLayout) -> Result<Response, HandlerError> {
    info!("{}", event);

    forecast_event(event, forecaster, layout)
}

/// Handles one invocation given the raw event document
///
/// The raw document is logged before it is parsed, so events that are not even valid
/// JSON still show up in the log.
///
/// # Arguments
///
/// * 'raw_event' - the event as received
/// * 'forecaster' - the forecasting engine
/// * 'layout' - layout of the response body
pub fn handle_raw_event<F: Forecaster>(raw_event: &str, forecaster: &F, layout: BodyLayout) -> Result<Response, HandlerError> {
    info!("{}", raw_event);

    let event: Event = serde_json::from_str(raw_event)?;

    forecast_event(&event, forecaster, layout)
}

fn forecast_event<F: Forecaster>(event: &Event, forecaster: &F, layout: BodyLayout) -> Result<Response, HandlerError> {
    let request: PredictionInput = serde_json::from_str(&event.body)?;
    let series = Series::from_frame(&request.input)?;
    let params = ModelParams {
        changepoint_prior_scale: request.changepoint_prior_scale,
        interval_width: request.interval_width,
    };
    debug!("series of {} rows, changepoint_prior_scale: {}, interval_width: {}",
        series.len(), params.changepoint_prior_scale, params.interval_width);

    let forecast = forecaster.forecast(&series, &params)
        .map_err(|e| HandlerError::Model(e.to_string()))?;

    let body = forecast.to_json(layout)
        .map_err(|e| HandlerError::Response(e.to_string()))?;

    Ok(Response { status_code: STATUS_OK, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::Mutex;
    use chrono::TimeDelta;
    use log::{LevelFilter, Log, Metadata, Record};
    use crate::forecaster::{ForecastRow, ForecastTable};

    /// Echoes the series back with fixed bounds and records the parameters it was called with
    struct EchoForecaster {
        calls: RefCell<Vec<ModelParams>>,
    }

    impl Forecaster for EchoForecaster {
        type Error = String;

        fn forecast(&self, series: &Series, params: &ModelParams) -> Result<ForecastTable, String> {
            self.calls.borrow_mut().push(*params);
            let mut rows = series.observed()
                .map(|(ds, y)| ForecastRow { ds, yhat: y, yhat_lower: y - 1.0, yhat_upper: y + 1.0 })
                .collect::<Vec<ForecastRow>>();
            let last = rows.last().map(|r| r.ds).ok_or("empty")?;
            rows.push(ForecastRow { ds: last + TimeDelta::hours(1), yhat: 0.0, yhat_lower: -1.0, yhat_upper: 1.0 });
            Ok(ForecastTable { rows })
        }
    }

    struct FailingForecaster;

    /// Keeps every logged message so tests can look for what was logged
    struct CaptureLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger { lines: Mutex::new(Vec::new()) };

    fn logged(marker: &str) -> bool {
        CAPTURE.lines.lock().unwrap().iter().any(|l| l.contains(marker))
    }

    fn capture_logs() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(LevelFilter::Info);
    }

    impl Forecaster for FailingForecaster {
        type Error = String;

        fn forecast(&self, _: &Series, _: &ModelParams) -> Result<ForecastTable, String> {
            Err("degenerate series".to_string())
        }
    }

    fn echo() -> EchoForecaster {
        EchoForecaster { calls: RefCell::new(Vec::new()) }
    }

    fn event(body: &str) -> Event {
        Event::new(body.to_string())
    }

    const BODY: &str = r#"{"input":{"ds":["2024-10-08T17:40:00","2024-10-08T18:10:00"],"y":[1,2]},
        "changepoint_prior_scale":0.25,"interval_width":0.95}"#;

    #[test]
    fn passes_parameters_and_returns_200() {
        let forecaster = echo();
        let response = lambda_handler(&event(BODY), &forecaster, BodyLayout::Arrays).unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(*forecaster.calls.borrow(), vec![ModelParams { changepoint_prior_scale: 0.25, interval_width: 0.95 }]);

        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["ds"].as_array().unwrap().len(), 3);
        assert_eq!(body["ds"][2], "2024-10-08T19:10:00");
    }

    #[test]
    fn malformed_body_fails() {
        let truncated = &BODY[..40];
        let err = lambda_handler(&event(truncated), &echo(), BodyLayout::Columns).unwrap_err();
        assert!(matches!(err, HandlerError::Request(_)));
    }

    #[test]
    fn missing_field_fails() {
        let body = r#"{"input":{"ds":["2024-10-08T17:40:00"],"y":[1]},"changepoint_prior_scale":0.25}"#;
        let err = lambda_handler(&event(body), &echo(), BodyLayout::Columns).unwrap_err();
        assert!(matches!(err, HandlerError::Request(_)));
    }

    #[test]
    fn mismatched_lengths_fail_before_the_model() {
        let forecaster = echo();
        let body = r#"{"input":{"ds":["2024-10-08T17:40:00","2024-10-08T18:10:00"],"y":[1]},
            "changepoint_prior_scale":0.25,"interval_width":0.95}"#;
        let err = lambda_handler(&event(body), &forecaster, BodyLayout::Columns).unwrap_err();

        assert!(matches!(err, HandlerError::Series(_)));
        assert!(forecaster.calls.borrow().is_empty());
    }

    #[test]
    fn model_failure_is_propagated() {
        let err = lambda_handler(&event(BODY), &FailingForecaster, BodyLayout::Columns).unwrap_err();
        assert_eq!(err.to_string(), "HandlerError::Model: degenerate series");
    }

    #[test]
    fn raw_event_without_body_fails() {
        let err = handle_raw_event(r#"{"headers":{}}"#, &echo(), BodyLayout::Columns).unwrap_err();
        assert!(matches!(err, HandlerError::Request(_)));
    }

    #[test]
    fn raw_event_is_logged_before_parsing() {
        capture_logs();

        let err = handle_raw_event(r#"{"headers":{"x":"marker-123"}}"#, &echo(), BodyLayout::Columns).unwrap_err();
        assert!(matches!(err, HandlerError::Request(_)));
        assert!(logged("marker-123"));

        let err = handle_raw_event("not json marker-456", &echo(), BodyLayout::Columns).unwrap_err();
        assert!(matches!(err, HandlerError::Request(_)));
        assert!(logged("not json marker-456"));
    }

    #[test]
    fn raw_event_is_logged_verbatim() {
        capture_logs();
        let raw = format!(r#"{{"body":{},   "marker":"marker-789"}}"#, serde_json::to_string(BODY).unwrap());

        handle_raw_event(&raw, &echo(), BodyLayout::Columns).unwrap();
        assert!(logged(&raw));
    }
}
