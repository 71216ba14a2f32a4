use std::env;
use log::info;
use crate::config::{load_config, Config};
use crate::errors::InitError;
use crate::logging::init_logging;
use crate::manager_runtime::Runtime;
use crate::models::runtime::ErrorPayload;

/// Environment variable holding an optional path to the configuration file
pub const CONFIG_VAR: &str = "PREDICTIONS_CONFIG";

/// Loads the configuration and sets up logging
///
/// Without a configuration file every setting takes its default.
pub fn init() -> Result<Config, InitError> {
    let config = match env::var(CONFIG_VAR) {
        Ok(path) if !path.is_empty() => load_config(&path)?,
        _ => Config::default(),
    };

    init_logging(&config.general)?;

    info!("predictions version: {}", env!("CARGO_PKG_VERSION"));
    info!("model settings: {:?}, output layout: {:?}", config.model, config.output.layout);

    Ok(config)
}

/// Reports a failed initialization to the runtime
///
/// Logging may not be up at this point, so a failed report goes to stderr. Returns whether
/// the runtime accepted the report.
///
/// # Arguments
///
/// * 'runtime' - client for the runtime API
/// * 'error' - the initialization error
pub fn report_init_error(runtime: &Runtime, error: &InitError) -> bool {
    match runtime.post_init_error(&ErrorPayload::new("InitError", error.to_string())) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("failed to report init error to runtime: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use crate::manager_runtime::tests::{http_response, stub_runtime};

    #[test]
    fn init_error_is_reported() {
        let (addr, handle) = stub_runtime(vec![http_response(&[], "")]);

        assert!(report_init_error(&Runtime::new(&addr), &InitError("bad config".to_string())));
        let captured = handle.join().unwrap();

        assert_eq!(captured[0].request_line, "POST /2018-06-01/runtime/init/error HTTP/1.1");
        let payload: ErrorPayload = serde_json::from_str(&captured[0].body).unwrap();
        assert_eq!(payload.error_type, "InitError");
        assert_eq!(payload.error_message, "InitError: bad config");
    }

    #[test]
    fn unreachable_runtime_is_not_reported_as_success() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(!report_init_error(&Runtime::new(&addr), &InitError("bad config".to_string())));
    }
}
