use thiserror::Error;
use crate::manager_runtime::errors::RuntimeError;

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

/// Error depicting errors that occur while setting up logging
///
#[derive(Debug, Error)]
#[error("LoggingError: {0}")]
pub struct LoggingError(pub String);
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}

/// Errors raised while turning the request input into a series table
///
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("SeriesError::LengthMismatch: ds has {ds} entries, y has {y}")]
    LengthMismatch { ds: usize, y: usize },
    #[error("SeriesError::ColumnShape: ds is {ds} but y is {y}, both columns must have the same shape")]
    ColumnShape { ds: &'static str, y: &'static str },
    #[error("SeriesError::KeyMismatch: row key {0} present in only one of ds and y")]
    KeyMismatch(String),
    #[error("SeriesError::Timestamp: '{0}' is not a parseable date-time")]
    Timestamp(String),
    #[error("SeriesError::TimeZone: '{0}' carries a time zone, which is not supported")]
    TimeZone(String),
    #[error("SeriesError::InsufficientData: need at least {needed} observed rows, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Top level error for one handler invocation
///
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("HandlerError::Request: {0}")]
    Request(String),
    #[error("HandlerError::Series: {0}")]
    Series(#[from] SeriesError),
    #[error("HandlerError::Model: {0}")]
    Model(String),
    #[error("HandlerError::Response: {0}")]
    Response(String),
}
impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self { HandlerError::Request(e.to_string()) }
}

impl HandlerError {
    /// Short error type name as reported back to the runtime
    pub fn error_type(&self) -> &'static str {
        match self {
            HandlerError::Request(_) => "RequestError",
            HandlerError::Series(_) => "SeriesError",
            HandlerError::Model(_) => "ModelError",
            HandlerError::Response(_) => "ResponseError",
        }
    }
}

/// Error depicting errors that occur in the invocation loop
///
#[derive(Debug, Error)]
#[error("WorkerError: {0}")]
pub struct WorkerError(pub String);
impl From<RuntimeError> for WorkerError {
    fn from(e: RuntimeError) -> Self { WorkerError(e.to_string()) }
}

/// Error depicting errors that occur while initializing
///
#[derive(Debug, Error)]
#[error("InitError: {0}")]
pub struct InitError(pub String);
impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self { InitError(e.to_string()) }
}
impl From<LoggingError> for InitError {
    fn from(e: LoggingError) -> Self { InitError(e.to_string()) }
}
impl From<RuntimeError> for InitError {
    fn from(e: RuntimeError) -> Self { InitError(e.to_string()) }
}
