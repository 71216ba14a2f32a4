use serde::{Deserialize, Serialize};

/// Error document reported to the runtime for a failed invocation or initialization
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    #[serde(rename = "errorType")]
    pub error_type: String,
    #[serde(rename = "stackTrace")]
    pub stack_trace: Vec<String>,
}

impl ErrorPayload {
    pub fn new(error_type: &str, error_message: String) -> Self {
        Self { error_message, error_type: error_type.to_string(), stack_trace: Vec::new() }
    }
}

/// One invocation as fetched from the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub request_id: String,
    /// Deadline as epoch milliseconds, if the runtime told us
    pub deadline_ms: Option<u64>,
    pub payload: String,
}
