pub mod errors;

use std::env;
use std::time::Duration;
use ureq::Agent;
use crate::manager_runtime::errors::RuntimeError;
use crate::models::event::Response;
use crate::models::runtime::{ErrorPayload, Invocation};

const API_VERSION: &str = "2018-06-01";
const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";
const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";
const ERROR_TYPE_HEADER: &str = "Lambda-Runtime-Function-Error-Type";

/// Client for the serverless runtime API
///
/// Fetching the next invocation is a long poll and runs without timeout, all other calls
/// time out after 30 seconds.
pub struct Runtime {
    base_url: String,
    poll_agent: Agent,
    agent: Agent,
}

impl Runtime {
    /// Returns a new instance of the Runtime struct
    ///
    /// # Arguments
    ///
    /// * 'api' - host and port of the runtime API
    pub fn new(api: &str) -> Self {
        let poll_agent: Agent = Agent::config_builder()
            .timeout_global(None)
            .build()
            .into();
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build()
            .into();

        Self { base_url: format!("http://{}/{}/runtime", api, API_VERSION), poll_agent, agent }
    }

    /// Returns a Runtime for the API given by the platform environment
    pub fn from_env() -> Result<Self, RuntimeError> {
        let api = env::var(RUNTIME_API_VAR)
            .map_err(|e| RuntimeError::Environment(format!("{}: {}", RUNTIME_API_VAR, e)))?;

        Ok(Runtime::new(&api))
    }

    /// Blocks until the next invocation is available and returns it
    ///
    pub fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
        let url = format!("{}/invocation/next", self.base_url);
        let mut res = self.poll_agent.get(&url).call()?;

        let request_id = res.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .ok_or_else(|| RuntimeError::Protocol(format!("missing {} header", REQUEST_ID_HEADER)))?;

        let deadline_ms = res.headers()
            .get(DEADLINE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let payload = res.body_mut().read_to_string()?;

        Ok(Invocation { request_id, deadline_ms, payload })
    }

    /// Reports the response of a successful invocation
    ///
    /// # Arguments
    ///
    /// * 'request_id' - id of the invocation
    /// * 'response' - the handler response
    pub fn post_response(&self, request_id: &str, response: &Response) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/response", self.base_url, request_id);
        let json = serde_json::to_string(response)?;

        let _ = self.agent
            .post(&url)
            .content_type("application/json")
            .send(json)?;

        Ok(())
    }

    /// Reports a failed invocation
    ///
    /// # Arguments
    ///
    /// * 'request_id' - id of the invocation
    /// * 'error' - the error document
    pub fn post_invocation_error(&self, request_id: &str, error: &ErrorPayload) -> Result<(), RuntimeError> {
        let url = format!("{}/invocation/{}/error", self.base_url, request_id);
        self.post_error(&url, error)
    }

    /// Reports a failure to initialize, after which the platform discards this instance
    ///
    /// # Arguments
    ///
    /// * 'error' - the error document
    pub fn post_init_error(&self, error: &ErrorPayload) -> Result<(), RuntimeError> {
        let url = format!("{}/init/error", self.base_url);
        self.post_error(&url, error)
    }

    fn post_error(&self, url: &str, error: &ErrorPayload) -> Result<(), RuntimeError> {
        let json = serde_json::to_string(error)?;

        let _ = self.agent
            .post(url)
            .content_type("application/json")
            .header(ERROR_TYPE_HEADER, "Unhandled")
            .send(json)?;

        Ok(())
    }
}
