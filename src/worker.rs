use log::{error, info};
use crate::errors::WorkerError;
use crate::forecaster::{BodyLayout, Forecaster};
use crate::handler::handle_raw_event;
use crate::manager_runtime::Runtime;
use crate::models::runtime::{ErrorPayload, Invocation};

/// Runs the invocation loop until the runtime can no longer be reached
///
/// A failing invocation is reported back to the runtime and the loop carries on with the
/// next one. Only transport or protocol errors towards the runtime end the loop.
///
/// # Arguments
///
/// * 'runtime' - client for the runtime API
/// * 'forecaster' - the forecasting engine
/// * 'layout' - layout of the response body
pub fn run<F: Forecaster>(runtime: &Runtime, forecaster: &F, layout: BodyLayout) -> Result<(), WorkerError> {
    loop {
        let invocation = runtime.next_invocation()?;
        process(runtime, invocation, forecaster, layout)?;
    }
}

/// Handles one invocation and reports its outcome
///
/// # Arguments
///
/// * 'runtime' - client for the runtime API
/// * 'invocation' - the invocation to handle
/// * 'forecaster' - the forecasting engine
/// * 'layout' - layout of the response body
pub fn process<F: Forecaster>(runtime: &Runtime, invocation: Invocation, forecaster: &F, layout: BodyLayout) -> Result<(), WorkerError> {
    info!("invocation {} received, deadline: {:?}", invocation.request_id, invocation.deadline_ms);

    match handle_raw_event(&invocation.payload, forecaster, layout) {
        Ok(response) => {
            runtime.post_response(&invocation.request_id, &response)?;
            info!("invocation {} done", invocation.request_id);
        },
        Err(e) => {
            error!("invocation {} failed: {}", invocation.request_id, e);
            let payload = ErrorPayload::new(e.error_type(), e.to_string());
            runtime.post_invocation_error(&invocation.request_id, &payload)?;
        }
    }

    Ok(())
}
