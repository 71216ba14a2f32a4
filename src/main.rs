use std::{env, fs, process};
use anyhow::{anyhow, Context, Result};
use predictions::handler::handle_raw_event;
use predictions::initialization::{init, report_init_error};
use predictions::manager_prophet::ProphetForecaster;
use predictions::manager_runtime::Runtime;
use predictions::worker;

fn main() {
    let args = env::args().collect::<Vec<String>>();

    let result = match args.get(1).map(|a| a.as_str()) {
        None => serve(),
        Some("invoke") => invoke(args.get(2)),
        Some(other) => Err(anyhow!("unknown command '{}', usage: predictions [invoke <event.json>]", other)),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

/// Serves invocations from the runtime API until it goes away
///
fn serve() -> Result<()> {
    let runtime = Runtime::from_env()?;

    let config = match init() {
        Ok(config) => config,
        Err(e) => {
            report_init_error(&runtime, &e);
            return Err(e.into());
        }
    };

    let forecaster = ProphetForecaster::new(config.model.clone());
    worker::run(&runtime, &forecaster, config.output.layout)?;

    Ok(())
}

/// Runs the handler once on an event read from file and prints the response
///
/// # Arguments
///
/// * 'event_path' - path to a file holding the event document
fn invoke(event_path: Option<&String>) -> Result<()> {
    let event_path = event_path.ok_or_else(|| anyhow!("usage: predictions invoke <event.json>"))?;
    let config = init()?;

    let raw_event = fs::read_to_string(event_path)
        .with_context(|| format!("reading event from {}", event_path))?;

    let forecaster = ProphetForecaster::new(config.model.clone());
    let response = handle_raw_event(&raw_event, &forecaster, config.output.layout)?;

    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}
