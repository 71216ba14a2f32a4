pub mod config;
pub mod errors;
pub mod forecaster;
pub mod handler;
pub mod initialization;
pub mod logging;
pub mod manager_prophet;
pub mod manager_runtime;
pub mod models;
pub mod series;
pub mod worker;
