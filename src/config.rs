use std::fs;
use std::path::Path;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::forecaster::BodyLayout;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: String::new(),
            log_level: LevelFilter::Info,
            log_to_stdout: true,
        }
    }
}

/// Engine settings that are not part of the request
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModelParameters {
    pub uncertainty_samples: usize,
    pub seed: u64,
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub seasonality_prior_scale: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            uncertainty_samples: 1000,
            seed: 0,
            n_changepoints: 25,
            changepoint_range: 0.8,
            seasonality_prior_scale: 10.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Output {
    pub layout: BodyLayout,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub model: ModelParameters,
    pub output: Output,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// Missing sections and items fall back to their defaults.
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let path = Path::new(config_path);
    if !path.exists() {
        return Err(ConfigError(format!("config file not found: {}", config_path)));
    }

    let toml = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&toml)?;
    validate(&config)?;

    Ok(config)
}

/// Checks engine settings that would otherwise only fail deep inside a fit
///
/// # Arguments
///
/// * 'config' - the loaded configuration
fn validate(config: &Config) -> Result<(), ConfigError> {
    let model = &config.model;
    if !(model.changepoint_range > 0.0 && model.changepoint_range <= 1.0) {
        return Err(ConfigError::from("model.changepoint_range must be in (0, 1]"));
    }
    if !(model.seasonality_prior_scale > 0.0 && model.seasonality_prior_scale.is_finite()) {
        return Err(ConfigError::from("model.seasonality_prior_scale must be positive"));
    }
    if model.uncertainty_samples == 0 {
        return Err(ConfigError::from("model.uncertainty_samples must be at least 1"));
    }

    Ok(())
}
