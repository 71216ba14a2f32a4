use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::General;
use crate::errors::LoggingError;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

/// Builds the log4rs configuration from the general section of the config
///
/// A console appender is added if logging to stdout is requested and a file appender
/// if a log path is given.
///
/// # Arguments
///
/// * 'general' - the general configuration section
pub fn build_log_config(general: &General) -> Result<Config, LoggingError> {
    let mut builder = Config::builder();
    let mut root = Root::builder();

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    if !general.log_path.is_empty() {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(&general.log_path)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    Ok(builder.build(root.build(general.log_level))?)
}

/// Installs the global logger
///
/// # Arguments
///
/// * 'general' - the general configuration section
pub fn init_logging(general: &General) -> Result<(), LoggingError> {
    let config = build_log_config(general)?;
    let _ = log4rs::init_config(config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn stdout_only() {
        let config = build_log_config(&General::default()).unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), LevelFilter::Info);
    }

    #[test]
    fn stdout_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let general = General {
            log_path: dir.path().join("predictions.log").to_string_lossy().to_string(),
            log_level: LevelFilter::Debug,
            log_to_stdout: true,
        };

        let config = build_log_config(&general).unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.root().appenders().len(), 2);
    }
}
