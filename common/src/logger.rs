use std::{fs, path::Path};

use anyhow::{Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

pub fn default_log_filename() -> String {
    String::from("scriptlog.log")
}

pub fn default_logs_path() -> String {
    String::from("logs/")
}

pub fn default_logs_datetime_format() -> String {
    String::from("[%Y-%m-%d] (%H:%M:%S%.3f)")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct LogConfig {
    /// Set log level
    #[cfg_attr(feature = "clap", clap(long, value_enum, default_value_t))]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Set file log level
    /// By default, it will be the same as log level
    #[cfg_attr(feature = "clap", clap(long, value_enum))]
    #[serde(default)]
    pub file_log_level: Option<LogLevel>,
    /// Disable the log file
    #[cfg_attr(feature = "clap", clap(long))]
    #[serde(default)]
    pub disable_file_logging: bool,
    /// Disable the usage of colors in log
    #[cfg_attr(feature = "clap", clap(long))]
    #[serde(default)]
    pub disable_log_color: bool,
    /// Log filename
    ///
    /// File will be stored in logs directory, this is only the filename, not the full path.
    #[cfg_attr(feature = "clap", clap(long, default_value_t = default_log_filename()))]
    #[serde(default = "default_log_filename")]
    pub filename_log: String,
    /// Logs directory
    ///
    /// By default it will be logs/ of the current directory.
    #[cfg_attr(feature = "clap", clap(long, default_value_t = default_logs_path()))]
    #[serde(default = "default_logs_path")]
    pub logs_path: String,
    /// Change the datetime format used by the logger
    #[cfg_attr(feature = "clap", clap(long, default_value_t = default_logs_datetime_format()))]
    #[serde(default = "default_logs_datetime_format")]
    pub datetime_format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            file_log_level: None,
            disable_file_logging: false,
            disable_log_color: false,
            filename_log: default_log_filename(),
            logs_path: default_logs_path(),
            datetime_format: default_logs_datetime_format(),
        }
    }
}

impl LogConfig {
    pub fn file_level(&self) -> LogLevel {
        self.file_log_level.unwrap_or(self.log_level)
    }
}

/// Install the global logger: colored stdout output plus an optional log file
pub fn setup_logger(config: &LogConfig) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::Magenta);

    let stdout_format = config.datetime_format.clone();
    let disable_color = config.disable_log_color;
    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = if disable_color {
                record.level().to_string()
            } else {
                colors.color(record.level()).to_string()
            };
            out.finish(format_args!(
                "{} {:>5} [{}] {}",
                chrono::Local::now().format(&stdout_format),
                level,
                record.target(),
                message
            ))
        })
        .level(config.log_level.into())
        .chain(std::io::stdout());

    let mut base = fern::Dispatch::new().chain(stdout);

    if !config.disable_file_logging {
        let dir = Path::new(&config.logs_path);
        fs::create_dir_all(dir)
            .with_context(|| format!("Error while creating logs directory {}", dir.display()))?;

        let file_format = config.datetime_format.clone();
        let file = fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {:>5} [{}] {}",
                    chrono::Local::now().format(&file_format),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(config.file_level().into())
            .chain(fern::log_file(dir.join(&config.filename_log))?);

        base = base.chain(file);
    }

    base.apply().context("Error while setting up the logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_level_defaults_to_log_level() {
        let mut config = LogConfig {
            log_level: LogLevel::Debug,
            ..Default::default()
        };
        assert_eq!(config.file_level(), LogLevel::Debug);

        config.file_log_level = Some(LogLevel::Warn);
        assert_eq!(config.file_level(), LogLevel::Warn);
    }

    #[test]
    fn test_log_config_from_partial_json() {
        let config: LogConfig = serde_json::from_str(r#"{"log_level":"trace"}"#).unwrap();
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.filename_log, "scriptlog.log");
        assert!(!config.disable_file_logging);
        assert_eq!(LevelFilter::from(config.log_level), LevelFilter::Trace);
    }
}
