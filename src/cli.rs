use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::config::defaults;

/// gpufand: temperature-driven fan control for NVIDIA GPUs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of seconds between consecutive updates
    #[arg(short = 'i', long = "interval-secs", default_value_t = defaults::interval_secs())]
    pub interval_secs: u64,

    /// Ramp zero point and idle threshold in °C (35-60)
    #[arg(
        short = 'b',
        long = "base-temperature",
        default_value_t = defaults::base_temperature(),
        allow_negative_numbers = true
    )]
    pub base_temperature: i32,

    /// Verbosity level
    #[arg(short = 'l', long = "log-level", value_enum, default_value_t = LogLevel::Info, ignore_case = true)]
    pub log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
        }
    }
}
