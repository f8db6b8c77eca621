//! Configuration for the gpufand control loop.
//!
//! The controller has no configuration file: every value comes from the
//! command line and is validated once, before the loop starts. A [`Config`]
//! is immutable afterwards.

use std::{ops::RangeInclusive, time::Duration};

use log::info;
use serde::Serialize;

use crate::error::{ControlError, Result};

/// Accepted range for the ramp's zero point, in degrees Celsius.
pub const BASE_TEMPERATURE_RANGE: RangeInclusive<i32> = 35..=60;

/// Runtime parameters of the controller.
///
/// # Example
///
/// ```
/// use gpufand::config::Config;
///
/// let config = Config::new(5, 40)?;
/// assert_eq!(config.base_temperature, 40);
/// assert_eq!(config.poll_interval.as_secs(), 5);
/// # Ok::<(), gpufand::error::ControlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Delay between two polls.
    pub poll_interval: Duration,

    /// Zero point of the temperature ramp and idle threshold, in °C.
    pub base_temperature: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(defaults::interval_secs()),
            base_temperature: defaults::base_temperature(),
        }
    }
}

impl Config {
    /// Builds a validated configuration.
    ///
    /// Fails with [`ControlError::Configuration`] when the interval is zero or
    /// the base temperature lies outside [`BASE_TEMPERATURE_RANGE`].
    pub fn new(interval_secs: u64, base_temperature: i32) -> Result<Self> {
        let config = Self {
            poll_interval: Duration::from_secs(interval_secs),
            base_temperature,
        };
        config.validate()?;

        info!(
            "Controller configured: interval {}s, base temperature {}°C",
            interval_secs, base_temperature
        );
        Ok(config)
    }

    /// Checks the invariants the control loop relies on.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ControlError::Configuration(
                "poll interval must be at least one second".to_string(),
            ));
        }

        if !BASE_TEMPERATURE_RANGE.contains(&self.base_temperature) {
            return Err(ControlError::Configuration(format!(
                "base temperature {} is outside [{}, {}]",
                self.base_temperature,
                BASE_TEMPERATURE_RANGE.start(),
                BASE_TEMPERATURE_RANGE.end()
            )));
        }

        Ok(())
    }
}

pub mod defaults {
    /// Default delay between polls in seconds.
    pub const fn interval_secs() -> u64 {
        5
    }

    /// Default ramp zero point in °C.
    pub const fn base_temperature() -> i32 {
        40
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.base_temperature, 40);
    }

    #[test]
    fn base_temperature_bounds_are_inclusive() {
        assert!(Config::new(5, 35).is_ok());
        assert!(Config::new(5, 60).is_ok());
    }

    #[test]
    fn base_temperature_out_of_range_is_rejected() {
        for base in [30, 34, 61, 65] {
            let err = Config::new(5, base).unwrap_err();
            assert!(matches!(err, ControlError::Configuration(_)));
            assert!(err.to_string().contains(&base.to_string()));
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Config::new(0, 40).unwrap_err();
        assert!(matches!(err, ControlError::Configuration(_)));
        assert!(err.to_string().contains("poll interval"));
    }

    #[test]
    fn config_serializes_for_diagnostics() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["base_temperature"], 40);
        assert_eq!(json["poll_interval"]["secs"], 5);
    }
}
