//! Error taxonomy for the control loop.

use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Every way the controller can fail.
///
/// Nothing here is retried: any variant reaching the main loop ends the run
/// after the manual fan control has been released.
#[derive(Error, Debug)]
pub enum ControlError {
    /// Invalid startup parameters. Detected before any state exists.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("no gpu detected")]
    NoDeviceDetected,

    #[error("measurement command `{command}` failed ({}): {stderr}", exit_label(.status))]
    MeasurementSource {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("fan command `{command}` failed ({}): {stderr}", exit_label(.status))]
    Actuation {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("unable to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] io::Error),
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl ControlError {
    /// Process exit status reported for this error.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn configuration_error_exits_with_one() {
        let err = ControlError::Configuration("base temperature 30".into());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("base temperature 30"));
    }

    #[test]
    fn runtime_errors_exit_with_two() {
        assert_eq!(ControlError::NoDeviceDetected.exit_code(), 2);
        let spawn = ControlError::Spawn {
            command: "nvidia-smi".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(spawn.exit_code(), 2);
        assert!(spawn.to_string().contains("nvidia-smi"));
    }

    #[test]
    fn command_failure_message_carries_status_and_stderr() {
        let err = ControlError::Actuation {
            command: "nvidia-settings --assign GPUFanControlState=0".into(),
            status: Some(1),
            stderr: "ERROR: The control display is undefined".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit status 1"));
        assert!(msg.contains("control display is undefined"));

        let killed = ControlError::MeasurementSource {
            command: "nvidia-smi".into(),
            status: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("terminated by signal"));
    }
}
