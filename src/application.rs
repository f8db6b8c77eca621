//! Application entry point and builder pattern implementation.

use log::{debug, info};

use crate::{
    config::Config,
    controller::{Controller, Outcome},
    drivers::{NvidiaSettings, NvidiaSmi},
    error::{ControlError, Result},
    fan_controller::FanActuator,
    measurement::QueryLayout,
    sensors::MeasurementSource,
};

/// The controller wired to its collaborators, ready to run.
///
/// # Example
///
/// ```no_run
/// use gpufand::{application::Application, config::Config};
///
/// # async fn example() -> gpufand::error::Result<()> {
/// let mut app = Application::builder()
///     .with_config(Config::new(5, 40)?)
///     .build()?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application<S: MeasurementSource = NvidiaSmi, A: FanActuator = NvidiaSettings> {
    controller: Controller<S, A>,
}

impl Application {
    /// Creates a builder using the NVIDIA command-line drivers.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }
}

impl<S: MeasurementSource, A: FanActuator> Application<S, A> {
    /// Runs the control loop until interrupted or a fatal error, releasing fan
    /// control on the way out.
    pub async fn run(&mut self) -> Result<Outcome> {
        let config = self.controller.config();
        info!(
            "Starting gpu fan control: every {}s, base temperature {}°C",
            config.poll_interval.as_secs(),
            config.base_temperature
        );
        self.controller.run().await
    }
}

/// Fluent configuration of an [`Application`] before startup.
pub struct ApplicationBuilder<S = NvidiaSmi, A = NvidiaSettings> {
    config: Option<Config>,
    source: S,
    actuator: A,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config: None,
            source: NvidiaSmi::default(),
            actuator: NvidiaSettings::new(),
        }
    }

    /// Selects the `nvidia-smi` query columns.
    pub fn with_layout(mut self, layout: QueryLayout) -> Self {
        self.source = NvidiaSmi::new(layout);
        self
    }
}

impl<S: MeasurementSource, A: FanActuator> ApplicationBuilder<S, A> {
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the measurement source and fan actuator.
    pub fn with_drivers<S2, A2>(self, source: S2, actuator: A2) -> ApplicationBuilder<S2, A2>
    where
        S2: MeasurementSource,
        A2: FanActuator,
    {
        ApplicationBuilder {
            config: self.config,
            source,
            actuator,
        }
    }

    pub fn build(self) -> Result<Application<S, A>> {
        let config = self
            .config
            .ok_or_else(|| ControlError::Configuration("configuration is required".to_string()))?;
        config.validate()?;

        debug!(
            "Building application with {}",
            serde_json::to_string(&config).unwrap_or_default()
        );

        Ok(Application {
            controller: Controller::new(config, self.source, self.actuator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::Phase, fan_controller::MockFanActuator, measurement::Measurement,
        sensors::MockMeasurementSource,
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn build_requires_config() {
        let err = Application::builder().build().err().unwrap();
        assert!(matches!(err, ControlError::Configuration(_)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = Config {
            poll_interval: Duration::from_secs(5),
            base_temperature: 70,
        };
        let err = Application::builder().with_config(config).build().err().unwrap();
        assert!(matches!(err, ControlError::Configuration(_)));
    }

    #[test]
    fn build_wires_config_into_controller() {
        let app = Application::builder()
            .with_layout(QueryLayout::WithoutFanSpeed)
            .with_config(Config::new(3, 45).unwrap())
            .build()
            .unwrap();

        assert_eq!(app.controller.config().base_temperature, 45);
        assert_eq!(app.controller.config().poll_interval, Duration::from_secs(3));
        assert_eq!(app.controller.state().phase, Phase::Starting);
    }

    #[tokio::test]
    async fn run_fails_when_no_gpu_is_present() {
        let mut source = MockMeasurementSource::new();
        source.expect_measure().times(1).returning(|| Ok(Vec::new()));
        let mut actuator = MockFanActuator::new();
        actuator.expect_release().times(0);

        let mut app = Application::builder()
            .with_config(Config::default())
            .with_drivers(source, actuator)
            .build()
            .unwrap();

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, ControlError::NoDeviceDetected));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_releases_after_measurement_failure() {
        let mut calls = 0;
        let mut source = MockMeasurementSource::new();
        source.expect_measure().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(vec![Measurement::new(0, 70, Some(40), Some(95))])
            } else {
                Err(ControlError::MeasurementSource {
                    command: "nvidia-smi".into(),
                    status: Some(9),
                    stderr: "NVIDIA-SMI has failed".into(),
                })
            }
        });
        let mut actuator = MockFanActuator::new();
        actuator.expect_assert_speed().times(1).returning(|_, _| Ok(()));
        actuator.expect_release().times(1).returning(|| Ok(()));

        let mut app = Application::builder()
            .with_config(Config::new(1, 40).unwrap())
            .with_drivers(source, actuator)
            .build()
            .unwrap();

        let err = app.run().await.unwrap_err();
        assert!(matches!(err, ControlError::MeasurementSource { .. }));
        assert_eq!(app.controller.state().phase, Phase::ShuttingDown);
        assert!(!app.controller.state().manual_control_engaged);
    }
}
