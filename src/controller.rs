//! The poll → decide → act → sleep control loop.

use std::future::Future;

use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::{
    config::Config,
    error::{ControlError, Result},
    fan_controller::FanActuator,
    fan_curve::Ramp,
    measurement::Measurement,
    sensors::MeasurementSource,
    shutdown,
};

/// Utilization (percent) at or below which a device may count as idle.
pub const IDLE_UTILIZATION: u8 = 10;

/// Largest speed difference (percent) that does not warrant a new command.
pub const DEAD_BAND: u8 = 2;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Starting,
    Idle,
    Active,
    ShuttingDown,
}

/// How a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Interrupted,
}

/// Mutable state owned by a [`Controller`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Whether fans may be under manual control by this process.
    pub manual_control_engaged: bool,
    pub last_measurements: Vec<Measurement>,
    /// Global target of the last assertion, while manual control is engaged.
    pub last_commanded: Option<u8>,
    /// Sorted device indices the last assertion was sent to.
    pub commanded_devices: Vec<u32>,
    pub phase: Phase,
}

/// True when every device is at or below the base temperature and no busier
/// than [`IDLE_UTILIZATION`]. A device with unreported utilization is never idle.
pub fn is_idle(measurements: &[Measurement], base_temperature: i32) -> bool {
    measurements.iter().all(|m| {
        m.temperature <= base_temperature
            && m.utilization.is_some_and(|utilization| utilization <= IDLE_UTILIZATION)
    })
}

/// Closed-loop fan controller.
///
/// One global target is derived from the hottest device and applied to all
/// devices. The dead-band is measured against the last commanded target while
/// manual control is engaged, so an unchanged decision is not re-sent unless
/// the set of polled devices changed.
pub struct Controller<S: MeasurementSource, A: FanActuator> {
    config: Config,
    ramp: Ramp,
    source: S,
    actuator: A,
    state: ControllerState,
}

impl<S: MeasurementSource, A: FanActuator> Controller<S, A> {
    pub fn new(config: Config, source: S, actuator: A) -> Self {
        Self {
            ramp: Ramp::new(config.base_temperature),
            config,
            source,
            actuator,
            state: ControllerState::default(),
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Queries the measurement source and stores the result.
    pub async fn poll(&mut self) -> Result<&[Measurement]> {
        let measurements = self.source.measure().await?;
        if measurements.is_empty() {
            return Err(ControlError::NoDeviceDetected);
        }

        debug!(
            "Measurements: {}",
            serde_json::to_string(&measurements).unwrap_or_default()
        );
        self.state.last_measurements = measurements;
        Ok(&self.state.last_measurements)
    }

    pub fn is_idle(&self) -> bool {
        is_idle(&self.state.last_measurements, self.config.base_temperature)
    }

    pub fn target_fan_speed(&self, temperature: i32) -> u8 {
        self.ramp.target_speed(temperature)
    }

    /// Speed the next target is compared against.
    ///
    /// While engaged this is the last commanded target, or `None` when the
    /// polled devices differ from the ones it was sent to. Otherwise it is the
    /// measured speed farthest from `target`, or `None` when a device does not
    /// report its fan speed.
    pub fn reference_speed(&self, target: u8) -> Option<u8> {
        if self.state.manual_control_engaged
            && let Some(commanded) = self.state.last_commanded
        {
            return (self.state.commanded_devices == self.polled_devices()).then_some(commanded);
        }

        self.state
            .last_measurements
            .iter()
            .map(|m| m.fan_speed)
            .collect::<Option<Vec<u8>>>()?
            .into_iter()
            .max_by_key(|speed| speed.abs_diff(target))
    }

    /// Asserts `target` unless `current` is already within the dead-band.
    ///
    /// Returns whether a command was issued.
    pub async fn maybe_apply(&mut self, current: Option<u8>, target: u8) -> Result<bool> {
        if current.is_some_and(|current| current.abs_diff(target) <= DEAD_BAND) {
            debug!("Fan speed {current:?}% within {DEAD_BAND}% of target {target}%");
            return Ok(false);
        }

        self.assert_fan_speed(target).await?;
        Ok(true)
    }

    /// Takes manual control and sets `target` on every polled device.
    pub async fn assert_fan_speed(&mut self, target: u8) -> Result<()> {
        let devices: Vec<u32> = self.state.last_measurements.iter().map(|m| m.index).collect();
        let commanded_devices = self.polled_devices();

        // Engaged before the command: an interrupted or failed assertion still gets released.
        self.state.manual_control_engaged = true;
        self.actuator.assert_speed(&devices, target).await?;
        self.state.last_commanded = Some(target);
        self.state.commanded_devices = commanded_devices;
        Ok(())
    }

    /// Hands fans back to the firmware if this process holds them.
    ///
    /// Returns whether a command was issued.
    pub async fn release_manual_control(&mut self) -> Result<bool> {
        if !self.state.manual_control_engaged {
            return Ok(false);
        }

        self.actuator.release().await?;
        self.state.manual_control_engaged = false;
        self.state.last_commanded = None;
        self.state.commanded_devices.clear();
        info!("Released manual gpu fan control");
        Ok(true)
    }

    /// One decision over the last measurements.
    pub async fn step(&mut self) -> Result<()> {
        if self.is_idle() {
            self.enter(Phase::Idle);
            self.release_manual_control().await?;
            return Ok(());
        }

        self.enter(Phase::Active);
        let Some(hottest) = self
            .state
            .last_measurements
            .iter()
            .map(|m| m.temperature)
            .max()
        else {
            return Ok(());
        };

        let target = self.target_fan_speed(hottest);
        let current = self.reference_speed(target);
        debug!("Hottest gpu at {hottest}°C, target {target}%, reference {current:?}");
        self.maybe_apply(current, target).await?;
        Ok(())
    }

    /// Runs until SIGINT/SIGTERM or a fatal error, then releases fan control.
    pub async fn run(&mut self) -> Result<Outcome> {
        let shutdown = shutdown::listen()?;
        self.run_until(shutdown).await
    }

    /// Runs until `shutdown` resolves or a fatal error, then releases fan
    /// control exactly once.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<Outcome>
    where
        F: Future<Output = Result<()>>,
    {
        let outcome = tokio::select! {
            result = self.drive() => result,
            signal = shutdown => signal.map(|()| Outcome::Interrupted),
        };

        self.enter(Phase::ShuttingDown);
        let released = self.release_manual_control().await;

        match (outcome, released) {
            (Ok(outcome), Ok(_)) => Ok(outcome),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(release_error)) => {
                error!("Failed to release manual gpu fan control: {release_error}");
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<Outcome> {
        self.enter(Phase::Starting);
        let devices = self.poll().await?.len();
        info!("Controlling {devices} gpu(s)");

        loop {
            self.step().await?;
            sleep(self.config.poll_interval).await;
            self.poll().await?;
        }
    }

    fn polled_devices(&self) -> Vec<u32> {
        let mut devices: Vec<u32> = self.state.last_measurements.iter().map(|m| m.index).collect();
        devices.sort_unstable();
        devices
    }

    fn enter(&mut self, phase: Phase) {
        if self.state.phase != phase {
            match phase {
                Phase::ShuttingDown => warn!("Shutting down"),
                _ => debug!("Entering {phase:?} phase"),
            }
            self.state.phase = phase;
        }
    }
}
