use async_trait::async_trait;
use log::{debug, info};

use crate::{
    error::{ControlError, Result},
    fan_controller::FanActuator,
    process::{CommandRunner, SystemRunner, command_line},
};

pub const PROGRAM: &str = "nvidia-settings";

const MANUAL_CONTROL_ON: &str = "GPUFanControlState=1";
const MANUAL_CONTROL_OFF: &str = "GPUFanControlState=0";

/// Fan actuator driving `nvidia-settings` assignments.
///
/// Requires a running X server and Coolbits enabled in the driver.
#[derive(Debug, Clone, Default)]
pub struct NvidiaSettings<R: CommandRunner = SystemRunner> {
    runner: R,
}

impl NvidiaSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> NvidiaSettings<R> {
    pub const fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    async fn assign(&self, assignments: Vec<String>) -> Result<()> {
        let args: Vec<String> = assignments
            .into_iter()
            .flat_map(|assignment| ["--assign".to_string(), assignment])
            .collect();

        let output = self.runner.run(PROGRAM, &args).await?;
        if output.success() {
            return Ok(());
        }

        let command = command_line(PROGRAM, &args);
        output.report_failure(&command);
        Err(ControlError::Actuation {
            command,
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Assignment setting the target duty cycle of one device's fan.
pub fn target_speed_assignment(device: u32, speed: u8) -> String {
    format!("[fan-{device}]/GPUTargetFanSpeed={speed}")
}

#[async_trait]
impl<R: CommandRunner> FanActuator for NvidiaSettings<R> {
    async fn assert_speed(&self, devices: &[u32], speed: u8) -> Result<()> {
        for device in devices {
            info!("Setting new fan speed {speed} on gpu {device}");
        }

        let assignments = std::iter::once(MANUAL_CONTROL_ON.to_string())
            .chain(devices.iter().map(|&device| target_speed_assignment(device, speed)))
            .collect();
        self.assign(assignments).await
    }

    async fn release(&self) -> Result<()> {
        debug!("Disabling manual gpu fan control");
        self.assign(vec![MANUAL_CONTROL_OFF.to_string()]).await
    }
}
