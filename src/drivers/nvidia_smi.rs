use async_trait::async_trait;
use log::debug;

use crate::{
    error::{ControlError, Result},
    measurement::{Measurement, QueryLayout, parse_measurements},
    process::{CommandRunner, SystemRunner, command_line},
    sensors::MeasurementSource,
};

pub const PROGRAM: &str = "nvidia-smi";

/// Measurement source querying `nvidia-smi`.
#[derive(Debug, Clone)]
pub struct NvidiaSmi<R: CommandRunner = SystemRunner> {
    runner: R,
    layout: QueryLayout,
}

impl NvidiaSmi {
    pub fn new(layout: QueryLayout) -> Self {
        Self::with_runner(SystemRunner, layout)
    }
}

impl Default for NvidiaSmi {
    fn default() -> Self {
        Self::new(QueryLayout::default())
    }
}

impl<R: CommandRunner> NvidiaSmi<R> {
    pub const fn with_runner(runner: R, layout: QueryLayout) -> Self {
        Self { runner, layout }
    }

    fn args(&self) -> Vec<String> {
        vec![
            format!("--query-gpu={}", self.layout.query_fields()),
            "--format=csv,noheader".to_string(),
        ]
    }
}

#[async_trait]
impl<R: CommandRunner> MeasurementSource for NvidiaSmi<R> {
    async fn measure(&self) -> Result<Vec<Measurement>> {
        let args = self.args();
        let output = self.runner.run(PROGRAM, &args).await?;

        if !output.success() {
            let command = command_line(PROGRAM, &args);
            output.report_failure(&command);
            return Err(ControlError::MeasurementSource {
                command,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let measurements = parse_measurements(&output.stdout, self.layout)?;
        debug!("Measured {} gpu(s)", measurements.len());
        Ok(measurements)
    }
}
