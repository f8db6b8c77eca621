use async_trait::async_trait;

use crate::{error::Result, measurement::Measurement};

/// Source of per-device GPU telemetry.
///
/// A successful query always yields at least one [`Measurement`]; an empty
/// result is reported as [`ControlError::NoDeviceDetected`](crate::error::ControlError::NoDeviceDetected).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    async fn measure(&self) -> Result<Vec<Measurement>>;
}
