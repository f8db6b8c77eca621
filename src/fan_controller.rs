//! Fan actuator abstraction.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for the mechanism that drives GPU fans.
///
/// # Example
///
/// ```no_run
/// use gpufand::fan_controller::FanActuator;
/// use gpufand::error::Result;
///
/// struct DryRun;
///
/// #[async_trait::async_trait]
/// impl FanActuator for DryRun {
///     async fn assert_speed(&self, devices: &[u32], speed: u8) -> Result<()> {
///         println!("would set {devices:?} to {speed}%");
///         Ok(())
///     }
///     async fn release(&self) -> Result<()> { Ok(()) }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FanActuator: Send + Sync {
    /// Enables manual fan control and sets `speed` percent on every device in
    /// `devices`, as one logical operation.
    async fn assert_speed(&self, devices: &[u32], speed: u8) -> Result<()>;

    /// Hands fan control back to the firmware.
    async fn release(&self) -> Result<()>;
}
