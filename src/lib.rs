//! # gpufand
//!
//! A closed-loop fan speed controller for NVIDIA GPUs.
//!
//! Every poll interval the controller reads temperature, fan speed and
//! utilization of each GPU from `nvidia-smi`, derives one target fan speed from
//! the hottest device with a fixed step ramp, and pushes it through
//! `nvidia-settings`. When every GPU is cool and idle, or when the process is
//! interrupted, automatic fan control is handed back to the driver.
//!
//! ## Architecture
//!
//! - [`Controller`](controller::Controller) - the poll/decide/act loop and its state
//! - [`MeasurementSource`](sensors::MeasurementSource) and
//!   [`FanActuator`](fan_controller::FanActuator) - the collaborator seams
//! - [`drivers`] - implementations backed by the NVIDIA command-line tools
//! - [`Application`](application::Application) - wires everything from a [`Config`](config::Config)
//!
//! ## Example
//!
//! ```no_run
//! use gpufand::{application::Application, config::Config};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> gpufand::error::Result<()> {
//!     Application::builder()
//!         .with_config(Config::new(5, 40)?)
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod controller;
pub mod drivers;
pub mod error;
pub mod fan_controller;
pub mod fan_curve;
pub mod measurement;
pub mod process;
pub mod sensors;
pub mod shutdown;
