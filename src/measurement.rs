//! GPU telemetry records and the `nvidia-smi` CSV wire format.

use log::warn;
use serde::Serialize;

use crate::error::{ControlError, Result};

/// One device's telemetry for a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Measurement {
    /// Device index, stable for the polling session.
    pub index: u32,
    /// Core temperature in °C.
    pub temperature: i32,
    /// Current fan duty cycle in percent, when the source reports one.
    pub fan_speed: Option<u8>,
    /// Compute utilization in percent, when the source reports one.
    pub utilization: Option<u8>,
}

impl Measurement {
    pub const fn new(
        index: u32,
        temperature: i32,
        fan_speed: Option<u8>,
        utilization: Option<u8>,
    ) -> Self {
        Self {
            index,
            temperature,
            fan_speed,
            utilization,
        }
    }
}

/// Column layout of the query output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryLayout {
    /// `index, temperature, fan_speed, utilization`
    #[default]
    WithFanSpeed,
    /// `index, temperature, utilization`
    WithoutFanSpeed,
}

impl QueryLayout {
    /// Field list passed to `nvidia-smi --query-gpu=`.
    pub const fn query_fields(self) -> &'static str {
        match self {
            Self::WithFanSpeed => "index,temperature.gpu,fan.speed,utilization.gpu",
            Self::WithoutFanSpeed => "index,temperature.gpu,utilization.gpu",
        }
    }

    const fn columns(self) -> usize {
        match self {
            Self::WithFanSpeed => 4,
            Self::WithoutFanSpeed => 3,
        }
    }
}

/// Parses the query output into measurements, one per non-blank line.
///
/// Each value may carry a trailing `%` unit and surrounding whitespace. Fan
/// speed and utilization may be unreported (`[N/A]`, `[Not Supported]`); the
/// row is kept with `None` in their place. Malformed lines are skipped with a
/// warning. An output without any valid
/// row is [`ControlError::NoDeviceDetected`].
///
/// # Example
///
/// ```
/// use gpufand::measurement::{parse_measurements, Measurement, QueryLayout};
///
/// let rows = parse_measurements("0, 65, 30 %, 50 %\n", QueryLayout::WithFanSpeed)?;
/// assert_eq!(rows, vec![Measurement::new(0, 65, Some(30), Some(50))]);
/// # Ok::<(), gpufand::error::ControlError>(())
/// ```
pub fn parse_measurements(output: &str, layout: QueryLayout) -> Result<Vec<Measurement>> {
    let measurements: Vec<Measurement> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_line(line, layout);
            if parsed.is_none() {
                warn!("Skipping malformed measurement line: {}", line.trim());
            }
            parsed
        })
        .collect();

    if measurements.is_empty() {
        return Err(ControlError::NoDeviceDetected);
    }

    Ok(measurements)
}

fn parse_line(line: &str, layout: QueryLayout) -> Option<Measurement> {
    let fields: Vec<&str> = line.split(',').map(strip_unit).collect();
    if fields.len() != layout.columns() {
        return None;
    }

    let index = fields[0].parse().ok()?;
    let temperature = fields[1].parse().ok()?;
    let (fan_speed, utilization) = match layout {
        QueryLayout::WithFanSpeed => (parse_optional(fields[2])?, fields[3]),
        QueryLayout::WithoutFanSpeed => (None, fields[2]),
    };

    Some(Measurement {
        index,
        temperature,
        fan_speed,
        utilization: parse_optional(utilization)?,
    })
}

fn strip_unit(field: &str) -> &str {
    let field = field.trim();
    field.strip_suffix('%').map_or(field, str::trim_end)
}

fn parse_percent(field: &str) -> Option<u8> {
    field.parse().ok().filter(|value| *value <= 100)
}

/// `Some(None)` for a value the device does not report, `None` for garbage.
fn parse_optional(field: &str) -> Option<Option<u8>> {
    match field {
        "[N/A]" | "N/A" | "[Not Supported]" => Some(None),
        other => parse_percent(other).map(Some),
    }
}
