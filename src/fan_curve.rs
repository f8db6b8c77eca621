//! Fan ramp for temperature-based speed control.
//!
//! Maps a temperature to a target duty cycle with a fixed step function
//! anchored on the configured base temperature.

/// Step of the ramp: strictly above `offset` degrees over the base, run at `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub offset: i32,
    pub speed: u8,
}

/// Steps from hottest to coolest.
pub const STEPS: [Step; 4] = [
    Step { offset: 20, speed: 100 },
    Step { offset: 15, speed: 90 },
    Step { offset: 10, speed: 75 },
    Step { offset: 5, speed: 60 },
];

/// Speed used at or below the first step.
pub const FLOOR_SPEED: u8 = 30;

/// Temperature-to-duty-cycle step function.
///
/// Comparisons are strict: a temperature exactly on a step boundary falls
/// into the lower bracket.
///
/// # Example
///
/// ```
/// use gpufand::fan_curve::Ramp;
///
/// let ramp = Ramp::new(40);
/// assert_eq!(ramp.target_speed(45), 30);
/// assert_eq!(ramp.target_speed(46), 60);
/// assert_eq!(ramp.target_speed(61), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    base_temperature: i32,
}

impl Ramp {
    pub const fn new(base_temperature: i32) -> Self {
        Self { base_temperature }
    }

    /// Target fan speed in percent for `temperature`.
    pub fn target_speed(&self, temperature: i32) -> u8 {
        let delta = temperature.saturating_sub(self.base_temperature);
        STEPS
            .iter()
            .find(|step| delta > step.offset)
            .map_or(FLOOR_SPEED, |step| step.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn ramp_reference_points_for_base_40() {
        let ramp = Ramp::new(40);
        assert_eq!(ramp.target_speed(40), 30);
        assert_eq!(ramp.target_speed(46), 60);
        assert_eq!(ramp.target_speed(51), 75);
        assert_eq!(ramp.target_speed(56), 90);
        assert_eq!(ramp.target_speed(61), 100);
    }

    #[test]
    fn boundaries_fall_to_lower_bracket() {
        let ramp = Ramp::new(40);
        assert_eq!(ramp.target_speed(45), 30);
        assert_eq!(ramp.target_speed(50), 60);
        assert_eq!(ramp.target_speed(55), 75);
        assert_eq!(ramp.target_speed(60), 90);
    }

    #[test]
    fn ramp_follows_base_temperature() {
        let ramp = Ramp::new(35);
        assert_eq!(ramp.target_speed(40), 30);
        assert_eq!(ramp.target_speed(41), 60);
        assert_eq!(ramp.target_speed(56), 100);
    }

    #[test]
    fn extreme_temperature_values() {
        let ramp = Ramp::new(60);
        assert_eq!(ramp.target_speed(i32::MIN), FLOOR_SPEED);
        assert_eq!(ramp.target_speed(-40), FLOOR_SPEED);
        assert_eq!(ramp.target_speed(i32::MAX), 100);
    }

    proptest! {
        #[test]
        fn ramp_is_monotonic(base in 35i32..=60, t in -50i32..150) {
            let ramp = Ramp::new(base);
            prop_assert!(ramp.target_speed(t) <= ramp.target_speed(t + 1));
        }

        #[test]
        fn ramp_output_is_a_known_step(base in 35i32..=60, t in -50i32..150) {
            let speed = Ramp::new(base).target_speed(t);
            prop_assert!([30u8, 60, 75, 90, 100].contains(&speed));
        }
    }
}
