//! Mission control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for mission control
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Params {

    /// Period between two mission ticks. Commands are scaled by this period when applied to the
    /// pose.
    pub tick_period_s: f64,

    /// Distance under which a waypoint is considered reached.
    pub arrival_tolerance_m: f64,

    /// Heading error above which the turtle turns on the spot rather than driving.
    pub rotate_threshold_rad: f64,

    /// Maximum linear velocity demand
    pub max_linear_ms: f64,

    /// Maximum angular velocity demand
    pub max_angular_rads: f64,

    /// Number of ticks the controller may spend on one waypoint before the mission is stopped as
    /// stalled.
    pub max_ticks_per_waypoint: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            arrival_tolerance_m: 0.1,
            rotate_threshold_rad: 0.2,
            max_linear_ms: 1.0,
            max_angular_rads: 1.0,
            max_ticks_per_waypoint: 600
        }
    }
}

impl Params {
    /// Check the parameters describe a usable controller, returning a description of the first
    /// problem found.
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("tick_period_s", self.tick_period_s),
            ("arrival_tolerance_m", self.arrival_tolerance_m),
            ("max_linear_ms", self.max_linear_ms),
            ("max_angular_rads", self.max_angular_rads),
        ];

        for (name, value) in positive.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(format!("{} must be finite and positive, got {}", name, value))
            }
        }

        if !self.rotate_threshold_rad.is_finite() || self.rotate_threshold_rad < 0.0 {
            return Err(format!(
                "rotate_threshold_rad must be finite and non-negative, got {}",
                self.rotate_threshold_rad
            ))
        }

        if self.max_ticks_per_waypoint == 0 {
            return Err("max_ticks_per_waypoint must be at least 1".into())
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let p: Params = util::params::from_str(r#"
            tick_period_s = 0.1
            arrival_tolerance_m = 0.1
            rotate_threshold_rad = 0.2
            max_linear_ms = 1.0
            max_angular_rads = 1.0
            max_ticks_per_waypoint = 600
        "#).unwrap();

        assert_eq!(p, Params::default());
        assert!(p.check().is_ok());
    }

    #[test]
    fn test_params_check() {
        let mut p = Params::default();
        p.tick_period_s = 0.0;
        assert!(p.check().is_err());

        let mut p = Params::default();
        p.max_linear_ms = std::f64::NAN;
        assert!(p.check().is_err());

        let mut p = Params::default();
        p.max_ticks_per_waypoint = 0;
        assert!(p.check().is_err());
    }
}
