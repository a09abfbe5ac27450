//! # Steering policy
//!
//! Computes the velocity command which moves the turtle towards a single target point. The policy
//! is stateless, everything it needs is in the pose, the target and the parameters.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::Params;
use crate::pose_model::VelCmd;
use comms_if::pose::Pose;
use util::maths::{sat_abs, wrap_to_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Errors between the turtle's pose and the target.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct SteerErrors {
    /// Straight line distance to the target
    pub distance_m: f64,

    /// Bearing of the target from the turtle, anticlockwise from +X
    pub bearing_rad: f64,

    /// Bearing minus heading, wrapped into (-pi, pi]
    pub heading_error_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of the steering policy for one tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Steer {
    /// Turn on the spot to face the target.
    Rotate(VelCmd),

    /// Drive towards the target.
    Drive(VelCmd),

    /// The target is within the arrival tolerance.
    Arrived,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Steer {
    /// The velocity command to apply this tick. Arrival commands no motion.
    pub fn cmd(&self) -> VelCmd {
        match self {
            Steer::Rotate(c) | Steer::Drive(c) => *c,
            Steer::Arrived => VelCmd::stop(),
        }
    }
}

impl SteerErrors {
    pub fn between(pose: &Pose, target: [f64; 2]) -> Self {
        let delta = Vector2::new(target[0], target[1]) - Vector2::new(pose.x_m, pose.y_m);
        let bearing_rad = delta.y.atan2(delta.x);

        Self {
            distance_m: delta.norm(),
            bearing_rad,
            heading_error_rad: wrap_to_pi(bearing_rad - pose.theta_rad),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply the steering policy for one tick.
///
/// The drive branch is taken at `distance >= arrival_tolerance_m`, so the arrival branch is only
/// taken when the sequencer will also see an arrival.
pub fn steer(pose: &Pose, target: [f64; 2], params: &Params) -> (Steer, SteerErrors) {
    let errors = SteerErrors::between(pose, target);
    let angular = sat_abs(errors.heading_error_rad, params.max_angular_rads);

    let steer = if errors.heading_error_rad.abs() > params.rotate_threshold_rad {
        Steer::Rotate(VelCmd::new(0.0, angular))
    }
    else if errors.distance_m >= params.arrival_tolerance_m {
        Steer::Drive(VelCmd::new(
            errors.distance_m.min(params.max_linear_ms),
            angular
        ))
    }
    else {
        Steer::Arrived
    };

    (steer, errors)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rotate_in_place() {
        let params = Params::default();

        // Target 5 m away at a bearing of 0.5 rad from the heading
        let target = [5.0 * 0.5f64.cos(), 5.0 * 0.5f64.sin()];
        let (s, e) = steer(&Pose::new(0.0, 0.0, 0.0), target, &params);

        assert!((e.distance_m - 5.0).abs() < 1e-9);
        assert!((e.heading_error_rad - 0.5).abs() < 1e-9);
        match s {
            Steer::Rotate(c) => {
                assert_eq!(c.linear_ms, 0.0);
                assert!((c.angular_rads - 0.5).abs() < 1e-9);
            }
            _ => panic!("Expected rotate, got {:?}", s),
        }

        // Large errors saturate, negative errors turn clockwise
        let (s, _) = steer(&Pose::new(0.0, 0.0, 0.0), [0.0, -3.0], &params);
        assert_eq!(s, Steer::Rotate(VelCmd::new(0.0, -1.0)));
    }

    #[test]
    fn test_drive() {
        let params = Params::default();

        let (s, _) = steer(&Pose::new(0.0, 0.0, 0.0), [4.0, 0.0], &params);
        assert_eq!(s, Steer::Drive(VelCmd::new(1.0, 0.0)));

        let (s, e) = steer(&Pose::new(0.0, 0.0, 0.1), [0.5, 0.0], &params);
        assert!((e.heading_error_rad + 0.1).abs() < 1e-9);
        match s {
            Steer::Drive(c) => {
                assert!((c.linear_ms - 0.5).abs() < 1e-9);
                assert!((c.angular_rads + 0.1).abs() < 1e-9);
            }
            _ => panic!("Expected drive, got {:?}", s),
        }
    }

    #[test]
    fn test_arrived() {
        let params = Params::default();

        let (s, _) = steer(&Pose::new(1.95, 0.0, 0.0), [2.0, 0.0], &params);
        assert_eq!(s, Steer::Arrived);
        assert!(s.cmd().is_stop());

        // Close but facing away still turns first
        let (s, _) = steer(&Pose::new(1.95, 0.0, std::f64::consts::PI), [2.0, 0.0], &params);
        assert!(matches!(s, Steer::Rotate(_)));
    }
}
