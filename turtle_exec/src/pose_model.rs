//! # Pose model
//!
//! The kinematic state of a simulated turtle and the update law shared by manual control and the
//! mission controller.
//!
//! One discrete step of the update law is:
//!
//! ```text
//! x     += linear * cos(theta)
//! y     += linear * sin(theta)
//! theta += angular
//! ```
//!
//! after which the heading is wrapped into (-pi, pi] and the position is clamped into the arena.
//! Clamping is silent saturation, driving into a wall is not a fault.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{pose::Pose, tm::PoseTm};
use util::maths::{clamp, wrap_to_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lower bound of the arena on both axes.
///
/// Units: meters
pub const ARENA_MIN_M: f64 = -10.0;

/// Upper bound of the arena on both axes.
///
/// Units: meters
pub const ARENA_MAX_M: f64 = 10.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A velocity command.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct VelCmd {
    /// Linear velocity along the heading.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Angular velocity, anticlockwise positive.
    ///
    /// Units: radians/second
    pub angular_rads: f64,
}

/// The pose of one turtle and the last velocity command applied to it.
#[derive(Debug, Default, Clone)]
pub struct PoseModel {
    pose: Pose,
    vel: VelCmd,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VelCmd {
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self { linear_ms, angular_rads }
    }

    /// The zero command.
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        self.linear_ms == 0.0 && self.angular_rads == 0.0
    }
}

impl PoseModel {
    /// Create a new model with the turtle at the origin, facing +X.
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate one manual control step.
    ///
    /// The caller is responsible for rejecting manual control while a mission is running.
    pub fn apply_manual_velocity(&mut self, linear: f64, angular: f64) {
        self.apply_velocity(VelCmd::new(linear, angular), 1.0);
    }

    /// Integrate one step of the given command scaled by `dt_s`.
    pub fn apply_velocity(&mut self, cmd: VelCmd, dt_s: f64) {
        let dist_m = cmd.linear_ms * dt_s;
        let theta_rad = self.pose.theta_rad;

        self.pose.x_m += dist_m * theta_rad.cos();
        self.pose.y_m += dist_m * theta_rad.sin();
        self.pose.theta_rad = theta_rad + cmd.angular_rads * dt_s;

        self.vel = cmd;

        self.constrain();
    }

    /// Set the pose absolutely. The result is subject to the same arena constraints as motion.
    pub fn teleport(&mut self, x_m: f64, y_m: f64, theta_rad: f64) {
        self.pose = Pose::new(x_m, y_m, theta_rad);
        self.vel = VelCmd::stop();

        self.constrain();
    }

    /// Zero the velocity without moving.
    pub fn halt(&mut self) {
        self.vel = VelCmd::stop();
    }

    /// The current pose.
    pub fn snapshot(&self) -> Pose {
        self.pose
    }

    /// The last applied velocity command.
    pub fn velocity(&self) -> VelCmd {
        self.vel
    }

    /// Telemetry describing the current state.
    pub fn to_tm(&self) -> PoseTm {
        PoseTm {
            pose: self.pose,
            linear: self.vel.linear_ms,
            angular: self.vel.angular_rads,
        }
    }

    fn constrain(&mut self) {
        self.pose.x_m = clamp(self.pose.x_m, ARENA_MIN_M, ARENA_MAX_M);
        self.pose.y_m = clamp(self.pose.y_m, ARENA_MIN_M, ARENA_MAX_M);
        self.pose.theta_rad = wrap_to_pi(self.pose.theta_rad);
    }
}
