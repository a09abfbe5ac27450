//! # Pose types
//!
//! The pose of the turtle is expressed in the arena frame: X to the right, Y up, heading measured
//! anticlockwise from +X. On the wire the fields are named `x`, `y` and `theta`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Position and heading of the turtle in the arena frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position along the X axis.
    ///
    /// Units: meters
    #[serde(rename = "x")]
    pub x_m: f64,

    /// Position along the Y axis.
    ///
    /// Units: meters
    #[serde(rename = "y")]
    pub y_m: f64,

    /// Heading, anticlockwise from +X, in (-pi, pi].
    ///
    /// Units: radians
    #[serde(rename = "theta")]
    pub theta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, theta_rad: f64) -> Self {
        Self { x_m, y_m, theta_rad }
    }

    /// The 2D position of the pose as an `[x, y]` pair.
    pub fn position(&self) -> [f64; 2] {
        [self.x_m, self.y_m]
    }

    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x_m.is_finite() && self.y_m.is_finite() && self.theta_rad.is_finite()
    }
}
