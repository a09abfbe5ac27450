//! # Mission control module
//!
//! Mission control drives the turtle autonomously along a list of waypoints. A mission is a
//! closed loop run at a fixed tick period: on each tick the controller reads the turtle's pose,
//! works out the distance and bearing to the current target waypoint, and outputs a bounded
//! velocity command.
//!
//! The steering policy has three branches:
//!
//! - If the heading error to the target is larger than the rotate threshold the turtle turns on
//!   the spot.
//! - Otherwise, if the target is further away than the arrival tolerance, the turtle drives
//!   towards it while continuing to correct its heading.
//! - Otherwise the target has been reached and the cursor moves on to the next waypoint. No
//!   motion is commanded on that tick.
//!
//! Once every waypoint has been reached the mission completes. A mission can also be stopped
//! externally, or by the controller itself if a waypoint is not reached within
//! `max_ticks_per_waypoint` ticks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod sequencer;
pub mod state;
pub mod steering;
pub mod ticker;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use sequencer::WaypointSequencer;
pub use state::*;
pub use steering::{steer, Steer, SteerErrors};
pub use ticker::Ticker;
