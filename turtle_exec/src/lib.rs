//! # Turtle library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the turtle executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Mission control - drives the turtle along a list of waypoints
pub mod mission_ctrl;

/// Executable parameters
pub mod params;

/// Path server - serves the path store over the network
pub mod path_server;

/// Path store - persistent storage of recorded paths
pub mod path_store;

/// Pose model - the kinematic state of a turtle
pub mod pose_model;

/// Session manager - the state of every connected client
pub mod session_mgr;

/// Telecommand server - recieves telecommands from clients
pub mod tc_server;

/// Telemetry server - publishes telemetry to clients
pub mod tm_server;
