//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the turtle mission software: the
//! telecommands clients send to the executive, the telemetry the executive publishes, the path
//! records and requests served by the path store, and the zmq network layer they travel over.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic types shared by telecommands, telemetry and paths
pub mod pose;

/// Telecommands sent by clients to the executive
pub mod tc;

/// Telemetry published by the executive to every client
pub mod tm;

/// Stored path records and the path store request/response API
pub mod path;

/// Network module
pub mod net;
