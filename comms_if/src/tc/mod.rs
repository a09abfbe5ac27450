//! # Telecommand module
//!
//! This module provides the telecommands (TCs) a client sends to the executive over the TC
//! socket, and the response the executive returns for each one.
//!
//! TCs are JSON objects tagged with a `type` field, for example:
//!
//! ```json
//! {"type": "manualControl", "linear": 0.5, "angular": 0.0}
//! {"type": "startMission", "waypoints": [[2.0, 0.0], [2.0, 2.0]], "direction": "forward"}
//! {"type": "stopMission"}
//! ```
//!
//! The executive keeps one simulated turtle per connected client, keyed by the zmq routing id of
//! the client's socket. A client which wants to filter telemetry for its own turtle should set an
//! explicit routing id (`ZMQ_ROUTING_ID`) before connecting.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the executive by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Tc {
    /// Keep the client's session alive. Also opens a session if none exists.
    Heartbeat,

    /// Close the client's session, stopping any running mission.
    Disconnect,

    /// Drive the turtle one discrete step.
    ///
    /// Rejected while a mission is running.
    ManualControl {
        /// Distance to move along the current heading.
        linear: f64,

        /// Angle to turn after moving, anticlockwise positive.
        angular: f64
    },

    /// Start following the given waypoints.
    StartMission {
        /// Ordered `[x, y]` waypoints in the arena frame.
        waypoints: Vec<[f64; 2]>,

        /// Traversal direction, forward if omitted.
        #[serde(default)]
        direction: Direction
    },

    /// Start following a stored path from one of its endpoint stations.
    ///
    /// The turtle is first placed on the chosen station. Starting from `end` traverses the path
    /// in reverse.
    StartPathMission {
        #[serde(rename = "pathId")]
        path_id: u64,

        from: StationEnd
    },

    /// Stop the running mission, if any.
    StopMission,

    /// Place the turtle at an absolute pose.
    Teleport {
        x: f64,
        y: f64,
        theta: f64
    },

    /// Begin recording the turtle's trajectory.
    StartRecording,

    /// Add a labelled station at the current pose of the recording.
    AddStation {
        label: String
    },

    /// Finish the recording and save it to the path store under the given name.
    StopRecording {
        name: String
    }
}

/// Direction in which a list of waypoints is traversed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// In the order given (as recorded).
    Forward,

    /// From the last waypoint to the first.
    Reverse
}

/// One of the two endpoint stations of a recorded path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationEnd {
    Start,
    End
}

/// Response sent back to the client for every TC it sends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted and executed.
    Ok,

    /// The TC could not be parsed or contained invalid values.
    Invalid,

    /// The TC was valid but cannot be executed in the current state (for example a mission is
    /// already running).
    CannotExecute
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC is not valid UTF-8")]
    NonUtf8,

    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Parse a new TC from the raw bytes of a message frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TcParseError> {
        let json_str = std::str::from_utf8(bytes).map_err(|_| TcParseError::NonUtf8)?;

        Self::from_json(json_str)
    }

    /// Serialise the TC into its JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

impl From<StationEnd> for Direction {
    /// Starting from the start station follows the path as recorded, starting from the end
    /// station retraces it.
    fn from(end: StationEnd) -> Self {
        match end {
            StationEnd::Start => Direction::Forward,
            StationEnd::End => Direction::Reverse
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_manual_control() {
        let tc = Tc::from_json(r#"{"type": "manualControl", "linear": 0.5, "angular": -0.1}"#)
            .unwrap();
        assert_eq!(tc, Tc::ManualControl { linear: 0.5, angular: -0.1 });
    }

    #[test]
    fn test_parse_start_mission_default_direction() {
        let tc = Tc::from_json(r#"{"type": "startMission", "waypoints": [[2, 0], [2, 2]]}"#)
            .unwrap();
        assert_eq!(tc, Tc::StartMission {
            waypoints: vec![[2.0, 0.0], [2.0, 2.0]],
            direction: Direction::Forward
        });

        let tc = Tc::from_json(
            r#"{"type": "startMission", "waypoints": [[1, 0]], "direction": "reverse"}"#
        ).unwrap();
        match tc {
            Tc::StartMission { direction, .. } => assert_eq!(direction, Direction::Reverse),
            t => panic!("Unexpected TC {:?}", t)
        }
    }

    #[test]
    fn test_parse_path_mission() {
        let tc = Tc::from_json(r#"{"type": "startPathMission", "pathId": 3, "from": "end"}"#)
            .unwrap();
        assert_eq!(tc, Tc::StartPathMission { path_id: 3, from: StationEnd::End });
        assert_eq!(Direction::from(StationEnd::End), Direction::Reverse);
    }

    #[test]
    fn test_parse_unit_commands() {
        assert_eq!(Tc::from_json(r#"{"type": "stopMission"}"#).unwrap(), Tc::StopMission);
        assert_eq!(Tc::from_json(r#"{"type": "heartbeat"}"#).unwrap(), Tc::Heartbeat);
    }

    #[test]
    fn test_parse_malformed() {
        // Non-numeric velocity
        assert!(matches!(
            Tc::from_json(r#"{"type": "manualControl", "linear": "fast", "angular": 0}"#),
            Err(TcParseError::InvalidJson(_))
        ));

        // Unknown type
        assert!(matches!(
            Tc::from_json(r#"{"type": "selfDestruct"}"#),
            Err(TcParseError::InvalidJson(_))
        ));

        // Not UTF-8
        assert!(matches!(Tc::from_bytes(&[0xff, 0xfe]), Err(TcParseError::NonUtf8)));
    }
}
