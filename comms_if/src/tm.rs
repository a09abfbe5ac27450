//! # Telemetry module
//!
//! Telemetry (TM) is published by the executive to every connected client. Each packet names the
//! client session whose turtle it describes, so front ends can render several turtles at once.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{pose::Pose, tc::Direction};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry packet that is output by the TM server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmPacket {
    /// Identity of the client session the telemetry belongs to.
    pub session: String,

    /// The telemetry itself.
    pub tm: Tm,
}

/// Pose telemetry, including the velocity command applied to reach it.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseTm {
    #[serde(flatten)]
    pub pose: Pose,

    /// Linear velocity of the last applied command.
    pub linear: f64,

    /// Angular velocity of the last applied command.
    pub angular: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single telemetry item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Tm {
    /// The turtle's pose changed.
    Pose(PoseTm),

    /// A mission was accepted and armed.
    MissionStarted {
        /// Waypoints in traversal order.
        waypoints: Vec<[f64; 2]>,

        direction: Direction,
    },

    /// The mission's target waypoint was reached.
    WaypointReached {
        /// Index of the reached waypoint in traversal order.
        index: usize,
    },

    /// The final waypoint was reached and the turtle stopped.
    MissionComplete,

    /// The mission ended before completion.
    MissionStopped { cause: StopCause },

    /// Trajectory recording began.
    RecordingStarted,

    /// A labelled station was added to the recording.
    StationAdded { label: String },

    /// The recording was saved to the path store.
    RecordingSaved {
        #[serde(rename = "pathId")]
        path_id: u64,

        name: String,
    },

    /// A user-visible notification, for example a path store failure.
    Notice { message: String },

    /// The client session was closed and its turtle removed.
    SessionClosed,
}

/// Reason a mission was stopped before completion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopCause {
    /// A `stopMission` TC was received.
    Requested,

    /// The client disconnected or timed out.
    Disconnected,

    /// The turtle made no progress towards its target for too many ticks.
    Stalled,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmPacket {
    pub fn new<S: Into<String>>(session: S, tm: Tm) -> Self {
        Self {
            session: session.into(),
            tm,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pose_wire_format() {
        let packet = TmPacket::new(
            "0a1b",
            Tm::Pose(PoseTm {
                pose: Pose::new(1.0, 2.0, 0.5),
                linear: 0.1,
                angular: 0.0,
            }),
        );

        assert_eq!(
            serde_json::to_value(&packet).unwrap(),
            json!({
                "session": "0a1b",
                "tm": {"type": "pose", "x": 1.0, "y": 2.0, "theta": 0.5, "linear": 0.1, "angular": 0.0}
            })
        );
    }

    #[test]
    fn test_lifecycle_wire_format() {
        assert_eq!(
            serde_json::to_value(&Tm::MissionComplete).unwrap(),
            json!({"type": "missionComplete"})
        );
        assert_eq!(
            serde_json::to_value(&Tm::MissionStopped { cause: StopCause::Requested }).unwrap(),
            json!({"type": "missionStopped", "cause": "requested"})
        );
        assert_eq!(
            serde_json::to_value(&Tm::MissionStarted {
                waypoints: vec![[2.0, 0.0]],
                direction: Direction::Reverse
            }).unwrap(),
            json!({"type": "missionStarted", "waypoints": [[2.0, 0.0]], "direction": "reverse"})
        );
    }
}
