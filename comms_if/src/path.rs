//! # Path records
//!
//! A path is the recorded trajectory of a turtle: a named, ordered list of timestamped poses and
//! a set of labelled stations along it. Every recorded path has a `start` and an `end` station.
//!
//! Paths are served by the path store over a REQ/REP socket using [`PathReq`] and
//! [`PathResponse`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{pose::Pose, tc::StationEnd};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Label of the station placed at the first recorded pose.
pub const START_STATION_LABEL: &str = "start";

/// Label of the station placed at the last recorded pose.
pub const END_STATION_LABEL: &str = "end";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a stored path.
pub type PathId = u64;

/// A single recorded pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    #[serde(flatten)]
    pub pose: Pose,

    /// Time at which the pose was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A labelled point of interest on a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub label: String,

    #[serde(flatten)]
    pub pose: Pose,
}

/// A path which has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPath {
    pub name: String,

    pub points: Vec<PathPoint>,

    pub stations: Vec<Station>,
}

/// A stored path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathId,

    pub name: String,

    pub points: Vec<PathPoint>,

    pub stations: Vec<Station>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A request to the path store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PathReq {
    /// Save a new path.
    Save(NewPath),

    /// List every stored path.
    List,

    /// Get a single path by id.
    Get { id: PathId },
}

/// A response from the path store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PathResponse {
    /// The path was saved with the given id.
    Saved { id: PathId },

    /// All stored paths, in id order.
    Paths { paths: Vec<Path> },

    /// The requested path.
    Path { path: Path },

    /// No path with the requested id exists.
    NotFound { id: PathId },

    /// The request was well formed but the store could not complete it.
    Failed { reason: String },

    /// The request could not be parsed.
    Invalid { reason: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Build a stored path from a new path and its allocated id.
    pub fn from_new(id: PathId, new_path: NewPath) -> Self {
        Self {
            id,
            name: new_path.name,
            points: new_path.points,
            stations: new_path.stations,
        }
    }

    /// The `[x, y]` positions of every point, in recorded order.
    pub fn waypoints(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| p.pose.position()).collect()
    }

    /// Get the station at one end of the path.
    ///
    /// The station labelled `start`/`end` is preferred. Paths saved without those labels fall
    /// back to the first/last station, and then to the first/last recorded point.
    pub fn endpoint(&self, end: StationEnd) -> Option<Pose> {
        let label = match end {
            StationEnd::Start => START_STATION_LABEL,
            StationEnd::End => END_STATION_LABEL,
        };

        if let Some(s) = self.stations.iter().find(|s| s.label == label) {
            return Some(s.pose);
        }

        let (station, point) = match end {
            StationEnd::Start => (self.stations.first(), self.points.first()),
            StationEnd::End => (self.stations.last(), self.points.last()),
        };

        station
            .map(|s| s.pose)
            .or_else(|| point.map(|p| p.pose))
    }
}

impl PathReq {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn point(x: f64, y: f64) -> PathPoint {
        PathPoint {
            pose: Pose::new(x, y, 0.0),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_endpoints_prefer_labels() {
        let path = Path {
            id: 1,
            name: String::from("loop"),
            points: vec![point(0.0, 0.0), point(1.0, 0.0), point(2.0, 0.0)],
            stations: vec![
                Station { label: String::from("charger"), pose: Pose::new(9.0, 9.0, 0.0) },
                Station { label: String::from(START_STATION_LABEL), pose: Pose::new(0.0, 0.0, 0.0) },
                Station { label: String::from(END_STATION_LABEL), pose: Pose::new(2.0, 0.0, 0.0) },
            ],
        };

        assert_eq!(path.endpoint(StationEnd::Start), Some(Pose::new(0.0, 0.0, 0.0)));
        assert_eq!(path.endpoint(StationEnd::End), Some(Pose::new(2.0, 0.0, 0.0)));
        assert_eq!(path.waypoints(), vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
    }

    #[test]
    fn test_endpoints_fallback_to_points() {
        let path = Path {
            id: 2,
            name: String::from("bare"),
            points: vec![point(1.0, 1.0), point(3.0, 1.0)],
            stations: vec![],
        };

        assert_eq!(path.endpoint(StationEnd::Start), Some(Pose::new(1.0, 1.0, 0.0)));
        assert_eq!(path.endpoint(StationEnd::End), Some(Pose::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn test_request_wire_format() {
        assert_eq!(PathReq::from_json(r#"{"type": "list"}"#).unwrap(), PathReq::List);
        assert_eq!(PathReq::from_json(r#"{"type": "get", "id": 4}"#).unwrap(), PathReq::Get { id: 4 });

        let req = PathReq::from_json(
            r#"{"type": "save", "name": "a", "points": [], "stations": []}"#
        ).unwrap();
        match req {
            PathReq::Save(p) => assert_eq!(p.name, "a"),
            r => panic!("Unexpected request {:?}", r),
        }
    }
}
