//! # Path recorder
//!
//! Accumulates the trajectory of one turtle while a recording is active. Poses closer than the
//! minimum separation to the last recorded point are dropped, except that the final pose is
//! always kept when the recording is finished.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::Vector2;

use comms_if::{
    path::{NewPath, PathPoint, Station, END_STATION_LABEL, START_STATION_LABEL},
    pose::Pose,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorder {
    points: Vec<PathPoint>,

    /// Stations added during the recording, excluding the start and end stations.
    stations: Vec<Station>,

    /// Most recent pose observed, recorded or not.
    last_seen: PathPoint,

    min_separation_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Recorder {
    /// Start a recording at the given pose.
    pub fn new(pose: Pose, timestamp: DateTime<Utc>, min_separation_m: f64) -> Self {
        let first = PathPoint { pose, timestamp };

        Self {
            points: vec![first],
            stations: Vec::new(),
            last_seen: first,
            min_separation_m,
        }
    }

    /// True if `label` is reserved for the stations added automatically.
    pub fn is_reserved_label(label: &str) -> bool {
        label == START_STATION_LABEL || label == END_STATION_LABEL
    }

    /// Observe a new pose of the turtle.
    pub fn record(&mut self, pose: Pose, timestamp: DateTime<Utc>) {
        self.last_seen = PathPoint { pose, timestamp };

        let far_enough = match self.points.last() {
            Some(last) => separation_m(&last.pose, &pose) >= self.min_separation_m,
            None => true
        };

        if far_enough {
            self.points.push(self.last_seen);
        }
    }

    /// Add a labelled station at the given pose.
    pub fn add_station(&mut self, label: String, pose: Pose) {
        self.stations.push(Station { label, pose });
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Build the path described by this recording.
    ///
    /// The first point becomes the `start` station and the last observed pose the `end` station.
    /// The recorder is left untouched so the recording can continue if saving fails.
    pub fn finish(&self, name: &str) -> NewPath {
        let mut points = self.points.clone();

        let last_recorded = points.last().map(|p| p.pose);
        if last_recorded != Some(self.last_seen.pose) {
            points.push(self.last_seen);
        }

        let start_pose = points.first().map(|p| p.pose).unwrap_or(self.last_seen.pose);

        let mut stations = Vec::with_capacity(self.stations.len() + 2);
        stations.push(Station { label: START_STATION_LABEL.into(), pose: start_pose });
        stations.extend(self.stations.iter().cloned());
        stations.push(Station { label: END_STATION_LABEL.into(), pose: self.last_seen.pose });

        NewPath {
            name: name.into(),
            points,
            stations,
        }
    }
}

fn separation_m(a: &Pose, b: &Pose) -> f64 {
    (Vector2::new(b.x_m, b.y_m) - Vector2::new(a.x_m, a.y_m)).norm()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recorder() {
        let mut rec = Recorder::new(Pose::new(0.0, 0.0, 0.0), Utc::now(), 0.05);

        rec.record(Pose::new(0.01, 0.0, 0.0), Utc::now());
        assert_eq!(rec.num_points(), 1);

        rec.record(Pose::new(0.5, 0.0, 0.0), Utc::now());
        rec.add_station("mid".into(), Pose::new(0.5, 0.0, 0.0));
        rec.record(Pose::new(1.0, 0.0, 0.0), Utc::now());
        rec.record(Pose::new(1.02, 0.0, 0.2), Utc::now());
        assert_eq!(rec.num_points(), 3);

        let path = rec.finish("line");
        assert_eq!(path.name, "line");
        assert_eq!(path.points.len(), 4);
        assert_eq!(path.points[3].pose, Pose::new(1.02, 0.0, 0.2));

        let labels: Vec<&str> = path.stations.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["start", "mid", "end"]);
        assert_eq!(path.stations[0].pose, Pose::new(0.0, 0.0, 0.0));
        assert_eq!(path.stations[2].pose, Pose::new(1.02, 0.0, 0.2));

        assert!(Recorder::is_reserved_label("start"));
        assert!(!Recorder::is_reserved_label("mid"));
    }
}
