//! Waypoint sequencer
//!
//! The sequencer maps a mission cursor onto the waypoint list in the mission's direction of
//! travel and decides when the cursor moves on. It holds no cursor itself, the controller owns
//! it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{pose::Pose, tc::Direction};
use util::maths::norm;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSequencer {
    points: Vec<[f64; 2]>,
    direction: Direction,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointSequencer {
    pub fn new(points: Vec<[f64; 2]>, direction: Direction) -> Self {
        Self { points, direction }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The waypoint at `cursor` in traversal order, or `None` once the sequence is exhausted.
    pub fn current_target(&self, cursor: usize) -> Option<[f64; 2]> {
        if cursor >= self.points.len() {
            return None
        }

        let index = match self.direction {
            Direction::Forward => cursor,
            Direction::Reverse => self.points.len() - 1 - cursor
        };

        self.points.get(index).copied()
    }

    /// Returns `cursor + 1` if `pose` is within `tolerance_m` of the current target, otherwise
    /// `cursor`. An exhausted sequence never advances.
    pub fn advance_if_arrived(&self, pose: &Pose, cursor: usize, tolerance_m: f64) -> usize {
        let target = match self.current_target(cursor) {
            Some(t) => t,
            None => return cursor
        };

        match norm(&pose.position()[..], &target[..]) {
            Some(d) if d < tolerance_m => cursor + 1,
            _ => cursor
        }
    }

    /// All waypoints in traversal order.
    pub fn ordered(&self) -> Vec<[f64; 2]> {
        (0..self.len()).filter_map(|c| self.current_target(c)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_current_target() {
        let pts = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];

        let fwd = WaypointSequencer::new(pts.clone(), Direction::Forward);
        assert_eq!(fwd.current_target(0), Some([0.0, 0.0]));
        assert_eq!(fwd.current_target(2), Some([2.0, 0.0]));
        assert_eq!(fwd.current_target(3), None);

        let rev = WaypointSequencer::new(pts, Direction::Reverse);
        assert_eq!(rev.current_target(0), Some([2.0, 0.0]));
        assert_eq!(rev.current_target(2), Some([0.0, 0.0]));
        assert_eq!(rev.current_target(3), None);
        assert_eq!(rev.ordered(), vec![[2.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);

        let empty = WaypointSequencer::new(vec![], Direction::Reverse);
        assert_eq!(empty.current_target(0), None);
    }

    #[test]
    fn test_advance_if_arrived() {
        let seq = WaypointSequencer::new(vec![[1.0, 1.0], [3.0, 1.0]], Direction::Forward);

        assert_eq!(seq.advance_if_arrived(&Pose::new(0.0, 0.0, 0.0), 0, 0.1), 0);
        assert_eq!(seq.advance_if_arrived(&Pose::new(1.05, 0.95, 2.0), 0, 0.1), 1);
        assert_eq!(seq.advance_if_arrived(&Pose::new(1.0, 1.0, 0.0), 1, 0.1), 1);
        assert_eq!(seq.advance_if_arrived(&Pose::new(3.0, 1.0, 0.0), 1, 0.1), 2);

        // Exactly on the tolerance is not an arrival
        assert_eq!(seq.advance_if_arrived(&Pose::new(3.0, 1.5, 0.0), 1, 0.5), 1);

        // Exhausted
        assert_eq!(seq.advance_if_arrived(&Pose::new(3.0, 1.0, 0.0), 2, 0.1), 2);
    }
}
