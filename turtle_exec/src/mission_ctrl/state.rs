//! Mission control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::time::{Duration, Instant};

// Internal
use super::*;
use crate::pose_model::VelCmd;
use comms_if::{pose::Pose, tc::Direction, tm::StopCause};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The mission controller for a single turtle.
///
/// A controller runs at most one mission. Once the mission has completed or been stopped the
/// controller is finished and the owner should discard it.
#[derive(Debug, Clone)]
pub struct MissionCtrl {
    params: Params,

    /// Executing mode
    mode: MissionMode,

    /// The waypoints being followed, `None` until started
    sequencer: Option<WaypointSequencer>,

    /// Index (in traversal order) of the current target waypoint
    cursor: usize,

    /// Number of ticks since the cursor last moved
    ticks_on_target: u64,

    ticker: Ticker,

    report: StatusReport,
}

/// Output of one mission tick.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct TickOutput {
    /// Command to apply to the pose, scaled by the tick period.
    pub cmd: VelCmd,

    /// Lifecycle event raised by this tick, if any.
    pub event: Option<MissionEvent>,
}

/// The status report containing the monitoring quantities of the last tick.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Index of the current target in traversal order
    pub cursor: usize,

    /// Total number of waypoints in the mission
    pub num_waypoints: usize,

    /// Errors to the current target
    pub errors: SteerErrors,

    /// Ticks spent on the current target
    pub ticks_on_target: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur when starting a mission.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MissionCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A mission is already running. The running mission is not affected.
    #[error("Attempted to start a mission while one is already running")]
    AlreadyRunning,

    /// The controller has already run a mission to its end.
    #[error("This controller has already finished a mission")]
    AlreadyFinished,

    #[error("Attempted to start a mission with no waypoints")]
    NoWaypoints,

    /// The waypoint at the contained index has a non-finite coordinate.
    #[error("Waypoint {0} is not a finite point")]
    NonFiniteWaypoint(usize),
}

/// The possible modes of a mission controller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MissionMode {
    Idle,
    Running,
    Completed,
    Stopped(StopCause),
}

/// Mission lifecycle event raised by a tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MissionEvent {
    /// The waypoint with the given traversal index was reached.
    WaypointReached(usize),

    /// Every waypoint was reached.
    Completed,

    /// The current waypoint was not reached in time and the mission was stopped.
    Stalled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionMode {
    /// True for the modes a controller cannot leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionMode::Completed | MissionMode::Stopped(_))
    }
}

impl MissionCtrl {
    /// Create a new idle controller.
    pub fn new(params: Params) -> Self {
        let ticker = Ticker::new(Duration::from_secs_f64(params.tick_period_s));

        Self {
            params,
            mode: MissionMode::Idle,
            sequencer: None,
            cursor: 0,
            ticks_on_target: 0,
            ticker,
            report: StatusReport::default(),
        }
    }

    /// Load the controller parameters from the given file in the parameters directory.
    pub fn load_params(params_path: &str) -> Result<Params, MissionCtrlError> {
        let params: Params = params::load(params_path)
            .map_err(|e| MissionCtrlError::ParamLoadError(e.to_string()))?;

        params.check().map_err(MissionCtrlError::InvalidParams)?;

        Ok(params)
    }

    /// Begin a mission along `waypoints` in the given direction.
    ///
    /// The first tick is due one tick period after `now`. Starting while a mission is running is
    /// rejected without affecting the running mission.
    pub fn start(
        &mut self,
        waypoints: Vec<[f64; 2]>,
        direction: Direction,
        now: Instant
    ) -> Result<(), MissionCtrlError> {

        match self.mode {
            MissionMode::Running => return Err(MissionCtrlError::AlreadyRunning),
            MissionMode::Completed | MissionMode::Stopped(_) => {
                return Err(MissionCtrlError::AlreadyFinished)
            }
            MissionMode::Idle => ()
        }

        if waypoints.is_empty() {
            return Err(MissionCtrlError::NoWaypoints)
        }

        if let Some(i) = waypoints
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(MissionCtrlError::NonFiniteWaypoint(i))
        }

        info!(
            "Starting {:?} mission through {} waypoint(s)",
            direction,
            waypoints.len()
        );

        self.report = StatusReport {
            num_waypoints: waypoints.len(),
            ..Default::default()
        };
        self.sequencer = Some(WaypointSequencer::new(waypoints, direction));
        self.cursor = 0;
        self.ticks_on_target = 0;
        self.ticker.arm(now);
        self.mode = MissionMode::Running;

        Ok(())
    }

    /// Stop the mission.
    ///
    /// The ticker is cancelled before this returns. Returns true if a running mission was stopped,
    /// false if there was nothing to stop.
    pub fn stop(&mut self, cause: StopCause) -> bool {
        if self.mode != MissionMode::Running {
            return false
        }

        info!("Mission stopped ({:?}) at waypoint {}", cause, self.cursor);

        self.ticker.cancel();
        self.mode = MissionMode::Stopped(cause);

        true
    }

    /// Returns true if a tick is due at `now`, scheduling the next one.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        self.mode == MissionMode::Running && self.ticker.poll(now)
    }

    /// Execute one tick of the mission from the given pose.
    ///
    /// The returned command must be applied to the pose scaled by `dt_s()`. A controller which is
    /// not running outputs a stop command and no event.
    pub fn step(&mut self, pose: &Pose) -> TickOutput {
        if self.mode != MissionMode::Running {
            return TickOutput::default()
        }

        // ---- TARGET MANAGEMENT ----

        let target = match self
            .sequencer
            .as_ref()
            .and_then(|s| s.current_target(self.cursor))
        {
            Some(t) => t,
            None => return self.complete()
        };

        // ---- COMMAND GENERATION ----

        let (steer, errors) = steer(pose, target, &self.params);

        self.report.cursor = self.cursor;
        self.report.errors = errors;

        let mut output = TickOutput {
            cmd: steer.cmd(),
            event: None,
        };

        if let Steer::Arrived = steer {
            let next = match self.sequencer {
                Some(ref s) => s.advance_if_arrived(pose, self.cursor, self.params.arrival_tolerance_m),
                None => self.cursor
            };

            if next > self.cursor {
                debug!(
                    "Waypoint {} reached ({:.3} m from target)",
                    self.cursor, errors.distance_m
                );
                output.event = Some(MissionEvent::WaypointReached(self.cursor));
                self.cursor = next;
                self.ticks_on_target = 0;
            }
        }
        else {
            self.ticks_on_target += 1;

            if self.ticks_on_target >= self.params.max_ticks_per_waypoint {
                warn!(
                    "No progress to waypoint {} after {} ticks ({:.3} m away), stopping mission",
                    self.cursor, self.ticks_on_target, errors.distance_m
                );
                self.stop(StopCause::Stalled);

                return TickOutput {
                    cmd: VelCmd::stop(),
                    event: Some(MissionEvent::Stalled),
                }
            }
        }

        self.report.ticks_on_target = self.ticks_on_target;

        output
    }

    /// Period of the mission tick in seconds.
    pub fn dt_s(&self) -> f64 {
        self.params.tick_period_s
    }

    pub fn is_running(&self) -> bool {
        self.mode == MissionMode::Running
    }

    pub fn mode(&self) -> MissionMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Deadline of the next tick, `None` unless running.
    pub fn next_tick_due(&self) -> Option<Instant> {
        self.ticker.next_due()
    }

    /// Number of ticks fired since the mission started.
    pub fn num_ticks(&self) -> u64 {
        self.ticker.num_ticks()
    }

    /// Waypoints in traversal order.
    pub fn waypoints(&self) -> Vec<[f64; 2]> {
        self.sequencer
            .as_ref()
            .map(|s| s.ordered())
            .unwrap_or_default()
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    fn complete(&mut self) -> TickOutput {
        info!("Mission complete after {} tick(s)", self.ticker.num_ticks());

        self.ticker.cancel();
        self.mode = MissionMode::Completed;

        TickOutput {
            cmd: VelCmd::stop(),
            event: Some(MissionEvent::Completed),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pose_model::PoseModel;

    /// Run the mission to termination by calling `step` directly, returning the events raised and
    /// the number of ticks executed.
    fn run(ctrl: &mut MissionCtrl, model: &mut PoseModel, max_ticks: usize) -> (Vec<MissionEvent>, usize) {
        let mut events = Vec::new();
        let mut prev_cursor = ctrl.cursor();

        for i in 0..max_ticks {
            let out = ctrl.step(&model.snapshot());

            assert!(ctrl.cursor() >= prev_cursor, "Cursor decreased");
            assert!(ctrl.cursor() <= prev_cursor + 1, "Cursor skipped a waypoint");
            prev_cursor = ctrl.cursor();

            if let Some(e) = out.event {
                events.push(e);
            }

            if !ctrl.is_running() {
                return (events, i + 1)
            }

            model.apply_velocity(out.cmd, ctrl.dt_s());
        }

        (events, max_ticks)
    }

    #[test]
    fn test_single_waypoint_completes() {
        let mut ctrl = MissionCtrl::new(Params::default());
        let mut model = PoseModel::new();

        ctrl.start(vec![[1.0, 0.0]], Direction::Forward, Instant::now()).unwrap();
        assert_eq!(ctrl.mode(), MissionMode::Running);

        let (events, _) = run(&mut ctrl, &mut model, 1000);

        assert_eq!(events, vec![MissionEvent::WaypointReached(0), MissionEvent::Completed]);
        assert_eq!(ctrl.mode(), MissionMode::Completed);
        assert_eq!(ctrl.cursor(), 1);
        assert_eq!(ctrl.next_tick_due(), None);

        let p = model.snapshot();
        assert!((p.x_m - 1.0).abs() < 0.1);

        // Finished controllers output nothing
        let out = ctrl.step(&p);
        assert!(out.cmd.is_stop());
        assert_eq!(out.event, None);
    }

    #[test]
    fn test_two_waypoint_mission() {
        let mut ctrl = MissionCtrl::new(Params::default());
        let mut model = PoseModel::new();

        ctrl.start(vec![[2.0, 0.0], [2.0, 2.0]], Direction::Forward, Instant::now()).unwrap();

        let (events, _) = run(&mut ctrl, &mut model, 2000);
        assert_eq!(events, vec![
            MissionEvent::WaypointReached(0),
            MissionEvent::WaypointReached(1),
            MissionEvent::Completed
        ]);

        let p = model.snapshot();
        assert!((p.x_m - 2.0).abs() < 0.1);
        assert!((p.y_m - 2.0).abs() < 0.1);
        assert!((p.theta_rad - std::f64::consts::FRAC_PI_2).abs() < 0.3);
    }

    #[test]
    fn test_reverse_equals_reversed_forward() {
        let pts = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let mut rev_pts = pts.clone();
        rev_pts.reverse();

        let mut rev_ctrl = MissionCtrl::new(Params::default());
        let mut rev_model = PoseModel::new();
        rev_model.teleport(-1.0, 1.0, 0.3);
        rev_ctrl.start(pts, Direction::Reverse, Instant::now()).unwrap();

        let mut fwd_ctrl = MissionCtrl::new(Params::default());
        let mut fwd_model = PoseModel::new();
        fwd_model.teleport(-1.0, 1.0, 0.3);
        fwd_ctrl.start(rev_pts, Direction::Forward, Instant::now()).unwrap();

        assert_eq!(rev_ctrl.waypoints(), fwd_ctrl.waypoints());

        loop {
            let rev_out = rev_ctrl.step(&rev_model.snapshot());
            let fwd_out = fwd_ctrl.step(&fwd_model.snapshot());

            assert_eq!(rev_out, fwd_out);
            assert_eq!(rev_ctrl.cursor(), fwd_ctrl.cursor());

            if !rev_ctrl.is_running() {
                break
            }

            rev_model.apply_velocity(rev_out.cmd, rev_ctrl.dt_s());
            fwd_model.apply_velocity(fwd_out.cmd, fwd_ctrl.dt_s());
            assert_eq!(rev_model.snapshot(), fwd_model.snapshot());
        }

        assert_eq!(rev_ctrl.mode(), MissionMode::Completed);
        assert_eq!(fwd_ctrl.mode(), MissionMode::Completed);
    }

    #[test]
    fn test_unreachable_waypoint_stalls() {
        let params = Params {
            max_ticks_per_waypoint: 50,
            ..Default::default()
        };
        let mut ctrl = MissionCtrl::new(params);
        let mut model = PoseModel::new();

        // Outside the arena, the turtle is held at the wall and never arrives
        ctrl.start(vec![[15.0, 0.0]], Direction::Forward, Instant::now()).unwrap();

        let (events, ticks) = run(&mut ctrl, &mut model, 1000);
        assert_eq!(events, vec![MissionEvent::Stalled]);
        assert_eq!(ticks, 50);
        assert_eq!(ctrl.mode(), MissionMode::Stopped(StopCause::Stalled));
        assert_eq!(ctrl.cursor(), 0);
        assert!(model.snapshot().x_m <= crate::pose_model::ARENA_MAX_M);
    }

    #[test]
    fn test_start_rejections() {
        let t0 = Instant::now();
        let mut ctrl = MissionCtrl::new(Params::default());

        assert_eq!(
            ctrl.start(vec![], Direction::Forward, t0),
            Err(MissionCtrlError::NoWaypoints)
        );
        assert_eq!(
            ctrl.start(vec![[0.0, 0.0], [std::f64::NAN, 1.0]], Direction::Forward, t0),
            Err(MissionCtrlError::NonFiniteWaypoint(1))
        );
        assert_eq!(ctrl.mode(), MissionMode::Idle);

        ctrl.start(vec![[3.0, 0.0]], Direction::Forward, t0).unwrap();
        assert_eq!(
            ctrl.start(vec![[1.0, 1.0]], Direction::Reverse, t0),
            Err(MissionCtrlError::AlreadyRunning)
        );
        assert_eq!(ctrl.waypoints(), vec![[3.0, 0.0]]);
        assert!(ctrl.is_running());
    }

    #[test]
    fn test_stop_cancels_ticks() {
        let t0 = Instant::now();
        let period = Duration::from_secs_f64(Params::default().tick_period_s);
        let mut ctrl = MissionCtrl::new(Params::default());

        // Stopping an idle controller does nothing
        assert!(!ctrl.stop(StopCause::Requested));
        assert_eq!(ctrl.mode(), MissionMode::Idle);

        ctrl.start(vec![[3.0, 0.0]], Direction::Forward, t0).unwrap();
        assert!(!ctrl.poll_tick(t0));
        assert!(ctrl.poll_tick(t0 + period));

        assert!(ctrl.stop(StopCause::Requested));
        assert!(!ctrl.stop(StopCause::Requested));
        assert_eq!(ctrl.mode(), MissionMode::Stopped(StopCause::Requested));
        assert_eq!(ctrl.next_tick_due(), None);
        assert!(!ctrl.poll_tick(t0 + period * 2));
        assert!(!ctrl.poll_tick(t0 + period * 100));

        assert_eq!(
            ctrl.start(vec![[1.0, 1.0]], Direction::Forward, t0),
            Err(MissionCtrlError::AlreadyFinished)
        );
    }
}
