//! # Client session
//!
//! All of the state the executive keeps for one connected client: the turtle's pose, the running
//! mission (if any) and the active recording (if any). Telemetry raised by the session is queued
//! locally and collected by the session manager.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use log::{debug, info};
use std::time::Instant;

// Internal
use super::{recorder::Recorder, ClientId, SessionError};
use crate::{
    mission_ctrl::{self, MissionCtrl, MissionEvent},
    path_store::PathStore,
    pose_model::PoseModel,
};
use comms_if::{
    path::PathId,
    tc::{Direction, StationEnd},
    tm::{StopCause, Tm},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct ClientSession {
    id: ClientId,

    pose: PoseModel,

    /// Running mission. Finished controllers are discarded immediately.
    mission: Option<MissionCtrl>,

    recorder: Option<Recorder>,

    mission_params: mission_ctrl::Params,

    recorder_min_separation_m: f64,

    /// Time the last message from the client was received.
    last_seen: Instant,

    /// Telemetry waiting to be collected.
    pending: Vec<Tm>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ClientSession {
    /// Open a new session with the turtle at the origin.
    pub fn new(
        id: ClientId,
        mission_params: mission_ctrl::Params,
        recorder_min_separation_m: f64,
        now: Instant
    ) -> Self {
        let mut session = Self {
            id,
            pose: PoseModel::new(),
            mission: None,
            recorder: None,
            mission_params,
            recorder_min_separation_m,
            last_seen: now,
            pending: Vec::new(),
        };

        session.push_pose();

        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pose(&self) -> &PoseModel {
        &self.pose
    }

    pub fn mission(&self) -> Option<&MissionCtrl> {
        self.mission.as_ref()
    }

    pub fn is_mission_running(&self) -> bool {
        self.mission.as_ref().map(|m| m.is_running()).unwrap_or(false)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Take all queued telemetry.
    pub fn drain(&mut self) -> Vec<Tm> {
        std::mem::take(&mut self.pending)
    }

    // ---- MANUAL CONTROL ----

    pub fn manual_control(&mut self, linear: f64, angular: f64) -> Result<(), SessionError> {
        if !linear.is_finite() || !angular.is_finite() {
            return Err(SessionError::NonFinite("manual control"))
        }

        if self.is_mission_running() {
            return Err(SessionError::MissionRunning)
        }

        self.pose.apply_manual_velocity(linear, angular);
        self.pose_changed();

        Ok(())
    }

    pub fn teleport(&mut self, x: f64, y: f64, theta: f64) -> Result<(), SessionError> {
        if !(x.is_finite() && y.is_finite() && theta.is_finite()) {
            return Err(SessionError::NonFinite("teleport"))
        }

        if self.is_mission_running() {
            return Err(SessionError::MissionRunning)
        }

        self.pose.teleport(x, y, theta);
        self.pose_changed();

        Ok(())
    }

    // ---- MISSIONS ----

    pub fn start_mission(
        &mut self,
        waypoints: Vec<[f64; 2]>,
        direction: Direction,
        now: Instant
    ) -> Result<(), SessionError> {
        if self.is_mission_running() {
            return Err(SessionError::MissionRunning)
        }

        let mut ctrl = MissionCtrl::new(self.mission_params.clone());
        ctrl.start(waypoints, direction, now)?;

        self.pending.push(Tm::MissionStarted {
            waypoints: ctrl.waypoints(),
            direction,
        });
        self.mission = Some(ctrl);

        Ok(())
    }

    /// Start a mission along a stored path, beginning at one of its endpoint stations.
    ///
    /// The turtle is teleported onto the station only once the mission has been accepted.
    pub fn start_path_mission(
        &mut self,
        store: &dyn PathStore,
        path_id: PathId,
        from: StationEnd,
        now: Instant
    ) -> Result<(), SessionError> {
        if self.is_mission_running() {
            return Err(SessionError::MissionRunning)
        }

        let path = match store.get(path_id) {
            Ok(Some(p)) => p,
            Ok(None) => return Err(SessionError::PathNotFound(path_id)),
            Err(e) => {
                self.pending.push(Tm::Notice {
                    message: format!("Could not load path {}: {}", path_id, e),
                });
                return Err(e.into())
            }
        };

        let station = path
            .endpoint(from)
            .ok_or(SessionError::EmptyPath(path_id))?;

        let direction = Direction::from(from);
        let mut ctrl = MissionCtrl::new(self.mission_params.clone());
        ctrl.start(path.waypoints(), direction, now)?;

        info!(
            "Client {} following path {} ({:?}) from its {:?} station",
            self.id, path_id, path.name, from
        );

        self.pose.teleport(station.x_m, station.y_m, station.theta_rad);
        self.pose_changed();

        self.pending.push(Tm::MissionStarted {
            waypoints: ctrl.waypoints(),
            direction,
        });
        self.mission = Some(ctrl);

        Ok(())
    }

    /// Stop the running mission, if there is one.
    pub fn stop_mission(&mut self, cause: StopCause) {
        let stopped = match self.mission.take() {
            Some(mut m) => m.stop(cause),
            None => false
        };

        if stopped {
            self.pose.halt();
            self.pending.push(Tm::MissionStopped { cause });
            self.push_pose();
        }
    }

    /// Run the mission tick if one is due at `now`.
    pub fn proc_mission(&mut self, now: Instant) {
        let mission = match self.mission.as_mut() {
            Some(m) => m,
            None => return
        };

        if !mission.poll_tick(now) {
            return
        }

        let out = mission.step(&self.pose.snapshot());
        let dt_s = mission.dt_s();
        let running = mission.is_running();

        match out.event {
            Some(MissionEvent::WaypointReached(index)) => {
                self.pending.push(Tm::WaypointReached { index })
            },
            Some(MissionEvent::Completed) => self.pending.push(Tm::MissionComplete),
            Some(MissionEvent::Stalled) => self.pending.push(Tm::MissionStopped {
                cause: StopCause::Stalled,
            }),
            None => ()
        }

        if running {
            self.pose.apply_velocity(out.cmd, dt_s);
        }
        else {
            debug!("Client {} mission finished", self.id);
            self.pose.halt();
            self.mission = None;

            // The client timeout counts from the end of the mission
            self.last_seen = now;
        }

        self.pose_changed();
    }

    // ---- RECORDING ----

    pub fn start_recording(&mut self) -> Result<(), SessionError> {
        if self.recorder.is_some() {
            return Err(SessionError::AlreadyRecording)
        }

        self.recorder = Some(Recorder::new(
            self.pose.snapshot(),
            Utc::now(),
            self.recorder_min_separation_m,
        ));
        self.pending.push(Tm::RecordingStarted);

        Ok(())
    }

    pub fn add_station(&mut self, label: String) -> Result<(), SessionError> {
        if label.trim().is_empty() || Recorder::is_reserved_label(&label) {
            return Err(SessionError::InvalidLabel(label))
        }

        let pose = self.pose.snapshot();
        let recorder = self.recorder.as_mut().ok_or(SessionError::NotRecording)?;

        recorder.add_station(label.clone(), pose);
        self.pending.push(Tm::StationAdded { label });

        Ok(())
    }

    /// Finish the recording and save it to `store`.
    ///
    /// If the store fails the recording is kept so the save can be retried.
    pub fn stop_recording(
        &mut self,
        store: &mut dyn PathStore,
        name: String
    ) -> Result<PathId, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::EmptyName)
        }

        let new_path = match self.recorder {
            Some(ref r) => r.finish(&name),
            None => return Err(SessionError::NotRecording)
        };

        match store.save(new_path) {
            Ok(path_id) => {
                info!("Client {} saved path {:?} as {}", self.id, name, path_id);
                self.recorder = None;
                self.pending.push(Tm::RecordingSaved { path_id, name });
                Ok(path_id)
            },
            Err(e) => {
                self.pending.push(Tm::Notice {
                    message: format!("Could not save path {:?}: {}", name, e),
                });
                Err(e.into())
            }
        }
    }

    // ---- CLOSE ----

    /// Close the session, stopping any mission and discarding any recording.
    pub fn close(&mut self) {
        self.stop_mission(StopCause::Disconnected);

        if let Some(r) = self.recorder.take() {
            info!(
                "Client {} closed while recording, discarding {} point(s)",
                self.id,
                r.num_points()
            );
        }

        self.pending.push(Tm::SessionClosed);
    }

    fn pose_changed(&mut self) {
        if let Some(ref mut r) = self.recorder {
            r.record(self.pose.snapshot(), Utc::now());
        }

        self.push_pose();
    }

    fn push_pose(&mut self) {
        self.pending.push(Tm::Pose(self.pose.to_tm()));
    }
}
