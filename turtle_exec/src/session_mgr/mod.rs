//! # Session manager
//!
//! The session manager owns one [`ClientSession`] per connected client, keyed by the client's
//! connection identity. It routes each telecommand to the issuing client's session, runs the
//! mission ticks which are due, expires clients which have gone quiet, and collects the resulting
//! telemetry into an outbox for the TM server to publish to every client.
//!
//! A client is connected implicitly by the first message received from it, and disconnected
//! either by a `disconnect` TC or, if a client timeout is configured, by not sending anything for
//! longer than the timeout while it has no mission running.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod client;
pub mod recorder;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

// Internal
pub use client::ClientSession;
use crate::{
    mission_ctrl::{self, MissionCtrlError},
    params::TurtleExecParams,
    path_store::{PathStore, PathStoreError},
};
use comms_if::{
    path::PathId,
    tc::{Tc, TcResponse},
    tm::{StopCause, TmPacket},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Identity of a client connection, the hex encoding of its zmq routing id.
pub type ClientId = String;

pub struct SessionMgr {
    mission_params: mission_ctrl::Params,

    client_timeout: Option<Duration>,

    recorder_min_separation_m: f64,

    store: Box<dyn PathStore>,

    clients: BTreeMap<ClientId, ClientSession>,

    /// Telemetry waiting to be published, in the order it was raised.
    outbox: Vec<TmPacket>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("The {0} command contains non-finite values")]
    NonFinite(&'static str),

    #[error("A mission is running")]
    MissionRunning,

    #[error("Mission error: {0}")]
    MissionError(#[from] MissionCtrlError),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording is in progress")]
    NotRecording,

    #[error("Station label {0:?} is empty or reserved")]
    InvalidLabel(String),

    #[error("Path names cannot be empty")]
    EmptyName,

    #[error("No path with id {0} exists")]
    PathNotFound(PathId),

    #[error("Path {0} has no points")]
    EmptyPath(PathId),

    #[error("Path store error: {0}")]
    PathStoreError(#[from] PathStoreError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SessionError {
    /// The response to send for a TC which failed with this error.
    pub fn response(&self) -> TcResponse {
        match self {
            SessionError::NonFinite(_)
            | SessionError::InvalidLabel(_)
            | SessionError::EmptyName
            | SessionError::InvalidParams(_)
            | SessionError::MissionError(MissionCtrlError::NoWaypoints)
            | SessionError::MissionError(MissionCtrlError::NonFiniteWaypoint(_))
            | SessionError::PathStoreError(PathStoreError::InvalidPath(_)) => TcResponse::Invalid,
            _ => TcResponse::CannotExecute
        }
    }
}

impl SessionMgr {
    /// Create a new session manager with no clients.
    pub fn new(
        mission_params: mission_ctrl::Params,
        exec_params: &TurtleExecParams,
        store: Box<dyn PathStore>
    ) -> Result<Self, SessionError> {
        mission_params.check().map_err(SessionError::InvalidParams)?;

        let client_timeout = match exec_params.client_timeout_s {
            Some(t) if t.is_finite() && t > 0.0 => Some(Duration::from_secs_f64(t)),
            Some(t) => return Err(SessionError::InvalidParams(
                format!("client_timeout_s must be finite and positive, got {}", t)
            )),
            None => None
        };

        Ok(Self {
            mission_params,
            client_timeout,
            recorder_min_separation_m: exec_params.recorder_min_separation_m,
            store,
            clients: BTreeMap::new(),
            outbox: Vec::new(),
        })
    }

    /// Handle one telecommand from the given client, returning the response to send back.
    pub fn handle_tc(&mut self, id: &str, tc: Tc, now: Instant) -> TcResponse {
        if let Tc::Disconnect = tc {
            self.disconnect(id);
            return TcResponse::Ok
        }

        self.connect_if_new(id, now);

        let client = match self.clients.get_mut(id) {
            Some(c) => c,
            None => return TcResponse::CannotExecute
        };
        client.touch(now);

        debug!("Client {} TC: {:?}", id, tc);

        let result = match tc {
            Tc::Heartbeat => Ok(()),
            Tc::Disconnect => Ok(()),
            Tc::ManualControl { linear, angular } => client.manual_control(linear, angular),
            Tc::StartMission { waypoints, direction } => {
                client.start_mission(waypoints, direction, now)
            },
            Tc::StartPathMission { path_id, from } => {
                client.start_path_mission(&*self.store, path_id, from, now)
            },
            Tc::StopMission => {
                client.stop_mission(StopCause::Requested);
                Ok(())
            },
            Tc::Teleport { x, y, theta } => client.teleport(x, y, theta),
            Tc::StartRecording => client.start_recording(),
            Tc::AddStation { label } => client.add_station(label),
            Tc::StopRecording { name } => client.stop_recording(&mut *self.store, name).map(|_| ()),
        };

        let response = match result {
            Ok(()) => TcResponse::Ok,
            Err(e) => {
                warn!("Client {} TC rejected: {}", id, e);
                e.response()
            }
        };

        self.collect(id);

        response
    }

    /// Run every mission tick due at `now` and expire silent clients with no mission running.
    pub fn proc(&mut self, now: Instant) {
        for (id, client) in self.clients.iter_mut() {
            client.proc_mission(now);

            for tm in client.drain() {
                self.outbox.push(TmPacket::new(id.clone(), tm));
            }
        }

        if let Some(timeout) = self.client_timeout {
            let expired: Vec<ClientId> = self
                .clients
                .iter()
                .filter(|(_, c)| !c.is_mission_running())
                .filter(|(_, c)| now.saturating_duration_since(c.last_seen()) > timeout)
                .map(|(id, _)| id.clone())
                .collect();

            for id in expired {
                warn!("Client {} timed out", id);
                self.disconnect(&id);
            }
        }
    }

    /// Close a client's session, stopping its mission. Returns false if the client was not
    /// connected.
    pub fn disconnect(&mut self, id: &str) -> bool {
        match self.clients.remove(id) {
            Some(mut client) => {
                client.close();

                for tm in client.drain() {
                    self.outbox.push(TmPacket::new(id, tm));
                }

                info!("Client {} disconnected ({} remaining)", id, self.clients.len());
                true
            },
            None => false
        }
    }

    /// Disconnect every client.
    pub fn disconnect_all(&mut self) {
        let ids: Vec<ClientId> = self.clients.keys().cloned().collect();

        for id in ids {
            self.disconnect(&id);
        }
    }

    /// Time from `now` until the next mission tick or client expiry, `None` if nothing is
    /// scheduled.
    pub fn time_until_next_deadline(&self, now: Instant) -> Option<Duration> {
        let ticks = self
            .clients
            .values()
            .filter_map(|c| c.mission().and_then(|m| m.next_tick_due()));

        let expiries = self
            .clients
            .values()
            .filter(|c| !c.is_mission_running())
            .filter_map(|c| self.client_timeout.map(|t| c.last_seen() + t));

        ticks
            .chain(expiries)
            .min()
            .map(|d| d.saturating_duration_since(now))
    }

    /// Take all telemetry raised since the last call.
    pub fn drain_tm(&mut self) -> Vec<TmPacket> {
        std::mem::take(&mut self.outbox)
    }

    pub fn client(&self, id: &str) -> Option<&ClientSession> {
        self.clients.get(id)
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn path_store_mut(&mut self) -> &mut dyn PathStore {
        &mut *self.store
    }

    fn connect_if_new(&mut self, id: &str, now: Instant) {
        if self.clients.contains_key(id) {
            return
        }

        info!("Client {} connected ({} total)", id, self.clients.len() + 1);

        let client = ClientSession::new(
            id.into(),
            self.mission_params.clone(),
            self.recorder_min_separation_m,
            now,
        );
        self.clients.insert(id.into(), client);
    }

    /// Move the telemetry queued by one client into the outbox.
    fn collect(&mut self, id: &str) {
        if let Some(client) = self.clients.get_mut(id) {
            for tm in client.drain() {
                self.outbox.push(TmPacket::new(id, tm));
            }
        }
    }
}
