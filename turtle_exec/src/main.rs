//! Main turtle executive entry point.
//!
//! # Architecture
//!
//! The executive is a single threaded event loop:
//!
//!     - Wait for a telecommand, a path request, or the next mission deadline, whichever comes
//!       first
//!     - Telecommand processing, in arrival order, with a response to every TC
//!     - Path store request processing
//!     - Session processing:
//!         - Mission ticks which are due
//!         - Expiry of silent clients
//!     - Telemetry publication

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

// Internal
use comms_if::{
    net::{zmq, NetParams},
    tc::TcResponse,
};
use turtle_lib::{
    mission_ctrl::MissionCtrl,
    params::TurtleExecParams,
    path_server::PathServer,
    path_store::{JsonFilePathStore, MemPathStore, PathStore},
    session_mgr::SessionMgr,
    tc_server::{TcServer, TcServerError},
    tm_server::TmServer,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest time the loop waits for network activity.
const MAX_POLL_PERIOD: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "turtle_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Turtle Mission Executive\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    let exec_params: TurtleExecParams = util::params::load(
        "turtle_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let mission_params = MissionCtrl::load_params("mission_ctrl.toml")
        .wrap_err("Could not load mission control params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let store: Box<dyn PathStore> = match exec_params.path_store_dir {
        Some(ref dir) => {
            let mut path = host::get_sw_root()
                .wrap_err("Could not get the software root")?;
            path.push(dir);

            Box::new(
                JsonFilePathStore::open(path)
                    .wrap_err("Failed to open the path store")?
            )
        },
        None => {
            warn!("No path store directory set, recorded paths will not be persisted");
            Box::new(MemPathStore::new())
        }
    };

    let mut session_mgr = SessionMgr::new(mission_params, &exec_params, store)
        .wrap_err("Failed to initialise the SessionMgr")?;

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let tc_server = {
        let s = TcServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise TcServer")?;
        info!("TcServer bound to {}", net_params.tc_endpoint);
        s
    };

    let tm_server = {
        let s = TmServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise TmServer")?;
        info!("TmServer bound to {}", net_params.tm_endpoint);
        s
    };

    let mut path_server = {
        let s = PathServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise PathServer")?;
        info!("PathServer bound to {}", net_params.path_endpoint);
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // ---- WAIT ----

        let timeout = session_mgr
            .time_until_next_deadline(Instant::now())
            .map_or(MAX_POLL_PERIOD, |d| d.min(MAX_POLL_PERIOD));

        {
            let mut items = [tc_server.poll_item(), path_server.poll_item()];
            zmq::poll(&mut items, ceil_millis(timeout))
                .wrap_err("Failed to poll the network")?;
        }

        // ---- TELECOMMAND PROCESSING ----

        // Get commands until none remain
        loop {
            let request = match tc_server.recieve_tc() {
                Ok(Some(r)) => r,
                Ok(None) => break,
                Err(TcServerError::MalformedMessage(n)) => {
                    warn!("Discarding TC message with {} frame(s)", n);
                    continue
                },
                Err(e) => return Err(e)
                    .wrap_err("An error occured while receiving TCs from clients")
            };

            let response = match request.tc {
                Ok(ref tc) => session_mgr.handle_tc(&request.client_id, tc.clone(), Instant::now()),
                Err(ref e) => {
                    warn!("Could not parse TC from client {}: {}", request.client_id, e);
                    TcResponse::Invalid
                }
            };

            if let Err(e) = tc_server.send_response(&request, response) {
                warn!("Could not respond to TC: {}", e);
            }
        }

        // ---- PATH REQUEST PROCESSING ----

        loop {
            match path_server.serve(session_mgr.path_store_mut()) {
                Ok(true) => (),
                Ok(false) => break,
                Err(e) => {
                    warn!("Error serving path request: {}", e);
                    break
                }
            }
        }

        // ---- SESSION PROCESSING ----

        session_mgr.proc(Instant::now());

        // ---- TELEMETRY ----

        let packets = session_mgr.drain_tm();

        if !packets.is_empty() {
            debug!(
                "Publishing {} TM packet(s) to {} subscriber(s)",
                packets.len(),
                tm_server.num_subscribers()
            );
        }

        for packet in packets.iter() {
            if let Err(e) = tm_server.send(packet) {
                warn!("Could not send telemetry: {}", e);
            }
        }
    }
}

/// Whole milliseconds in `d`, rounded up so that a wait never ends before its deadline.
fn ceil_millis(d: Duration) -> i64 {
    ((d.as_micros() + 999) / 1000) as i64
}
