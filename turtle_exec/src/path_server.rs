//! # Path Server
//!
//! Serves the path store API on a REP socket. Each request is a JSON [`PathReq`] and is answered
//! with a JSON [`PathResponse`].
//!
//! A REP socket cannot receive again until the reply to its last request has been sent, so a
//! reply which fails to send is held and retried before the next request is read.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    path::{PathReq, PathResponse},
};

use crate::path_store::{self, PathStore};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Path store server
pub struct PathServer {
    socket: MonitoredSocket,

    /// Reply to the last request which has not been sent yet.
    unsent_reply: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the response: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a request: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathServer {
    /// Create a new instance of the path server.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, PathServerError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.path_endpoint
        ).map_err(PathServerError::SocketError)?;

        Ok(Self {
            socket,
            unsent_reply: None,
        })
    }

    /// Poll item which is readable when a request is waiting.
    pub fn poll_item(&self) -> zmq::PollItem {
        self.socket.as_poll_item(zmq::POLLIN)
    }

    /// Serve one pending request against `store`, without blocking.
    ///
    /// Returns `Ok(false)` if there was no request waiting.
    pub fn serve(&mut self, store: &mut dyn PathStore) -> Result<bool, PathServerError> {
        if self.unsent_reply.is_some() {
            self.flush_reply()?;
        }

        let msg = match self.socket.recv_bytes(zmq::DONTWAIT) {
            Ok(m) => m,
            Err(zmq::Error::EAGAIN) => return Ok(false),
            Err(e) => return Err(PathServerError::RecvError(e))
        };

        let response = match std::str::from_utf8(&msg) {
            Ok(s) => match PathReq::from_json(s) {
                Ok(req) => path_store::exec(store, req),
                Err(e) => {
                    warn!("Could not parse path request: {}", e);
                    PathResponse::Invalid { reason: e.to_string() }
                }
            },
            Err(_) => PathResponse::Invalid { reason: "request is not valid UTF-8".into() }
        };

        let reply = match serde_json::to_string(&response) {
            Ok(r) => r,
            Err(e) => {
                // Something still has to be sent to unlock the socket
                self.unsent_reply = Some(FAILED_REPLY.into());
                self.flush_reply()?;
                return Err(PathServerError::SerializationError(e))
            }
        };

        self.unsent_reply = Some(reply);
        self.flush_reply()?;

        Ok(true)
    }

    /// Send the held reply, keeping it for the next call if the send fails.
    fn flush_reply(&mut self) -> Result<(), PathServerError> {
        if let Some(ref reply) = self.unsent_reply {
            self.socket
                .send(reply.as_str(), 0)
                .map_err(PathServerError::SendError)?;
        }

        self.unsent_reply = None;
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const FAILED_REPLY: &str = r#"{"type":"failed","reason":"response could not be serialized"}"#;

#[cfg(test)]
mod test {
    use super::*;
    use crate::path_store::{test::straight_path, MemPathStore};

    fn request(client: &zmq::Socket, server: &mut PathServer, store: &mut MemPathStore, req: &str) -> PathResponse {
        client.send(req, 0).unwrap();
        assert_eq!(zmq::poll(&mut [server.poll_item()], 1000).unwrap(), 1);
        assert!(server.serve(store).unwrap());

        serde_json::from_str(&client.recv_string(0).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_serve() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            tc_endpoint: "inproc://path_server_test_tc".into(),
            tm_endpoint: "inproc://path_server_test_tm".into(),
            path_endpoint: "inproc://path_server_test_path".into(),
        };
        let mut server = PathServer::new(&ctx, &params).unwrap();
        let mut store = MemPathStore::new();

        let client = ctx.socket(zmq::REQ).unwrap();
        client.connect(&params.path_endpoint).unwrap();

        assert!(!server.serve(&mut store).unwrap());

        let save = serde_json::to_string(&PathReq::Save(straight_path("p", 0.0, 1.0))).unwrap();
        assert_eq!(request(&client, &mut server, &mut store, &save), PathResponse::Saved { id: 1 });

        match request(&client, &mut server, &mut store, r#"{"type": "list"}"#) {
            PathResponse::Paths { paths } => assert_eq!(paths.len(), 1),
            r => panic!("Unexpected response {:?}", r),
        }

        assert_eq!(
            request(&client, &mut server, &mut store, r#"{"type": "get", "id": 4}"#),
            PathResponse::NotFound { id: 4 }
        );

        assert!(matches!(
            request(&client, &mut server, &mut store, r#"{"type": "delete"}"#),
            PathResponse::Invalid { .. }
        ));
    }

    #[test]
    fn test_unsent_reply_is_retried() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            tc_endpoint: "inproc://path_server_retry_tc".into(),
            tm_endpoint: "inproc://path_server_retry_tm".into(),
            path_endpoint: "inproc://path_server_retry_path".into(),
        };
        let mut server = PathServer::new(&ctx, &params).unwrap();
        let mut store = MemPathStore::new();

        let client = ctx.socket(zmq::REQ).unwrap();
        client.connect(&params.path_endpoint).unwrap();

        // A request is taken off the socket but its reply could not be sent
        client.send(r#"{"type": "list"}"#, 0).unwrap();
        assert_eq!(zmq::poll(&mut [server.poll_item()], 1000).unwrap(), 1);
        server.socket.recv_bytes(0).unwrap();
        server.unsent_reply = Some(
            serde_json::to_string(&PathResponse::Paths { paths: vec![] }).unwrap()
        );

        // The next serve sends the held reply instead of failing on the socket state
        assert!(!server.serve(&mut store).unwrap());
        assert!(server.unsent_reply.is_none());
        let reply: PathResponse = serde_json::from_str(&client.recv_string(0).unwrap().unwrap()).unwrap();
        assert_eq!(reply, PathResponse::Paths { paths: vec![] });

        // And requests are served normally afterwards
        let save = serde_json::to_string(&PathReq::Save(straight_path("p", 0.0, 1.0))).unwrap();
        assert_eq!(request(&client, &mut server, &mut store, &save), PathResponse::Saved { id: 1 });
    }

    #[test]
    fn test_failed_reply_parses() {
        assert!(matches!(
            serde_json::from_str::<PathResponse>(FAILED_REPLY).unwrap(),
            PathResponse::Failed { .. }
        ));
    }
}
