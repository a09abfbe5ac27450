//! # Telecommand Server
//!
//! Receives telecommands from any number of clients on a ROUTER socket. Each message carries the
//! routing id of the sending client, which identifies the client's session. Every request is
//! answered with a [`TcResponse`] on the same envelope, so both REQ and DEALER clients are
//! supported.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    tc::{Tc, TcParseError, TcResponse},
};

use crate::session_mgr::ClientId;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand server
pub struct TcServer {
    socket: MonitoredSocket
}

/// A telecommand received from a client.
#[derive(Debug)]
pub struct TcRequest {
    /// The session id of the sending client
    pub client_id: ClientId,

    /// The parsed telecommand
    pub tc: Result<Tc, TcParseError>,

    /// Routing frames to send the response back on
    envelope: Vec<Vec<u8>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the response: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from a client: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Recieved a message with {0} frame(s), expected at least 2")]
    MalformedMessage(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcServer {
    /// Create a new instance of the TC Server.
    ///
    /// This function will not block until a client connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TcServerError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::ROUTER,
            socket_options,
            &params.tc_endpoint
        ).map_err(TcServerError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    /// Number of clients currently connected to the server.
    pub fn num_clients(&self) -> usize {
        self.socket.num_peers()
    }

    /// Poll item which is readable when a TC is waiting.
    pub fn poll_item(&self) -> zmq::PollItem {
        self.socket.as_poll_item(zmq::POLLIN)
    }

    /// Recieve a single TC without blocking.
    ///
    /// Call in a loop until `Ok(None)` is returned to handle every pending TC. Each returned
    /// request must be answered with `send_response`, including those whose TC failed to parse.
    pub fn recieve_tc(&self) -> Result<Option<TcRequest>, TcServerError> {
        let mut frames = match self.socket.recv_multipart(zmq::DONTWAIT) {
            Ok(f) => f,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(TcServerError::RecvError(e))
        };

        if frames.len() < 2 {
            return Err(TcServerError::MalformedMessage(frames.len()))
        }

        // Routing id first, then an empty delimiter for REQ clients, then the payload
        let payload = frames.pop().unwrap_or_default();
        let client_id = encode_id(&frames[0]);

        Ok(Some(TcRequest {
            client_id,
            tc: Tc::from_bytes(&payload),
            envelope: frames,
        }))
    }

    /// Send the response to a request.
    pub fn send_response(
        &self,
        request: &TcRequest,
        response: TcResponse
    ) -> Result<(), TcServerError> {
        let response_str = serde_json::to_string(&response)
            .map_err(TcServerError::SerializationError)?;

        let mut frames = request.envelope.clone();
        frames.push(response_str.into_bytes());

        self.socket
            .send_multipart(frames, 0)
            .map_err(TcServerError::SendError)
    }
}

/// Hex encode a routing id.
fn encode_id(routing_id: &[u8]) -> ClientId {
    routing_id.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn net_params(name: &str) -> NetParams {
        NetParams {
            tc_endpoint: format!("inproc://{}_tc", name),
            tm_endpoint: format!("inproc://{}_tm", name),
            path_endpoint: format!("inproc://{}_path", name),
        }
    }

    #[test]
    fn test_encode_id() {
        assert_eq!(encode_id(&[0x00, 0x0a, 0xff]), "000aff");
    }

    #[test]
    fn test_request_response() {
        let ctx = zmq::Context::new();
        let params = net_params("tc_server_test");
        let server = TcServer::new(&ctx, &params).unwrap();

        let client = ctx.socket(zmq::REQ).unwrap();
        client.set_identity(&[0x0a, 0x0b]).unwrap();
        client.connect(&params.tc_endpoint).unwrap();

        client.send(r#"{"type": "manualControl", "linear": 0.5, "angular": 0.0}"#, 0).unwrap();

        let mut items = [server.poll_item()];
        assert_eq!(zmq::poll(&mut items, 1000).unwrap(), 1);

        let req = server.recieve_tc().unwrap().unwrap();
        assert_eq!(req.client_id, "0a0b");
        assert_eq!(req.tc.as_ref().unwrap(), &Tc::ManualControl { linear: 0.5, angular: 0.0 });
        assert!(server.recieve_tc().unwrap().is_none());

        server.send_response(&req, TcResponse::Ok).unwrap();
        assert_eq!(client.recv_string(0).unwrap().unwrap(), "\"Ok\"");

        // Unparsable TCs are still answered
        client.send("not json", 0).unwrap();
        assert_eq!(zmq::poll(&mut [server.poll_item()], 1000).unwrap(), 1);

        let req = server.recieve_tc().unwrap().unwrap();
        assert!(matches!(req.tc, Err(TcParseError::InvalidJson(_))));

        server.send_response(&req, TcResponse::Invalid).unwrap();
        assert_eq!(client.recv_string(0).unwrap().unwrap(), "\"Invalid\"");
    }
}
