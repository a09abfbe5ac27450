//! # TM Server
//!
//! Publishes telemetry packets to every subscribed client.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    tm::TmPacket,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TmServerError> {
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
            zmq::PUB,
            socket_options,
            &params.tm_endpoint
        ).map_err(TmServerError::SocketError)?;

        Ok(Self {
            socket
        })
    }

    /// Number of connected subscribers.
    pub fn num_subscribers(&self) -> usize {
        self.socket.num_peers()
    }

    /// Publish a single packet.
    pub fn send(&self, packet: &TmPacket) -> Result<(), TmServerError> {
        let packet_string = serde_json::to_string(packet)
            .map_err(TmServerError::SerializationError)?;

        self.socket.send(&packet_string, 0)
            .map_err(TmServerError::SendError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tm::{Tm, StopCause};

    #[test]
    fn test_publish() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            tc_endpoint: "inproc://tm_server_test_tc".into(),
            tm_endpoint: "inproc://tm_server_test_tm".into(),
            path_endpoint: "inproc://tm_server_test_path".into(),
        };
        let server = TmServer::new(&ctx, &params).unwrap();

        let sub = ctx.socket(zmq::SUB).unwrap();
        sub.set_subscribe(b"").unwrap();
        sub.set_rcvtimeo(100).unwrap();
        sub.connect(&params.tm_endpoint).unwrap();

        let packet = TmPacket::new("0a", Tm::MissionStopped { cause: StopCause::Requested });

        // Subscriptions propagate asynchronously, so publish until one arrives
        let mut recieved = None;
        for _ in 0..50 {
            server.send(&packet).unwrap();

            if let Ok(Ok(s)) = sub.recv_string(0) {
                recieved = Some(s);
                break
            }
        }

        let recieved: TmPacket = serde_json::from_str(&recieved.unwrap()).unwrap();
        assert_eq!(recieved, packet);
    }
}
