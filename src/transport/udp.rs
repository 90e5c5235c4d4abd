//! UDP discovery receive.
//!
//! Devices announce themselves by broadcasting an encrypted frame on port
//! 6667 roughly every few seconds. [`recv`] performs exactly one receive and
//! decodes it; periodic re-listening is the caller's loop, not ours.

use tokio::net::UdpSocket;
use tracing::{debug, trace, warn};

use crate::config::{Connection, TransportKind, SOCKET_BUF_LEN, UDP_DISCOVERY_PORT};
use crate::core::packet::{self, Message};
use crate::error::{constants, ProtocolError, Result};
use crate::transport::with_timeout;

/// Receive and decode one discovery broadcast.
///
/// Binds to `host:6667` (typically `0.0.0.0`), enables broadcast, and blocks
/// for a single datagram, bounded by the descriptor's timeout. A datagram
/// that fills the whole buffer may have been cut; decoding proceeds on the
/// truncated bytes and will normally fail the CRC check.
///
/// # Errors
/// - `ConfigError` when the descriptor is not UDP or the host is invalid
/// - `Timeout` when nothing broadcasts within the configured window
/// - `ConnectionClosed` on a zero-length read
/// - any framing/integrity/decode error from [`packet::unpack`]
pub async fn recv(conn: &Connection) -> Result<Message> {
    if conn.transport != TransportKind::Udp {
        return Err(ProtocolError::ConfigError(
            constants::ERR_RECV_NEEDS_UDP.to_string(),
        ));
    }
    let addr = conn.socket_addr(UDP_DISCOVERY_PORT)?;

    let socket = UdpSocket::bind(addr).await?;
    socket.set_broadcast(true)?;

    let mut buf = vec![0u8; SOCKET_BUF_LEN];
    debug!(%addr, "receiving broadcast message");
    let (len, peer) = with_timeout(conn.timeout, socket.recv_from(&mut buf)).await?;

    if len == 0 {
        warn!(%peer, "recv_from, socket closed");
        return Err(ProtocolError::ConnectionClosed);
    }
    if len == SOCKET_BUF_LEN {
        warn!(%peer, len, "datagram filled the buffer; only decoding the first message");
    }
    trace!(%peer, frame = %hex::encode(&buf[..len]), "udp frame");

    packet::unpack(conn, &buf[..len])
}
