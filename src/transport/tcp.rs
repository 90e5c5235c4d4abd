//! TCP control exchange.
//!
//! One request frame out, one response frame in, over a fresh connection to
//! the device's control port. The response's sequence number is returned
//! as-is; checking it against the request is the caller's responsibility.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::config::{Connection, TransportKind, SOCKET_BUF_LEN, TCP_CONTROL_PORT};
use crate::core::packet::{self, Command, Message};
use crate::error::{constants, ProtocolError, Result};
use crate::transport::with_timeout;

/// Send one command and decode the device's response.
///
/// Packs the frame before touching the network, connects to `host:6668`,
/// writes the whole frame (a short write is a hard failure), performs one
/// read into a 512-byte buffer, and unpacks it. Every socket operation is
/// bounded by the descriptor's timeout; the socket is dropped on every exit
/// path.
///
/// # Errors
/// - `ConfigError` when the descriptor is not TCP or the host is invalid
/// - any pack error (`OversizedFrame`) before the socket is opened
/// - `Timeout`, `ConnectionClosed`, or `Io` from the exchange itself
/// - any framing/integrity/decode error from [`packet::unpack`]
pub async fn send(
    conn: &Connection,
    sequence: u32,
    command: Command,
    payload: &[u8],
) -> Result<Message> {
    if conn.transport != TransportKind::Tcp {
        return Err(ProtocolError::ConfigError(
            constants::ERR_SEND_NEEDS_TCP.to_string(),
        ));
    }
    let frame = packet::pack(conn, sequence, command, payload)?;
    let addr = conn.socket_addr(TCP_CONTROL_PORT)?;

    let mut stream = with_timeout(conn.timeout, TcpStream::connect(addr)).await?;

    debug!(%addr, sequence, ?command, "sending message");
    trace!(frame = %hex::encode(&frame), "tcp write");
    with_timeout(conn.timeout, stream.write_all(&frame)).await?;

    let mut buf = vec![0u8; SOCKET_BUF_LEN];
    debug!(%addr, "receiving message");
    let len = with_timeout(conn.timeout, stream.read(&mut buf)).await?;

    if len == 0 {
        warn!(%addr, "read, socket closed");
        return Err(ProtocolError::ConnectionClosed);
    }
    if len == SOCKET_BUF_LEN {
        warn!(%addr, len, "response filled the buffer; only decoding the first message");
    }
    trace!(frame = %hex::encode(&buf[..len]), "tcp read");

    packet::unpack(conn, &buf[..len])
}
