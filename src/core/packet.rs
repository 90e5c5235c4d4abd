//! Frame codec: pack a command + payload into wire bytes, unpack wire bytes
//! into a decoded [`Message`].
//!
//! Every field read during unpacking is a bounds-checked cursor operation;
//! adversarial input fails with a framing error instead of reading past the
//! buffer. The CRC is verified before any decryption is attempted.

use std::fmt;

use bytes::BufMut;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{
    Connection, FRAME_FOOTER, FRAME_HEADER, PROTOCOL_VERSION, SOCKET_BUF_LEN, UDP_KEY,
};
use crate::error::{ProtocolError, Result};
use crate::utils::crypto::{self, BLOCK_SIZE};
use crate::utils::padding;

/// Fixed header: magic + sequence + command + length field.
pub const HEADER_LEN: usize = 16;

/// CRC word plus footer magic.
pub const CRC_FOOTER_LEN: usize = 8;

/// Smallest parseable frame: fixed header + CRC + footer.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CRC_FOOTER_LEN;

/// Version header: ASCII "3.3" followed by 12 zero bytes.
pub const VERSION_HEADER_LEN: usize = 15;

/// Command codes understood by protocol 3.3 devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum Command {
    /// Set datapoints on the device.
    Control = 7,
    /// Datapoint status report.
    Status = 8,
    /// Keep-alive exchange.
    HeartBeat = 9,
    /// Query datapoints; the only command sent without a version header.
    DpQuery = 10,
    /// UDP discovery announcement.
    UdpNew = 19,
}

impl TryFrom<u32> for Command {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            7 => Ok(Command::Control),
            8 => Ok(Command::Status),
            9 => Ok(Command::HeartBeat),
            10 => Ok(Command::DpQuery),
            19 => Ok(Command::UdpNew),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

/// One decoded frame.
///
/// The payload buffer is owned by the message and freed when it is dropped;
/// there is no manual release step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Echoed request sequence number. Matching it against the request is the
    /// caller's responsibility.
    pub sequence: u32,
    /// Command this frame carries.
    pub command: Command,
    /// Small status code some responses prepend before the payload.
    pub return_code: Option<u32>,
    /// Decrypted, unpadded payload; empty for heartbeat-style frames.
    pub payload: Vec<u8>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seq={:#010x} cmd={:?} ret_code={:?} payload[{}]={}",
            self.sequence,
            self.command,
            self.return_code,
            self.payload.len(),
            hex::encode(&self.payload),
        )
    }
}

/// CRC-32/IEEE over a frame prefix (reflected polynomial 0xEDB88320, init and
/// xorout 0xFFFFFFFF). Identical to the lookup table devices ship with.
fn frame_crc(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Bounds-checked big-endian reader over a received frame.
struct FrameCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FrameCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        // take() guarantees exactly 4 bytes.
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(ProtocolError::TruncatedFrame(self.pos))?;
        if end > self.buf.len() {
            return Err(ProtocolError::TruncatedFrame(self.pos));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// Pack `payload` into a complete wire frame.
///
/// The payload is padded and encrypted with the connection key; commands
/// other than [`Command::DpQuery`] get the 15-byte version header between the
/// fixed header and the ciphertext. The CRC seals everything written before
/// it.
///
/// # Errors
/// Returns `ProtocolError::OversizedFrame` when the finished frame would not
/// fit the device-side socket buffer.
pub fn pack(
    conn: &Connection,
    sequence: u32,
    command: Command,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let padded_len = padding::round_up(payload.len(), BLOCK_SIZE);
    let extra = if command == Command::DpQuery {
        0
    } else {
        VERSION_HEADER_LEN
    };
    let total_len = HEADER_LEN + extra + padded_len + CRC_FOOTER_LEN;
    if total_len > SOCKET_BUF_LEN {
        return Err(ProtocolError::OversizedFrame(total_len));
    }

    let mut buf = BytesMut::with_capacity(total_len);
    buf.put_u32(FRAME_HEADER);
    buf.put_u32(sequence);
    buf.put_u32(command as u32);
    buf.put_u32((extra + padded_len + CRC_FOOTER_LEN) as u32);
    if extra > 0 {
        buf.put_slice(PROTOCOL_VERSION);
        buf.put_bytes(0, VERSION_HEADER_LEN - PROTOCOL_VERSION.len());
    }

    let ciphertext = crypto::encrypt(payload, &conn.key)?;
    debug_assert_eq!(ciphertext.len(), padded_len);
    buf.put_slice(&ciphertext);

    let crc = frame_crc(&buf);
    debug!("calculated frame crc: {crc:#010x}");
    buf.put_u32(crc);
    buf.put_u32(FRAME_FOOTER);
    debug_assert_eq!(buf.len(), total_len);

    Ok(buf.to_vec())
}

/// Unpack one wire frame into a [`Message`].
///
/// Validation order matches the devices: magic, length field, CRC, footer,
/// and only then payload decryption. A CRC mismatch is fatal; the ciphertext
/// is never touched after one.
pub fn unpack(conn: &Connection, buf: &[u8]) -> Result<Message> {
    if buf.len() < MIN_FRAME_LEN {
        return Err(ProtocolError::FrameTooShort(buf.len()));
    }

    let mut cursor = FrameCursor::new(buf);
    let header = cursor.read_u32()?;
    if header != FRAME_HEADER {
        return Err(ProtocolError::InvalidHeader(header));
    }

    let sequence = cursor.read_u32()?;
    let command = Command::try_from(cursor.read_u32()?)?;

    let declared_len = cursor.read_u32()?;
    if (declared_len as usize) < CRC_FOOTER_LEN {
        return Err(ProtocolError::InvalidLength(declared_len));
    }
    let body_len = declared_len as usize - CRC_FOOTER_LEN;
    let body = cursor.take(body_len)?;

    let crc = cursor.read_u32()?;
    let expected = frame_crc(&buf[..HEADER_LEN + body_len]);
    if crc != expected {
        return Err(ProtocolError::CrcMismatch { got: crc, expected });
    }

    let footer = cursor.read_u32()?;
    if footer != FRAME_FOOTER {
        return Err(ProtocolError::InvalidFooter(footer));
    }

    let (return_code, payload) = decode_payload(conn, body)?;
    Ok(Message {
        sequence,
        command,
        return_code,
        payload,
    })
}

/// Decode the region between the fixed header and the CRC.
///
/// Layout, every part optional: a 4-byte return code (recognized when its top
/// 24 bits are zero — a documented heuristic, not a protocol marker), a
/// 15-byte version sub-header, then ciphertext. The ciphertext is tried
/// against the connection key and then the well-known discovery key,
/// accepting the first attempt that decrypts to a `{`-prefixed JSON document.
/// With no authenticated encryption on this wire, that sniff is the only
/// acceptance test available.
fn decode_payload(conn: &Connection, body: &[u8]) -> Result<(Option<u32>, Vec<u8>)> {
    if body.is_empty() {
        // Short heartbeat-style message without any payload.
        return Ok((None, Vec::new()));
    }

    let mut rest = body;
    let mut return_code = None;
    if rest.len() >= 4 {
        let head = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        if head & 0xffff_ff00 == 0 {
            return_code = Some(head);
            rest = &rest[4..];
        }
    }
    if rest.is_empty() {
        return Ok((return_code, Vec::new()));
    }

    if rest.starts_with(PROTOCOL_VERSION) {
        if rest.len() <= VERSION_HEADER_LEN {
            // Nothing but the version sub-header remains.
            return Ok((return_code, Vec::new()));
        }
        rest = &rest[VERSION_HEADER_LEN..];
    }

    let candidates: [&[u8; 16]; 2] = [&conn.key, &UDP_KEY];
    for (attempt, key) in candidates.into_iter().enumerate() {
        let mut plaintext = crypto::decrypt(rest, key)?;
        if plaintext.first() != Some(&b'{') {
            debug!(attempt = attempt + 1, total = candidates.len(), "failed to decrypt");
            continue;
        }
        padding::strip_padding(&mut plaintext);
        return Ok((return_code, plaintext));
    }
    Err(ProtocolError::DecryptionFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;

    fn test_conn() -> Connection {
        Connection::tcp("10.0.0.9", *b"cb94da2311895bbc")
    }

    #[test]
    fn crc_reference_vector() {
        // CRC-32/IEEE check value.
        assert_eq!(frame_crc(b"123456789"), 0xcbf4_3926);
        assert_eq!(frame_crc(&[]), 0);
    }

    #[test]
    fn command_codes_match_wire_values() {
        assert_eq!(Command::Control as u32, 7);
        assert_eq!(Command::Status as u32, 8);
        assert_eq!(Command::HeartBeat as u32, 9);
        assert_eq!(Command::DpQuery as u32, 10);
        assert_eq!(Command::UdpNew as u32, 19);
        assert!(matches!(
            Command::try_from(42),
            Err(ProtocolError::UnknownCommand(42))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn packed_frame_layout() {
        let conn = test_conn();
        let frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();

        // 16 header + 15 version + 16 ciphertext + 8 crc/footer.
        assert_eq!(frame.len(), 55);
        assert_eq!(&frame[0..4], &0x0000_55aau32.to_be_bytes());
        assert_eq!(&frame[4..8], &1u32.to_be_bytes());
        assert_eq!(&frame[8..12], &7u32.to_be_bytes());
        assert_eq!(&frame[12..16], &(15u32 + 16 + 8).to_be_bytes());
        assert_eq!(&frame[16..19], b"3.3");
        assert_eq!(&frame[19..31], &[0u8; 12]);
        assert_eq!(&frame[frame.len() - 4..], &0x0000_aa55u32.to_be_bytes());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn dp_query_omits_version_header() {
        let conn = test_conn();
        let frame = pack(&conn, 2, Command::DpQuery, b"{}").unwrap();
        assert_eq!(frame.len(), HEADER_LEN + 16 + CRC_FOOTER_LEN);
        assert_ne!(&frame[16..19], b"3.3");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn roundtrip_all_boundary_lengths() {
        let conn = test_conn();
        for len in [0usize, 1, 15, 16, 17, 255] {
            let mut payload = vec![b'{'; 1];
            payload.resize(len.max(1), b'x');
            // Zero-length payloads stay empty.
            let payload = if len == 0 { Vec::new() } else { payload };

            let frame = pack(&conn, 7, Command::Control, &payload).unwrap();
            let msg = unpack(&conn, &frame).unwrap();
            assert_eq!(msg.sequence, 7);
            assert_eq!(msg.command, Command::Control);
            assert_eq!(msg.payload, payload, "length {len}");
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn control_scenario() {
        let conn = test_conn();
        let frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        let msg = unpack(&conn, &frame).unwrap();
        assert_eq!(msg.sequence, 1);
        assert_eq!(msg.command, Command::Control);
        assert_eq!(msg.return_code, None);
        assert_eq!(msg.payload, b"{\"1\":true}");
    }

    #[test]
    fn short_buffer_rejected() {
        let conn = test_conn();
        for len in 0..MIN_FRAME_LEN {
            let buf = vec![0u8; len];
            assert!(matches!(
                unpack(&conn, &buf),
                Err(ProtocolError::FrameTooShort(_))
            ));
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn corrupted_header_rejected() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        frame[0] ^= 0x01;
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::InvalidHeader(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn corrupted_crc_rejected() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        let crc_offset = frame.len() - CRC_FOOTER_LEN;
        frame[crc_offset] ^= 0x80;
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn corrupted_ciphertext_fails_integrity_before_decode() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        frame[HEADER_LEN + VERSION_HEADER_LEN] ^= 0xff;
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::CrcMismatch { .. })
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn corrupted_footer_rejected() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        let footer_offset = frame.len() - 1;
        frame[footer_offset] ^= 0x01;
        // The CRC does not cover the footer, so this must surface as a
        // framing error, never a silent wrong decode.
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::InvalidFooter(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn declared_length_below_minimum_rejected() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::HeartBeat, &[]).unwrap();
        frame[12..16].copy_from_slice(&7u32.to_be_bytes());
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::InvalidLength(7))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn declared_length_past_buffer_rejected() {
        let conn = test_conn();
        let mut frame = pack(&conn, 1, Command::HeartBeat, &[]).unwrap();
        frame[12..16].copy_from_slice(&400u32.to_be_bytes());
        assert!(matches!(
            unpack(&conn, &frame),
            Err(ProtocolError::TruncatedFrame(_))
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let conn = test_conn();
        let payload = vec![b'x'; SOCKET_BUF_LEN];
        assert!(matches!(
            pack(&conn, 1, Command::Control, &payload),
            Err(ProtocolError::OversizedFrame(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn fallback_key_recovers_discovery_payload() {
        // Frame encrypted with the well-known discovery key, decoded through
        // a descriptor holding a different (device) key.
        let broadcast_conn = Connection {
            transport: TransportKind::Udp,
            host: "0.0.0.0".to_string(),
            key: UDP_KEY,
            timeout: std::time::Duration::ZERO,
        };
        let frame = pack(
            &broadcast_conn,
            0,
            Command::UdpNew,
            b"{\"ip\":\"10.0.0.9\",\"gwId\":\"plug01\"}",
        )
        .unwrap();

        let msg = unpack(&test_conn(), &frame).unwrap();
        assert_eq!(msg.command, Command::UdpNew);
        assert_eq!(msg.payload, b"{\"ip\":\"10.0.0.9\",\"gwId\":\"plug01\"}");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn unknown_key_fails_decode() {
        let stranger = Connection::tcp("10.0.0.9", *b"deadbeefdeadbeef");
        let frame = pack(&stranger, 3, Command::Control, b"{\"1\":false}").unwrap();
        assert!(matches!(
            unpack(&test_conn(), &frame),
            Err(ProtocolError::DecryptionFailure)
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn return_code_heuristic() {
        let conn = test_conn();

        // Hand-build a frame body: return code 0 followed by ciphertext.
        let ciphertext = crypto::encrypt(b"{\"dps\":{\"1\":true}}", &conn.key).unwrap();
        let mut body = 0u32.to_be_bytes().to_vec();
        body.extend_from_slice(&ciphertext);

        let mut frame = BytesMut::new();
        frame.put_u32(FRAME_HEADER);
        frame.put_u32(5);
        frame.put_u32(Command::Status as u32);
        frame.put_u32((body.len() + CRC_FOOTER_LEN) as u32);
        frame.put_slice(&body);
        let crc = frame_crc(&frame);
        frame.put_u32(crc);
        frame.put_u32(FRAME_FOOTER);

        let msg = unpack(&conn, &frame).unwrap();
        assert_eq!(msg.sequence, 5);
        assert_eq!(msg.return_code, Some(0));
        assert_eq!(msg.payload, b"{\"dps\":{\"1\":true}}");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn return_code_only_body() {
        let conn = test_conn();

        let mut frame = BytesMut::new();
        frame.put_u32(FRAME_HEADER);
        frame.put_u32(9);
        frame.put_u32(Command::HeartBeat as u32);
        frame.put_u32((4 + CRC_FOOTER_LEN) as u32);
        frame.put_u32(0); // bare return code
        let crc = frame_crc(&frame);
        frame.put_u32(crc);
        frame.put_u32(FRAME_FOOTER);

        let msg = unpack(&conn, &frame).unwrap();
        assert_eq!(msg.return_code, Some(0));
        assert!(msg.payload.is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn empty_body_heartbeat() {
        let conn = test_conn();
        // DP_QUERY with an empty payload packs to a bare frame: no version
        // header, no ciphertext.
        let frame = pack(&conn, 4, Command::DpQuery, &[]).unwrap();
        assert_eq!(frame.len(), MIN_FRAME_LEN);

        let msg = unpack(&conn, &frame).unwrap();
        assert_eq!(msg.return_code, None);
        assert!(msg.payload.is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn message_display_is_log_friendly() {
        let conn = test_conn();
        let frame = pack(&conn, 1, Command::Control, b"{\"1\":true}").unwrap();
        let msg = unpack(&conn, &frame).unwrap();
        let rendered = msg.to_string();
        assert!(rendered.contains("Control"));
        assert!(rendered.contains("payload[10]"));
    }
}
