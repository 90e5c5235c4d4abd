//! # tuya-protocol
//!
//! Client implementation of the local Tuya smart-plug protocol ("3.3"
//! framing) used by the hydroponics controller to drive switched outlets on
//! the local network: a binary frame codec with a CRC32 seal, AES-128/ECB
//! payload encryption with the protocol's quirky padding and a two-key
//! decryption fallback, and one-shot UDP/TCP socket flows.
//!
//! The scheduler that decides *when* to talk to a device, the JSON handling
//! of discovery payloads, and the per-device key storage all live above this
//! crate. This crate only encodes, decodes, and performs a single socket
//! round trip per call.
//!
//! ## Components
//! - [`core::packet`]: frame codec — `pack`, `unpack`, [`Command`], [`Message`]
//! - [`utils::crypto`] / [`utils::padding`]: AES-128/ECB and the protocol's
//!   PKCS#7-style padding
//! - [`transport::udp`]: one discovery broadcast receive (port 6667)
//! - [`transport::tcp`]: one control request/response exchange (port 6668)
//! - [`config`]: protocol constants and the [`Connection`] descriptor
//!
//! ## Wire Format
//! ```text
//! [0x000055aa] [sequence(4)] [command(4)] [length(4)]
//! ["3.3"+12 zeroes, omitted for DP_QUERY]
//! [ciphertext(N)] [crc32(4)] [0x0000aa55]
//! ```
//!
//! ## Example
//! ```no_run
//! use tuya_protocol::{tcp, Command, Connection};
//!
//! #[tokio::main]
//! async fn main() -> tuya_protocol::Result<()> {
//!     let conn = Connection::tcp("10.0.0.9", *b"cb94da2311895bbc");
//!     let reply = tcp::send(&conn, 1, Command::Control, b"{\"1\":true}").await?;
//!     assert_eq!(reply.sequence, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//! Every operation runs to completion on the calling task with no shared
//! mutable state: each call owns its socket and its buffer. Independent
//! descriptors — even for the same device — may be used concurrently without
//! coordination. The descriptor timeout is the only cancellation mechanism,
//! and retry policy belongs to the caller.

pub mod config;
pub mod core;
pub mod error;
pub mod transport;
pub mod utils;

pub use config::{Connection, TransportKind, DEFAULT_TIMEOUT, UDP_DISCOVERY_PORT, TCP_CONTROL_PORT};
pub use core::packet::{pack, unpack, Command, Message};
pub use error::{ProtocolError, Result};
pub use transport::{tcp, udp};
