//! # Error Types
//!
//! Comprehensive error handling for the local Tuya protocol.
//!
//! This module defines all error variants that can occur during protocol
//! operations, from low-level socket failures to frame-level violations.
//!
//! ## Error Categories
//! - **Argument/config errors**: invalid descriptors, oversized frames —
//!   detected before any I/O or crypto
//! - **Framing errors**: wrong magic/footer, undersized length field,
//!   truncated frames
//! - **Integrity errors**: CRC mismatch — always fatal, the payload is never
//!   decoded after a failed CRC
//! - **Decode errors**: payload undecryptable under every candidate key
//! - **Transport errors**: socket create/bind/connect failures, timeouts,
//!   zero-length reads
//!
//! All errors implement `std::error::Error` for interoperability. Every layer
//! returns failure to its caller; nothing panics on adversarial input, and no
//! layer retries on its own.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Connection descriptor validation
    pub const ERR_HOST_EMPTY: &str = "Connection host cannot be empty";
    pub const ERR_HOST_NOT_IP: &str = "Connection host must be an IPv4 address literal";
    pub const ERR_KEY_ALL_ZERO: &str = "TCP connection key must not be all zeroes";

    /// Transport misuse
    pub const ERR_RECV_NEEDS_UDP: &str = "recv requires a UDP connection descriptor";
    pub const ERR_SEND_NEEDS_TCP: &str = "send requires a TCP connection descriptor";
}

/// Primary error type for all protocol operations.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Frame of {0} bytes would exceed the device buffer")]
    OversizedFrame(usize),

    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("Frame truncated before field at offset {0}")]
    TruncatedFrame(usize),

    #[error("Invalid frame header: {0:#010x}")]
    InvalidHeader(u32),

    #[error("Invalid frame footer: {0:#010x}")]
    InvalidFooter(u32),

    #[error("Invalid frame length field: {0}")]
    InvalidLength(u32),

    #[error("Unknown command code: {0}")]
    UnknownCommand(u32),

    #[error("CRC mismatch: got {got:#010x}, expected {expected:#010x}")]
    CrcMismatch { got: u32, expected: u32 },

    #[error("Ciphertext length {0} is not a multiple of the AES block size")]
    InvalidBlockLength(usize),

    #[error("Payload decryption failed under every candidate key")]
    DecryptionFailure,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
