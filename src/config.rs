//! # Protocol Constants & Connection Descriptors
//!
//! Centralized constants for the local Tuya "3.3" protocol and the
//! caller-owned connection descriptor used by every codec and transport call.
//!
//! ## Interoperability
//! Every constant in this module is fixed by the external device protocol and
//! must match bit-for-bit: magic words, ports, the well-known discovery key,
//! and the version header. None of them are tunable.
//!
//! ## Security Considerations
//! - The per-device key comes from the caller (persistent storage); it is
//!   never logged and is redacted from `Debug` output
//! - `UDP_KEY` is public by design: it only decodes broadcast announcements

use crate::error::{constants, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Protocol version spoken by the devices this crate targets.
pub const PROTOCOL_VERSION: &[u8; 3] = b"3.3";

/// Magic word opening every frame.
pub const FRAME_HEADER: u32 = 0x0000_55aa;

/// Magic word closing every frame.
pub const FRAME_FOOTER: u32 = 0x0000_aa55;

/// UDP port devices broadcast discovery announcements on.
pub const UDP_DISCOVERY_PORT: u16 = 6667;

/// TCP port devices accept control exchanges on.
pub const TCP_CONTROL_PORT: u16 = 6668;

/// Length of a device symmetric key in bytes (AES-128).
pub const KEY_LEN: usize = 16;

/// Well-known key shared by all devices, used only to decode UDP
/// broadcast/discovery payloads before a device-specific key is known.
pub const UDP_KEY: [u8; KEY_LEN] = [
    0x6c, 0x1e, 0xc8, 0xe2, 0xbb, 0x9b, 0xb5, 0x9a, 0xb5, 0x0b, 0x0d, 0xaf, 0x64, 0x9b, 0x41, 0x0a,
];

/// Per-call socket buffer size; also the largest frame a device will accept.
pub const SOCKET_BUF_LEN: usize = 512;

/// Send/receive timeout used by the firmware call sites.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Which socket flavor a connection descriptor drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    /// One-shot discovery receive on [`UDP_DISCOVERY_PORT`].
    Udp,
    /// One-shot request/response exchange on [`TCP_CONTROL_PORT`].
    Tcp,
}

/// Caller-owned connection descriptor.
///
/// Created per call site, often short-lived, holding a provisioning key
/// fetched from storage. The protocol core never mutates it; multiple tasks
/// may use independent descriptors concurrently (even pointing at the same
/// device) because each call owns its own socket and buffer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Socket flavor this descriptor is valid for.
    pub transport: TransportKind,

    /// IPv4 address literal. For UDP discovery this is the bind address
    /// (typically `0.0.0.0`); for TCP it is the device address.
    pub host: String,

    /// Device symmetric key. All-zero for discovery-only descriptors; the
    /// codec then recovers payloads through the well-known fallback key.
    pub key: [u8; KEY_LEN],

    /// Bounds every socket operation of a call. Zero blocks indefinitely.
    pub timeout: Duration,
}

impl Connection {
    /// Descriptor for listening to discovery broadcasts.
    pub fn udp<S: Into<String>>(host: S) -> Self {
        Self {
            transport: TransportKind::Udp,
            host: host.into(),
            key: [0u8; KEY_LEN],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Descriptor for controlling one device with its provisioning key.
    pub fn tcp<S: Into<String>>(host: S, key: [u8; KEY_LEN]) -> Self {
        Self {
            transport: TransportKind::Tcp,
            host: host.into(),
            key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-operation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the socket address this descriptor points at.
    ///
    /// The host must be an IPv4 literal; the devices (and their discovery
    /// broadcasts) are IPv4-only.
    pub(crate) fn socket_addr(&self, port: u16) -> Result<SocketAddr> {
        let ip: Ipv4Addr = self
            .host
            .parse()
            .map_err(|_| ProtocolError::ConfigError(constants::ERR_HOST_NOT_IP.to_string()))?;
        Ok(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Validate the descriptor for common issues and misconfigurations.
    ///
    /// Returns a list of validation errors. Empty list means the descriptor is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push(constants::ERR_HOST_EMPTY.to_string());
        } else if self.host.parse::<Ipv4Addr>().is_err() {
            errors.push(format!(
                "{}: '{}'",
                constants::ERR_HOST_NOT_IP,
                self.host
            ));
        }

        if self.transport == TransportKind::Tcp && self.key.iter().all(|&b| b == 0) {
            errors.push(constants::ERR_KEY_ALL_ZERO.to_string());
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Connection validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

// Manual Debug: the key must never reach logs.
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport)
            .field("host", &self.host)
            .field("key", &"[redacted]")
            .field("timeout", &self.timeout)
            .finish()
    }
}
