//! # Transport Layer
//!
//! One-shot socket flows for the local protocol: a single UDP discovery
//! receive and a single TCP request/response exchange.
//!
//! ## Resource Model
//! Every call creates its own socket and its own 512-byte buffer, runs to
//! completion, and drops the socket on every exit path — success, timeout, or
//! error. There is no connection pooling, no session state between calls, and
//! no retry; callers that need resilience retry above this layer. The
//! descriptor's timeout is the only cancellation mechanism: it bounds each
//! socket operation, and a zero timeout blocks indefinitely subject to the OS.

pub mod tcp;
pub mod udp;

use std::future::Future;
use std::io;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Bound one socket operation by the descriptor's timeout.
///
/// A zero duration waits forever, matching an unset `SO_RCVTIMEO`.
pub(crate) async fn with_timeout<T, F>(limit: Duration, op: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    if limit.is_zero() {
        return Ok(op.await?);
    }
    match tokio::time::timeout(limit, op).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ProtocolError::Timeout),
    }
}
