//! # Core Protocol Components
//!
//! Frame-level packing and unpacking for the local Tuya "3.3" protocol.
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Sequence(4)] [Command(4)] [Length(4)]
//! ["3.3"+12 zeroes (15), omitted for DP_QUERY]
//! [AES-128/ECB ciphertext (N, multiple of 16)]
//! [CRC32(4)] [Footer magic(4)]
//! ```
//! All multi-byte integers are big-endian. The length field counts everything
//! after the fixed 16-byte header: optional version header, ciphertext, CRC
//! and footer.
//!
//! ## Security
//! - CRC32 is an integrity check against line noise, not authentication
//! - A failed CRC is fatal: the payload is never decrypted afterwards
//! - Frames are capped at the device buffer size (512 bytes)

pub mod packet;
