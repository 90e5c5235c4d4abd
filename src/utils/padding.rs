//! PKCS#7-style padding over AES blocks, as the device protocol speaks it.
//!
//! The one divergence from textbook PKCS#7: when the input length is already
//! a multiple of the block size, [`add_padding`] appends nothing (the
//! textbook would add a full 16-byte block). Real devices depend on this, so
//! it is preserved verbatim; see [`strip_padding`] for the matching
//! best-effort removal.

use crate::utils::crypto::BLOCK_SIZE;

/// Round `len` up to the next multiple of `block`. Identity when aligned.
pub fn round_up(len: usize, block: usize) -> usize {
    len.div_ceil(block) * block
}

/// Append protocol padding in place.
///
/// Appends `16 - len % 16` bytes, each holding that pad length. Aligned
/// buffers are left untouched (non-standard PKCS#7, kept for wire
/// compatibility with existing hardware).
pub fn add_padding(buf: &mut Vec<u8>) {
    let rem = buf.len() % BLOCK_SIZE;
    if rem == 0 {
        return;
    }
    let pad = (BLOCK_SIZE - rem) as u8;
    buf.resize(buf.len() + pad as usize, pad);
}

/// Best-effort removal of protocol padding in place.
///
/// Declines to strip — leaving the buffer unchanged — whenever the trailer
/// does not look like padding: buffers shorter than one block, a final byte
/// of `0` or `>= 16`, or trailing bytes that do not all repeat the pad value.
/// Never reports failure.
pub fn strip_padding(buf: &mut Vec<u8>) {
    if buf.len() < BLOCK_SIZE {
        return;
    }
    let Some(&last) = buf.last() else {
        return;
    };
    if last == 0 || last as usize >= BLOCK_SIZE {
        return;
    }
    let pad = last as usize;
    if buf[buf.len() - pad..].iter().any(|&b| b != last) {
        return;
    }
    buf.truncate(buf.len() - pad);
}
