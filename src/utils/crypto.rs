//! AES-128/ECB payload encryption.
//!
//! The upstream device protocol specifies ECB with a 16-byte key and no
//! IV/nonce, so block boundaries are deterministic and re-encrypting
//! identical plaintext blocks yields identical ciphertext. That is an
//! accepted limitation of the protocol; a compatible implementation must not
//! "fix" it.
//!
//! [`encrypt`] pads via [`padding`](crate::utils::padding) before
//! enciphering, matching the length actually written to the wire.
//! [`decrypt`] never strips padding itself — the codec decides whether the
//! plaintext carries padding after its key-fallback acceptance test.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::error::{ProtocolError, Result};
use crate::utils::padding;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`, padding first.
///
/// The output length is `round_up(plaintext.len(), 16)`; an empty input
/// yields an empty output (heartbeat-style frames carry no ciphertext).
pub fn encrypt(plaintext: &[u8], key: &[u8; BLOCK_SIZE]) -> Result<Vec<u8>> {
    let cipher = Aes128::new(key.into());
    let mut buf = plaintext.to_vec();
    padding::add_padding(&mut buf);

    for block in buf.chunks_mut(BLOCK_SIZE) {
        cipher.encrypt_block(block.into());
    }
    Ok(buf)
}

/// Decrypt `ciphertext` under `key`, block by block.
///
/// # Errors
/// Returns `ProtocolError::InvalidBlockLength` unless the input length is a
/// multiple of the AES block size.
pub fn decrypt(ciphertext: &[u8], key: &[u8; BLOCK_SIZE]) -> Result<Vec<u8>> {
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(ProtocolError::InvalidBlockLength(ciphertext.len()));
    }
    let cipher = Aes128::new(key.into());
    let mut buf = ciphertext.to_vec();

    for block in buf.chunks_mut(BLOCK_SIZE) {
        cipher.decrypt_block(block.into());
    }
    Ok(buf)
}
