//! # Utility Modules
//!
//! Supporting utilities for the payload transforms of the frame codec.
//!
//! ## Components
//! - **Crypto**: AES-128/ECB block encryption (the mode the device protocol
//!   mandates; there is no IV or authentication on this wire)
//! - **Padding**: the protocol's PKCS#7-style padding, including its
//!   non-standard skip of the final block on aligned input
//!
//! ## Security
//! - ECB block boundaries are deterministic: identical plaintext blocks
//!   produce identical ciphertext. This is an upstream protocol property,
//!   not something a compatible implementation may change.

pub mod crypto;
pub mod padding;
