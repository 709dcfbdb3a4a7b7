//! Forms-authentication ticket codec
//!
//! This crate implements an interoperable codec for the signed-and-encrypted
//! authentication tickets exchanged as forms-authentication cookie values. A
//! ticket binds an identity, opaque user data, and a validity window; any
//! party holding the same two shared secrets (a decryption key and a
//! validation key) can mint, verify, and decode tickets independently.
//!
//! # Features
//!
//! - Hex key-material parsing and validation
//! - Legacy and Modern compatibility modes for key derivation
//! - AES-CBC + HMAC-SHA256 authenticated encryption (verify-then-decrypt)
//! - Binary ticket payload serialization with 100-ns tick timestamps
//! - Hex cookie wire encoding
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use formsauth::{decrypt_ticket, encrypt_ticket, CompatibilityMode, KeyMaterial, Ticket};
//!
//! let keys = KeyMaterial::from_hex(
//!     "00112233445566778899AABBCCDDEEFF",
//!     "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F",
//! )?;
//!
//! let ticket = Ticket::new("alice", "role=admin", false, Duration::from_secs(30 * 60));
//! let cookie = encrypt_ticket(&ticket, &keys, CompatibilityMode::Modern)?;
//!
//! let decoded = decrypt_ticket(&cookie, &keys, CompatibilityMode::Modern)?;
//! assert_eq!(decoded.name, "alice");
//! # Ok::<(), formsauth::TicketError>(())
//! ```

pub mod codec;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod ticket;
pub mod wire;

pub use codec::{decrypt_ticket, encrypt_ticket};
pub use crypto::{open, seal, SealedPayload, IV_LENGTH, MAC_LENGTH};
pub use error::{Result, TicketError};
pub use keys::{
    derive_keys, CompatibilityMode, DerivedKeys, KeyMaterial, CIPHER_KEY_LENGTHS,
    MIN_VALIDATION_KEY_LENGTH,
};
pub use ticket::{Ticket, DEFAULT_COOKIE_PATH, TICKET_VERSION};
pub use wire::{decode_wire, encode_wire};
