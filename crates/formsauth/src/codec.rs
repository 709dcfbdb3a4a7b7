//! Ticket codec orchestration
//!
//! Composes serialization, key derivation, authenticated encryption, and the
//! hex wire form. Each stage fails fast; there is no fallback to another
//! compatibility mode and no partial result.

use crate::crypto;
use crate::error::Result;
use crate::keys::{derive_keys, CompatibilityMode, KeyMaterial};
use crate::ticket::Ticket;
use crate::wire;
use tracing::trace;

/// Encrypt a ticket into its cookie wire string
pub fn encrypt_ticket(
    ticket: &Ticket,
    keys: &KeyMaterial,
    mode: CompatibilityMode,
) -> Result<String> {
    let payload = ticket.serialize()?;
    let derived = derive_keys(keys, mode)?;
    let sealed = crypto::seal(&payload, &derived.encryption_key, &derived.mac_key)?;

    trace!(
        "sealed {} payload bytes into {} ciphertext bytes ({} mode)",
        payload.len(),
        sealed.ciphertext.len(),
        mode
    );

    Ok(wire::encode_wire(&sealed))
}

/// Decrypt a cookie wire string back into a ticket
///
/// Verify-then-decrypt: the MAC is checked before the cipher runs, and the
/// payload is only parsed after both succeed.
pub fn decrypt_ticket(
    wire_str: &str,
    keys: &KeyMaterial,
    mode: CompatibilityMode,
) -> Result<Ticket> {
    let sealed = wire::decode_wire(wire_str)?;
    let derived = derive_keys(keys, mode)?;
    let payload = crypto::open(
        &sealed.iv,
        &sealed.ciphertext,
        &sealed.mac,
        &derived.encryption_key,
        &derived.mac_key,
    )?;

    trace!(
        "opened {} ciphertext bytes into {} payload bytes ({} mode)",
        sealed.ciphertext.len(),
        payload.len(),
        mode
    );

    Ticket::deserialize(&payload)
}
