//! Hex wire form of sealed payloads
//!
//! The transport form is `hex(iv || ciphertext || mac)`. Emitted uppercase;
//! either case is accepted on decode. Structural checks run before any
//! cryptographic work so malformed cookies are rejected cheaply.

use crate::crypto::{SealedPayload, IV_LENGTH, MAC_LENGTH};
use crate::error::{Result, TicketError};

/// Encode a sealed payload as the cookie wire string
pub fn encode_wire(sealed: &SealedPayload) -> String {
    let mut blob = Vec::with_capacity(IV_LENGTH + sealed.ciphertext.len() + MAC_LENGTH);
    blob.extend_from_slice(&sealed.iv);
    blob.extend_from_slice(&sealed.ciphertext);
    blob.extend_from_slice(&sealed.mac);
    hex::encode_upper(blob)
}

/// Decode a cookie wire string back into its sealed components
pub fn decode_wire(wire: &str) -> Result<SealedPayload> {
    let blob =
        hex::decode(wire).map_err(|e| TicketError::MalformedWireString(e.to_string()))?;

    if blob.len() < IV_LENGTH + MAC_LENGTH {
        return Err(TicketError::MalformedWireString(format!(
            "{} bytes, need at least {}",
            blob.len(),
            IV_LENGTH + MAC_LENGTH
        )));
    }

    let (iv_bytes, rest) = blob.split_at(IV_LENGTH);
    let (ciphertext, mac_bytes) = rest.split_at(rest.len() - MAC_LENGTH);

    let mut iv = [0u8; IV_LENGTH];
    iv.copy_from_slice(iv_bytes);
    let mut mac = [0u8; MAC_LENGTH];
    mac.copy_from_slice(mac_bytes);

    Ok(SealedPayload {
        iv,
        ciphertext: ciphertext.to_vec(),
        mac,
    })
}
