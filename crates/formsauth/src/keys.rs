//! Key material parsing and per-mode key derivation
//!
//! Two shared secrets drive the codec: a decryption key for the cipher and a
//! validation key for the MAC. Both arrive as hex strings distributed out of
//! band. How the raw bytes become the working cipher/MAC keys depends on the
//! selected compatibility mode.

use crate::error::{Result, TicketError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Accepted decryption key lengths (AES-128/192/256)
pub const CIPHER_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Minimum validation key length in bytes
pub const MIN_VALIDATION_KEY_LENGTH: usize = 16;

/// Purpose label for the Modern-mode encryption subkey
const PURPOSE_ENCRYPTION: &[u8] = b"encryption";

/// Purpose label for the Modern-mode validation subkey
const PURPOSE_VALIDATION: &[u8] = b"validation";

/// Compatibility mode selecting the key-derivation and decoding rules
///
/// Encode and decode must agree on the mode; a mismatch surfaces as an
/// authentication error, never as silently corrupted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityMode {
    /// Pre-2.0 style: raw key bytes are used verbatim as cipher/MAC keys
    Legacy,
    /// Derives per-purpose subkeys from the raw secrets via a keyed hash,
    /// keeping encryption and validation keys separated even when only one
    /// secret is configured
    Modern,
}

impl std::fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompatibilityMode::Legacy => write!(f, "legacy"),
            CompatibilityMode::Modern => write!(f, "modern"),
        }
    }
}

/// Raw key material parsed from the configured hex secrets
///
/// Immutable once parsed. The key bytes never appear in `Debug` output or
/// log lines.
#[derive(Clone)]
pub struct KeyMaterial {
    decryption_key: Vec<u8>,
    validation_key: Vec<u8>,
}

impl KeyMaterial {
    /// Parse and validate a decryption/validation key pair from hex strings
    ///
    /// The decryption key must decode to 16, 24, or 32 bytes (AES-128/192/256);
    /// the validation key to at least 16 bytes.
    pub fn from_hex(decryption_hex: &str, validation_hex: &str) -> Result<Self> {
        let decryption_key = parse_key_hex(decryption_hex)?;
        if !CIPHER_KEY_LENGTHS.contains(&decryption_key.len()) {
            return Err(TicketError::UnsupportedKeyLength(decryption_key.len()));
        }

        let validation_key = parse_key_hex(validation_hex)?;
        if validation_key.len() < MIN_VALIDATION_KEY_LENGTH {
            return Err(TicketError::UnsupportedKeyLength(validation_key.len()));
        }

        Ok(Self {
            decryption_key,
            validation_key,
        })
    }

    pub fn decryption_key(&self) -> &[u8] {
        &self.decryption_key
    }

    pub fn validation_key(&self) -> &[u8] {
        &self.validation_key
    }
}

// Lengths only; the secrets themselves stay out of logs.
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("decryption_key_len", &self.decryption_key.len())
            .field("validation_key_len", &self.validation_key.len())
            .finish()
    }
}

fn parse_key_hex(hex_str: &str) -> Result<Vec<u8>> {
    hex::decode(hex_str).map_err(|e| TicketError::InvalidKeyFormat(e.to_string()))
}

/// Working keys for one encode/decode operation
pub struct DerivedKeys {
    pub encryption_key: Vec<u8>,
    pub mac_key: Vec<u8>,
}

/// Derive the cipher and MAC keys for the given compatibility mode
///
/// Legacy mode passes the raw key bytes through verbatim. Modern mode runs
/// each secret through HMAC-SHA256 keyed by the secret over a purpose label,
/// producing fixed 32-byte subkeys regardless of the configured key length.
/// Derivation is deterministic: independent instances holding the same
/// secrets derive identical keys.
pub fn derive_keys(material: &KeyMaterial, mode: CompatibilityMode) -> Result<DerivedKeys> {
    match mode {
        CompatibilityMode::Legacy => Ok(DerivedKeys {
            encryption_key: material.decryption_key().to_vec(),
            mac_key: material.validation_key().to_vec(),
        }),
        CompatibilityMode::Modern => Ok(DerivedKeys {
            encryption_key: derive_subkey(material.decryption_key(), PURPOSE_ENCRYPTION)?,
            mac_key: derive_subkey(material.validation_key(), PURPOSE_VALIDATION)?,
        }),
    }
}

fn derive_subkey(secret: &[u8], purpose: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| TicketError::InvalidKeyFormat(format!("HMAC key error: {}", e)))?;
    mac.update(purpose);
    Ok(mac.finalize().into_bytes().to_vec())
}
