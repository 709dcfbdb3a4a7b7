//! Authenticated encryption of ticket payloads
//!
//! Seal: random IV, PKCS#7 pad, AES-CBC encrypt, then HMAC-SHA256 over
//! `iv || ciphertext`. Open runs the steps in reverse with the MAC checked
//! first; the cipher is never touched until the tag verifies.

use crate::error::{Result, TicketError};
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size; also the IV width on the wire
pub const IV_LENGTH: usize = 16;

/// HMAC-SHA256 tag width on the wire
pub const MAC_LENGTH: usize = 32;

/// One sealed payload: the three wire components before hex encoding
#[derive(Debug)]
pub struct SealedPayload {
    pub iv: [u8; IV_LENGTH],
    pub ciphertext: Vec<u8>,
    pub mac: [u8; MAC_LENGTH],
}

/// Encrypt and authenticate a payload
///
/// The IV is drawn fresh from the thread-local CSPRNG on every call, so
/// concurrent sealers never share one.
pub fn seal(payload: &[u8], encryption_key: &[u8], mac_key: &[u8]) -> Result<SealedPayload> {
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = encrypt_cbc(payload, encryption_key, &iv)?;
    let mac = compute_mac(mac_key, &iv, &ciphertext)?;

    Ok(SealedPayload {
        iv,
        ciphertext,
        mac,
    })
}

/// Verify and decrypt a sealed payload
///
/// The tag comparison is constant-time. A MAC mismatch fails with
/// `AuthenticationFailed` before any decryption is attempted; malformed
/// padding under a valid MAC fails with `InvalidPadding`.
pub fn open(
    iv: &[u8; IV_LENGTH],
    ciphertext: &[u8],
    mac: &[u8],
    encryption_key: &[u8],
    mac_key: &[u8],
) -> Result<Vec<u8>> {
    let mut expected = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| TicketError::InvalidKeyFormat(format!("HMAC key error: {}", e)))?;
    expected.update(iv);
    expected.update(ciphertext);
    expected
        .verify_slice(mac)
        .map_err(|_| TicketError::AuthenticationFailed)?;

    decrypt_cbc(ciphertext, encryption_key, iv)
}

fn compute_mac(mac_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<[u8; MAC_LENGTH]> {
    let mut mac = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| TicketError::InvalidKeyFormat(format!("HMAC key error: {}", e)))?;
    mac.update(iv);
    mac.update(ciphertext);

    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; MAC_LENGTH];
    out.copy_from_slice(&tag);
    Ok(out)
}

fn encrypt_cbc(plaintext: &[u8], key: &[u8], iv: &[u8; IV_LENGTH]) -> Result<Vec<u8>> {
    // PKCS#7 always adds at least one padding byte
    let padded_len = ((plaintext.len() / IV_LENGTH) + 1) * IV_LENGTH;
    let mut buffer = vec![0u8; padded_len];
    buffer[..plaintext.len()].copy_from_slice(plaintext);

    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new(key.into(), iv.into())
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len()),
        24 => Aes192CbcEnc::new(key.into(), iv.into())
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len()),
        32 => Aes256CbcEnc::new(key.into(), iv.into())
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len()),
        n => return Err(TicketError::UnsupportedKeyLength(n)),
    }
    .map_err(|_| TicketError::InvalidPadding)?;

    Ok(ciphertext.to_vec())
}

fn decrypt_cbc(ciphertext: &[u8], key: &[u8], iv: &[u8; IV_LENGTH]) -> Result<Vec<u8>> {
    let mut buffer = ciphertext.to_vec();

    let plaintext = match key.len() {
        16 => Aes128CbcDec::new(key.into(), iv.into()).decrypt_padded_mut::<Pkcs7>(&mut buffer),
        24 => Aes192CbcDec::new(key.into(), iv.into()).decrypt_padded_mut::<Pkcs7>(&mut buffer),
        32 => Aes256CbcDec::new(key.into(), iv.into()).decrypt_padded_mut::<Pkcs7>(&mut buffer),
        n => return Err(TicketError::UnsupportedKeyLength(n)),
    }
    .map_err(|_| TicketError::InvalidPadding)?;

    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENC_KEY: [u8; 16] = [0x11; 16];
    const MAC_KEY: [u8; 32] = [0x22; 32];

    #[test]
    fn test_seal_open_roundtrip() {
        let payload = b"ticket payload bytes";
        let sealed = seal(payload, &ENC_KEY, &MAC_KEY).expect("seal");
        let opened = open(
            &sealed.iv,
            &sealed.ciphertext,
            &sealed.mac,
            &ENC_KEY,
            &MAC_KEY,
        )
        .expect("open");
        assert_eq!(opened, payload);
    }

    #[test]
    fn test_ciphertext_is_block_aligned() {
        for len in [0, 1, 15, 16, 17, 64] {
            let payload = vec![0xABu8; len];
            let sealed = seal(&payload, &ENC_KEY, &MAC_KEY).unwrap();
            assert_eq!(sealed.ciphertext.len() % IV_LENGTH, 0);
            // PKCS#7 always pads, so a full block of payload gains a block
            assert!(sealed.ciphertext.len() > len);
        }
    }

    #[test]
    fn test_fresh_iv_per_seal() {
        let sealed_a = seal(b"same payload", &ENC_KEY, &MAC_KEY).unwrap();
        let sealed_b = seal(b"same payload", &ENC_KEY, &MAC_KEY).unwrap();
        assert_ne!(sealed_a.iv, sealed_b.iv);
        assert_ne!(sealed_a.ciphertext, sealed_b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let sealed = seal(b"payload", &ENC_KEY, &MAC_KEY).unwrap();
        let mut tampered = sealed.ciphertext.clone();
        tampered[0] ^= 0x01;
        let result = open(&sealed.iv, &tampered, &sealed.mac, &ENC_KEY, &MAC_KEY);
        assert_eq!(result.unwrap_err(), TicketError::AuthenticationFailed);
    }

    #[test]
    fn test_tampered_mac_fails_authentication() {
        let sealed = seal(b"payload", &ENC_KEY, &MAC_KEY).unwrap();
        let mut tampered = sealed.mac;
        tampered[MAC_LENGTH - 1] ^= 0x80;
        let result = open(
            &sealed.iv,
            &sealed.ciphertext,
            &tampered,
            &ENC_KEY,
            &MAC_KEY,
        );
        assert_eq!(result.unwrap_err(), TicketError::AuthenticationFailed);
    }

    #[test]
    fn test_wrong_mac_key_fails_authentication() {
        let sealed = seal(b"payload", &ENC_KEY, &MAC_KEY).unwrap();
        let other_mac_key = [0x33u8; 32];
        let result = open(
            &sealed.iv,
            &sealed.ciphertext,
            &sealed.mac,
            &ENC_KEY,
            &other_mac_key,
        );
        assert_eq!(result.unwrap_err(), TicketError::AuthenticationFailed);
    }

    #[test]
    fn test_all_cipher_widths() {
        for key_len in [16usize, 24, 32] {
            let key = vec![0x44u8; key_len];
            let sealed = seal(b"any payload", &key, &MAC_KEY).unwrap();
            let opened = open(&sealed.iv, &sealed.ciphertext, &sealed.mac, &key, &MAC_KEY)
                .expect("open with matching key width");
            assert_eq!(opened, b"any payload");
        }
    }

    #[test]
    fn test_unsupported_key_length_rejected() {
        let key = vec![0x55u8; 20];
        let result = seal(b"payload", &key, &MAC_KEY);
        assert_eq!(result.unwrap_err(), TicketError::UnsupportedKeyLength(20));
    }
}
