//! Ticket record and its binary payload layout
//!
//! Payload format (all integers little-endian, strings length-prefixed with
//! a u16 followed by UTF-8 bytes):
//!
//! - `version: u8` - Format version (currently 1)
//! - `issued_at: u64` - 100-ns ticks since 0001-01-01 00:00:00 UTC
//! - `expires_at: u64` - Same tick encoding
//! - `is_persistent: u8` - Advisory flag, 0 or 1
//! - `name: u16 length + bytes` - Identity string
//! - `user_data: u16 length + bytes` - Opaque caller data
//! - `cookie_path: u16 length + bytes` - Cookie path, "/" by default

use crate::error::{Result, TicketError};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current ticket format version
pub const TICKET_VERSION: u8 = 1;

/// Default cookie path when none is supplied
pub const DEFAULT_COOKIE_PATH: &str = "/";

/// 100-ns ticks between 0001-01-01 and the Unix epoch
const UNIX_EPOCH_TICKS: u64 = 621_355_968_000_000_000;

/// Ticks per second at 100-ns resolution
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Fixed-width prefix: version + two timestamps + persistence flag
const FIXED_HEADER_LEN: usize = 1 + 8 + 8 + 1;

/// Length-prefixed strings cap at what a u16 prefix can declare
const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Decoded identity record exchanged as a cookie value
///
/// Immutable once constructed. Expiry is not enforced here: an expired
/// ticket round-trips successfully, and honoring the validity window is the
/// caller's policy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub version: u8,
    pub name: String,
    pub issued_at: SystemTime,
    pub expires_at: SystemTime,
    pub is_persistent: bool,
    pub user_data: String,
    pub cookie_path: String,
}

impl Ticket {
    /// Mint a fresh ticket valid from now for the given duration
    pub fn new(
        name: impl Into<String>,
        user_data: impl Into<String>,
        is_persistent: bool,
        valid_for: Duration,
    ) -> Self {
        let issued_at = truncate_to_ticks(SystemTime::now());
        Self {
            version: TICKET_VERSION,
            name: name.into(),
            issued_at,
            expires_at: issued_at + valid_for,
            is_persistent,
            user_data: user_data.into(),
            cookie_path: DEFAULT_COOKIE_PATH.to_string(),
        }
    }

    /// Reissue this ticket under a new identity and validity window
    ///
    /// Keeps `is_persistent` and `cookie_path`, stamps `issued_at` from the
    /// system clock, and substitutes the name and user data. Pure data
    /// transformation; the result still needs to go through the encoder.
    pub fn reissue(
        &self,
        new_name: impl Into<String>,
        new_user_data: impl Into<String>,
        valid_for: Duration,
    ) -> Self {
        let issued_at = truncate_to_ticks(SystemTime::now());
        Self {
            version: TICKET_VERSION,
            name: new_name.into(),
            issued_at,
            expires_at: issued_at + valid_for,
            is_persistent: self.is_persistent,
            user_data: new_user_data.into(),
            cookie_path: self.cookie_path.clone(),
        }
    }

    /// Serialize to the binary payload form
    pub fn serialize(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(
            FIXED_HEADER_LEN
                + 2
                + self.name.len()
                + 2
                + self.user_data.len()
                + 2
                + self.cookie_path.len(),
        );

        buf.put_u8(self.version);
        buf.put_u64_le(ticks_from_time(self.issued_at)?);
        buf.put_u64_le(ticks_from_time(self.expires_at)?);
        buf.put_u8(u8::from(self.is_persistent));
        put_string(&mut buf, "name", &self.name)?;
        put_string(&mut buf, "user_data", &self.user_data)?;
        put_string(&mut buf, "cookie_path", &self.cookie_path)?;

        Ok(buf.freeze())
    }

    /// Deserialize from the binary payload form
    pub fn deserialize(payload: &[u8]) -> Result<Self> {
        let mut buf = payload;

        if buf.remaining() < FIXED_HEADER_LEN {
            return Err(TicketError::TruncatedPayload(format!(
                "need {} header bytes, have {}",
                FIXED_HEADER_LEN,
                buf.remaining()
            )));
        }

        let version = buf.get_u8();
        if version != TICKET_VERSION {
            return Err(TicketError::UnsupportedVersion(version));
        }

        let issued_at = time_from_ticks(buf.get_u64_le())?;
        let expires_at = time_from_ticks(buf.get_u64_le())?;
        let is_persistent = buf.get_u8() != 0;

        let name = get_string(&mut buf, "name")?;
        let user_data = get_string(&mut buf, "user_data")?;
        let cookie_path = get_string(&mut buf, "cookie_path")?;

        Ok(Self {
            version,
            name,
            issued_at,
            expires_at,
            is_persistent,
            user_data,
            cookie_path,
        })
    }
}

impl Serialize for Ticket {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let issued = self
            .issued_at
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        let expires = self
            .expires_at
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;

        let mut state = serializer.serialize_struct("Ticket", 9)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("issued_at_secs", &issued.as_secs())?;
        state.serialize_field("issued_at_nanos", &issued.subsec_nanos())?;
        state.serialize_field("expires_at_secs", &expires.as_secs())?;
        state.serialize_field("expires_at_nanos", &expires.subsec_nanos())?;
        state.serialize_field("is_persistent", &self.is_persistent)?;
        state.serialize_field("user_data", &self.user_data)?;
        state.serialize_field("cookie_path", &self.cookie_path)?;
        state.end()
    }
}

fn put_string(buf: &mut BytesMut, field: &'static str, value: &str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_STRING_LEN {
        return Err(TicketError::EncodingError(format!(
            "{} exceeds {} bytes",
            field, MAX_STRING_LEN
        )));
    }
    buf.put_u16_le(bytes.len() as u16);
    buf.put_slice(bytes);
    Ok(())
}

fn get_string(buf: &mut &[u8], field: &'static str) -> Result<String> {
    if buf.remaining() < 2 {
        return Err(TicketError::TruncatedPayload(format!(
            "missing length prefix for {}",
            field
        )));
    }
    let len = buf.get_u16_le() as usize;

    if buf.remaining() < len {
        return Err(TicketError::TruncatedPayload(format!(
            "{} declares {} bytes, {} remain",
            field,
            len,
            buf.remaining()
        )));
    }

    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes)
        .map_err(|e| TicketError::EncodingError(format!("invalid UTF-8 in {}: {}", field, e)))
}

/// Convert a timestamp to 100-ns ticks since 0001-01-01 UTC
fn ticks_from_time(t: SystemTime) -> Result<u64> {
    let out_of_range = || TicketError::EncodingError("timestamp out of tick range".to_string());

    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let ticks = d
                .as_secs()
                .checked_mul(TICKS_PER_SECOND)
                .and_then(|v| v.checked_add(u64::from(d.subsec_nanos()) / 100))
                .ok_or_else(out_of_range)?;
            UNIX_EPOCH_TICKS.checked_add(ticks).ok_or_else(out_of_range)
        }
        Err(e) => {
            let d = e.duration();
            let ticks = d
                .as_secs()
                .checked_mul(TICKS_PER_SECOND)
                .and_then(|v| v.checked_add(u64::from(d.subsec_nanos()) / 100))
                .ok_or_else(out_of_range)?;
            UNIX_EPOCH_TICKS.checked_sub(ticks).ok_or_else(out_of_range)
        }
    }
}

/// Convert 100-ns ticks since 0001-01-01 UTC back to a timestamp
fn time_from_ticks(ticks: u64) -> Result<SystemTime> {
    let (base, delta) = if ticks >= UNIX_EPOCH_TICKS {
        (true, ticks - UNIX_EPOCH_TICKS)
    } else {
        (false, UNIX_EPOCH_TICKS - ticks)
    };

    let offset = Duration::new(
        delta / TICKS_PER_SECOND,
        ((delta % TICKS_PER_SECOND) * 100) as u32,
    );

    if base {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    }
    .ok_or_else(|| TicketError::EncodingError("timestamp out of tick range".to_string()))
}

/// Drop sub-tick precision so a constructed ticket round-trips exactly
fn truncate_to_ticks(t: SystemTime) -> SystemTime {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => UNIX_EPOCH + Duration::new(d.as_secs(), d.subsec_nanos() / 100 * 100),
        Err(_) => t,
    }
}
