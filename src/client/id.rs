//! Identifiers for diagnostic events
//!
//! Only used as list keys in the console, so the weakest source is allowed
//! to produce collisions.

use chrono::Utc;
use rand::rngs::{OsRng, SmallRng, StdRng};
use rand::{RngCore, SeedableRng};

/// A source that either yields an identifier or declines
pub type Probe = fn() -> Option<String>;

/// Sources in order of preference
pub const PROBES: &[Probe] = &[platform_uuid, seeded_uuid];

/// Generate an event identifier. Never panics and never returns an empty string.
pub fn create_id() -> String {
    create_id_with(PROBES)
}

/// Try each probe in turn, falling back to a clock-seeded identifier
pub fn create_id_with(probes: &[Probe]) -> String {
    probes.iter().find_map(|probe| probe()).unwrap_or_else(weak_id)
}

/// v4 UUID from OS entropy via the uuid crate
fn platform_uuid() -> Option<String> {
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes).ok()?;
    Some(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
}

/// v4-shaped identifier from a CSPRNG seeded once from the OS
fn seeded_uuid() -> Option<String> {
    let mut rng = StdRng::from_rng(OsRng).ok()?;
    let mut bytes = [0u8; 16];
    rng.try_fill_bytes(&mut bytes).ok()?;
    Some(format_v4(bytes))
}

/// Format 16 random bytes as an RFC 4122 version 4 string
pub fn format_v4(mut bytes: [u8; 16]) -> String {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        hex[0..4].concat(),
        hex[4..6].concat(),
        hex[6..8].concat(),
        hex[8..10].concat(),
        hex[10..16].concat()
    )
}

fn weak_id() -> String {
    let now = Utc::now();
    let seed = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_millis()) as u64;
    let mut rng = SmallRng::seed_from_u64(seed);
    format!(
        "{}-{}",
        to_base36(rng.next_u64()),
        to_base36(now.timestamp_millis().unsigned_abs())
    )
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
