//! Session identifier generation
//!
//! Identifiers are 32 bytes from the OS entropy source, URL-safe base64
//! without padding (43 characters). If the entropy source fails, the
//! generator falls back to the decimal nanosecond timestamp; the caller
//! always gets a usable string and cannot tell which path produced it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Bytes of entropy per identifier
pub const ID_ENTROPY_BYTES: usize = 32;

/// Length of an identifier produced by the secure path
pub const ID_ENCODED_LEN: usize = 43;

#[derive(Error, Debug)]
#[error("entropy source failure: {0}")]
struct EntropySourceFailure(String);

/// Last timestamp handed out by the fallback path
static LAST_FALLBACK_NANOS: AtomicU64 = AtomicU64::new(0);

/// Generate a new session identifier from the OS entropy source
pub fn new_session_id() -> String {
    new_session_id_from(&mut OsRng)
}

/// Generate a session identifier from an arbitrary fallible entropy source
pub fn new_session_id_from<R: TryRngCore + ?Sized>(source: &mut R) -> String {
    match read_entropy(source) {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(e) => {
            tracing::warn!("{}; falling back to timestamp session ID", e);
            fallback_id()
        }
    }
}

fn read_entropy<R: TryRngCore + ?Sized>(
    source: &mut R,
) -> Result<[u8; ID_ENTROPY_BYTES], EntropySourceFailure> {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    source
        .try_fill_bytes(&mut bytes)
        .map_err(|e| EntropySourceFailure(e.to_string()))?;
    Ok(bytes)
}

/// Decimal nanosecond timestamp, strictly increasing within this process
fn fallback_id() -> String {
    let now = chrono::Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n.max(0) as u64)
        .unwrap_or(0);

    let previous = LAST_FALLBACK_NANOS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);

    now.max(previous + 1).to_string()
}
