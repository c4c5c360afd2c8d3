//! One-time codes for password resets. Codes live in an [`OtpStore`] keyed by
//! normalized email and expire after the configured TTL.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::Rng;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Six digit reset code. `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(CODE_MIN..=CODE_MAX).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate.trim()
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

impl OtpEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("no reset code was requested for this email; please request a new code")]
    NotFound,
    #[error("the reset code has expired; please request a new code")]
    Expired,
    #[error("the reset code is incorrect")]
    Mismatch,
    #[error("reset code store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for outstanding reset codes. At most one code per email; a new code
/// replaces the previous one.
pub trait OtpStore: Send + Sync {
    fn put(&self, email: &str, entry: OtpEntry) -> Result<(), OtpError>;
    fn get(&self, email: &str) -> Result<Option<OtpEntry>, OtpError>;
    fn remove(&self, email: &str) -> Result<(), OtpError>;
    /// Drops every entry expired at `now` and returns how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, OtpError>;
}

/// Checks `candidate` against the stored code. Expired codes are deleted on sight;
/// a matching code is left in place for the caller to consume once the reset lands.
pub fn verify_code(
    store: &dyn OtpStore,
    email: &str,
    candidate: &str,
    now: DateTime<Utc>,
) -> Result<(), OtpError> {
    let entry = store.get(email)?.ok_or(OtpError::NotFound)?;

    if entry.is_expired(now) {
        store.remove(email)?;
        return Err(OtpError::Expired);
    }

    if !entry.code.matches(candidate) {
        return Err(OtpError::Mismatch);
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryOtpStore {
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpStore for InMemoryOtpStore {
    fn put(&self, email: &str, entry: OtpEntry) -> Result<(), OtpError> {
        self.entries
            .lock()
            .expect("otp mutex poisoned")
            .insert(email.to_string(), entry);
        Ok(())
    }

    fn get(&self, email: &str) -> Result<Option<OtpEntry>, OtpError> {
        Ok(self
            .entries
            .lock()
            .expect("otp mutex poisoned")
            .get(email)
            .cloned())
    }

    fn remove(&self, email: &str) -> Result<(), OtpError> {
        self.entries
            .lock()
            .expect("otp mutex poisoned")
            .remove(email);
        Ok(())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, OtpError> {
        let mut guard = self.entries.lock().expect("otp mutex poisoned");
        let before = guard.len();
        guard.retain(|_, entry| !entry.is_expired(now));
        Ok(before - guard.len())
    }
}

/// Outbound delivery of reset codes, e.g. an email adapter.
pub trait OtpNotifier: Send + Sync {
    fn deliver(&self, message: OtpMessage) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpMessage {
    pub email: String,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("reset code transport unavailable: {0}")]
    Transport(String),
}
