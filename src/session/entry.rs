//! Per-client session record and its value bag

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single value stored in a session.
///
/// Serialized as plain JSON: strings, integers, floats, and booleans map to
/// their own variants, anything else (arrays, objects, null) lands in `Json`.
/// Integers above `i64::MAX` keep full precision as `Unsigned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl From<&str> for SessionValue {
    fn from(v: &str) -> Self {
        SessionValue::Text(v.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(v: String) -> Self {
        SessionValue::Text(v)
    }
}

impl From<i64> for SessionValue {
    fn from(v: i64) -> Self {
        SessionValue::Integer(v)
    }
}

impl From<u64> for SessionValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => SessionValue::Integer(v),
            Err(_) => SessionValue::Unsigned(v),
        }
    }
}

impl From<f64> for SessionValue {
    fn from(v: f64) -> Self {
        SessionValue::Float(v)
    }
}

impl From<bool> for SessionValue {
    fn from(v: bool) -> Self {
        SessionValue::Bool(v)
    }
}

impl SessionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Server-side session state. Owned by the store; only reachable by id.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Monotonic, refreshed on every successful touch
    pub last_active: Instant,
    pub values: HashMap<String, SessionValue>,
}

impl Session {
    pub fn new(id: String) -> Self {
        Session {
            id,
            created_at: Utc::now(),
            last_active: Instant::now(),
            values: HashMap::new(),
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_active = now;
    }

    /// `last_active + max_lifetime < now`
    pub fn is_expired(&self, max_lifetime: Duration, now: Instant) -> bool {
        match self.last_active.checked_add(max_lifetime) {
            Some(deadline) => deadline < now,
            None => false,
        }
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }
}
