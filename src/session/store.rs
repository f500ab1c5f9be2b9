//! In-memory session store
//!
//! One `RwLock` guards the whole id → session map. Every mutation (create,
//! touch, set, remove, destroy, sweep) takes the write lock, so changes to a
//! given session are linearized in lock-acquisition order. `get_value` and
//! the introspection helpers take the read lock.
//!
//! A sweep holds the write lock for a full O(n) scan of the map, blocking
//! request traffic for that long. Fine for modest session counts.

use super::entry::{Session, SessionValue};
use super::id::new_session_id;
use crate::config::SessionConfig;
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

type SessionMap = HashMap<String, Session>;

/// Read-only view of a live session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub idle_secs: u64,
    pub keys: Vec<String>,
}

/// Thread-safe store of live sessions.
///
/// Share it behind an `Arc`; every operation takes `&self`.
pub struct SessionStore {
    sessions: RwLock<SessionMap>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Name of the cookie the HTTP layer should use
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Allowed inactivity before eviction
    pub fn max_lifetime(&self) -> Duration {
        self.config.max_lifetime()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // Critical sections are single map operations; a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionMap> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new, empty session and return its identifier
    pub fn create(&self) -> String {
        let mut sessions = self.write();
        let mut id = urlencoding::encode(&new_session_id()).into_owned();
        // Only the timestamp fallback can realistically collide
        while sessions.contains_key(&id) {
            id = urlencoding::encode(&new_session_id()).into_owned();
        }
        sessions.insert(id.clone(), Session::new(id.clone()));
        tracing::debug!(live = sessions.len(), "Created session");
        id
    }

    /// Check that `id` is live and refresh its last-active time
    pub fn validate_and_touch(&self, id: &str) -> Result<(), SessionError> {
        let mut sessions = self.write();
        let session = sessions.get_mut(id).ok_or(SessionError::InvalidSession)?;
        session.touch(Instant::now());
        Ok(())
    }

    /// Insert or overwrite `key` in the session's value bag
    pub fn set_value(
        &self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<SessionValue>,
    ) -> Result<(), SessionError> {
        let mut sessions = self.write();
        let session = sessions.get_mut(id).ok_or(SessionError::InvalidSession)?;
        session.values.insert(key.into(), value.into());
        Ok(())
    }

    /// Fetch a value; a missing session and a missing key fail the same way
    pub fn get_value(&self, id: &str, key: &str) -> Result<SessionValue, SessionError> {
        self.read()
            .get(id)
            .and_then(|session| session.values.get(key))
            .cloned()
            .ok_or(SessionError::InvalidSession)
    }

    /// Remove a value, returning the previous one if it was set
    pub fn remove_value(&self, id: &str, key: &str) -> Result<Option<SessionValue>, SessionError> {
        let mut sessions = self.write();
        let session = sessions.get_mut(id).ok_or(SessionError::InvalidSession)?;
        Ok(session.values.remove(key))
    }

    /// Remove a session. Destroying an unknown id is a no-op.
    pub fn destroy(&self, id: &str) {
        if self.write().remove(id).is_some() {
            tracing::debug!("Destroyed session");
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Describe a live session without touching it
    pub fn snapshot(&self, id: &str) -> Result<SessionInfo, SessionError> {
        let now = Instant::now();
        let sessions = self.read();
        let session = sessions.get(id).ok_or(SessionError::InvalidSession)?;

        let mut keys: Vec<String> = session.values.keys().cloned().collect();
        keys.sort();

        Ok(SessionInfo {
            id: session.id.clone(),
            created_at: session.created_at,
            idle_secs: session.idle_for(now).as_secs(),
            keys,
        })
    }

    /// Evict every session idle for longer than the configured lifetime
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Sweep as if the current time were `now`
    pub fn sweep_at(&self, now: Instant) -> usize {
        let max_lifetime = self.max_lifetime();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(max_lifetime, now));
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_store(lifetime_secs: u64) -> SessionStore {
        SessionStore::new(SessionConfig::new("my_session", lifetime_secs))
    }

    #[test]
    fn test_created_session_validates() {
        let store = test_store(10);
        let id = store.create();

        assert!(store.validate_and_touch(&id).is_ok());
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_match_session_ids() {
        let store = test_store(10);
        for _ in 0..20 {
            store.create();
        }

        let sessions = store.read();
        assert_eq!(sessions.len(), 20);
        assert!(sessions.iter().all(|(key, session)| *key == session.id));
    }

    #[test]
    fn test_unknown_id_is_invalid_everywhere() {
        let store = test_store(10);

        assert_eq!(
            store.validate_and_touch("nope"),
            Err(SessionError::InvalidSession)
        );
        assert_eq!(
            store.set_value("nope", "k", "v"),
            Err(SessionError::InvalidSession)
        );
        assert_eq!(store.get_value("nope", "k"), Err(SessionError::InvalidSession));
        assert_eq!(store.remove_value("nope", "k"), Err(SessionError::InvalidSession));
        assert!(store.snapshot("nope").is_err());
    }

    #[test]
    fn test_set_then_get() {
        let store = test_store(10);
        let id = store.create();

        store.set_value(&id, "role", "admin").unwrap();
        store.set_value(&id, "visits", 3i64).unwrap();

        assert_eq!(store.get_value(&id, "role").unwrap().as_str(), Some("admin"));
        assert_eq!(store.get_value(&id, "visits").unwrap(), SessionValue::Integer(3));

        store.set_value(&id, "role", "guest").unwrap();
        assert_eq!(store.get_value(&id, "role").unwrap().as_str(), Some("guest"));
    }

    #[test]
    fn test_large_integer_round_trip() {
        let store = test_store(10);
        let id = store.create();
        let value: SessionValue = serde_json::from_str("18446744073709551615").unwrap();

        store.set_value(&id, "big", value.clone()).unwrap();
        let stored = store.get_value(&id, "big").unwrap();

        assert_eq!(stored, value);
        assert_eq!(serde_json::to_string(&stored).unwrap(), "18446744073709551615");
    }

    #[test]
    fn test_zero_lifetime_is_one_second() {
        let store = test_store(0);
        let id = store.create();

        assert_eq!(store.max_lifetime(), Duration::from_secs(1));
        assert_eq!(store.sweep_at(Instant::now() + Duration::from_millis(500)), 0);
        assert!(store.contains(&id));
        assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(2)), 1);
    }

    #[test]
    fn test_missing_key_is_invalid() {
        let store = test_store(10);
        let id = store.create();
        assert_eq!(store.get_value(&id, "absent"), Err(SessionError::InvalidSession));
    }

    #[test]
    fn test_remove_value() {
        let store = test_store(10);
        let id = store.create();
        store.set_value(&id, "k", "v").unwrap();

        assert_eq!(store.remove_value(&id, "k").unwrap(), Some(SessionValue::from("v")));
        assert_eq!(store.remove_value(&id, "k").unwrap(), None);
        assert!(store.get_value(&id, "k").is_err());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let store = test_store(10);
        let id = store.create();
        store.set_value(&id, "k", "v").unwrap();

        store.destroy(&id);
        store.destroy(&id);

        assert!(store.is_empty());
        assert_eq!(store.validate_and_touch(&id), Err(SessionError::InvalidSession));
        assert_eq!(store.get_value(&id, "k"), Err(SessionError::InvalidSession));
        assert_eq!(store.set_value(&id, "k", "v"), Err(SessionError::InvalidSession));
    }

    #[test]
    fn test_sweep_evicts_idle_and_keeps_fresh() {
        let store = test_store(2);
        let stale = store.create();
        let fresh = store.create();

        let later = Instant::now() + Duration::from_secs(3);
        store.write().get_mut(&fresh).unwrap().touch(later);

        assert_eq!(store.sweep_at(later), 1);
        assert!(!store.contains(&stale));
        assert!(store.validate_and_touch(&fresh).is_ok());
    }

    #[test]
    fn test_sweep_keeps_everything_within_lifetime() {
        let store = test_store(2);
        let a = store.create();
        let b = store.create();

        assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(1)), 0);
        assert!(store.contains(&a));
        assert!(store.contains(&b));
    }

    #[test]
    fn test_expired_session_scenario() {
        let store = test_store(2);
        let id = store.create();

        store.set_value(&id, "role", "admin").unwrap();
        assert_eq!(store.get_value(&id, "role").unwrap().as_str(), Some("admin"));

        // three seconds later a sweep runs
        assert_eq!(store.sweep_at(Instant::now() + Duration::from_secs(3)), 1);
        assert_eq!(store.validate_and_touch(&id), Err(SessionError::InvalidSession));
    }

    #[test]
    fn test_snapshot() {
        let store = test_store(10);
        let id = store.create();
        store.set_value(&id, "b", 1i64).unwrap();
        store.set_value(&id, "a", true).unwrap();

        let info = store.snapshot(&id).unwrap();
        assert_eq!(info.id, id);
        assert_eq!(info.keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(info.idle_secs, 0);
    }

    #[test]
    fn test_concurrent_writes_last_writer_wins() {
        let store = Arc::new(test_store(10));
        let id = store.create();

        let handles: Vec<_> = ["1", "2"]
            .into_iter()
            .map(|v| {
                let store = store.clone();
                let id = id.clone();
                std::thread::spawn(move || store.set_value(&id, "k", v).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let value = store.get_value(&id, "k").unwrap();
        assert!(value.as_str() == Some("1") || value.as_str() == Some("2"));
        assert_eq!(store.snapshot(&id).unwrap().keys, vec!["k".to_string()]);
    }

    #[test]
    fn test_concurrent_creates_are_distinct() {
        let store = Arc::new(test_store(10));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || (0..250).map(|_| store.create()).collect::<Vec<_>>())
            })
            .collect();

        let mut total = 0;
        for h in handles {
            total += h.join().unwrap().len();
        }
        assert_eq!(total, 2000);
        assert_eq!(store.len(), 2000);
    }
}
