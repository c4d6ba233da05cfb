use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::config::SessionBackend;
use crate::error::{AppError, Result};
use crate::models::session::Session;

/// A value held by the in-memory store.
pub struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Key/value store for sessions, CSRF tokens and rate-limit counters.
///
/// Production uses Redis; the in-memory variant serves tests and
/// single-process deployments.
#[derive(Clone)]
pub enum SessionStore {
    Redis(ConnectionManager),
    Memory(Arc<Mutex<HashMap<String, MemoryEntry>>>),
}

impl SessionStore {
    /// Connects the store described by the configuration.
    pub async fn connect(backend: &SessionBackend) -> Result<Self> {
        match backend {
            SessionBackend::Redis(url) => {
                let client = redis::Client::open(url.as_str())?;
                let manager = ConnectionManager::new(client).await?;
                tracing::info!("✅ Redis Connection Manager initialized (pooled)");
                Ok(SessionStore::Redis(manager))
            }
            SessionBackend::Memory => {
                tracing::warn!("⚠️ Using in-memory session store, sessions are lost on restart");
                Ok(Self::memory())
            }
        }
    }

    pub fn memory() -> Self {
        SessionStore::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    fn lock_memory(
        map: &Mutex<HashMap<String, MemoryEntry>>,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        map.lock()
            .map_err(|_| AppError::Internal("Session store lock poisoned".to_string()))
    }

    /// Inserts an entry, dropping every expired one first so keys that are
    /// never read again (abandoned sessions, counters for random emails)
    /// do not pile up.
    fn insert_memory(
        map: &mut HashMap<String, MemoryEntry>,
        key: &str,
        value: String,
        expires_at: Instant,
        now: Instant,
    ) {
        map.retain(|_, entry| entry.expires_at > now);
        map.insert(key.to_string(), MemoryEntry { value, expires_at });
    }

    /// Stores `value` under `key` for `ttl_secs` seconds.
    pub async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        match self {
            SessionStore::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn.set_ex(key, value, ttl_secs).await?;
            }
            SessionStore::Memory(map) => {
                let now = Instant::now();
                Self::insert_memory(
                    &mut *Self::lock_memory(map)?,
                    key,
                    value.to_string(),
                    now + Duration::from_secs(ttl_secs),
                    now,
                );
            }
        }
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            SessionStore::Redis(manager) => {
                let mut conn = manager.clone();
                Ok(conn.get(key).await?)
            }
            SessionStore::Memory(map) => {
                let mut map = Self::lock_memory(map)?;
                let expired = match map.get(key) {
                    Some(entry) if entry.expires_at > Instant::now() => {
                        return Ok(Some(entry.value.clone()));
                    }
                    Some(_) => true,
                    None => false,
                };
                if expired {
                    map.remove(key);
                }
                Ok(None)
            }
        }
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        match self {
            SessionStore::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn.del(key).await?;
            }
            SessionStore::Memory(map) => {
                Self::lock_memory(map)?.remove(key);
            }
        }
        Ok(())
    }

    /// Increments a counter, (re)arming its expiry, and returns the new value.
    pub async fn incr_with_expiry(&self, key: &str, ttl_secs: u64) -> Result<i64> {
        match self {
            SessionStore::Redis(manager) => {
                let mut conn = manager.clone();
                let count: i64 = conn.incr(key, 1).await?;
                let _: () = conn.expire(key, ttl_secs as i64).await?;
                Ok(count)
            }
            SessionStore::Memory(map) => {
                let mut map = Self::lock_memory(map)?;
                let now = Instant::now();
                let current = map
                    .get(key)
                    .filter(|entry| entry.expires_at > now)
                    .and_then(|entry| entry.value.parse::<i64>().ok())
                    .unwrap_or(0);
                let count = current + 1;
                Self::insert_memory(
                    &mut map,
                    key,
                    count.to_string(),
                    now + Duration::from_secs(ttl_secs),
                    now,
                );
                Ok(count)
            }
        }
    }

    /// Remaining lifetime of a key in seconds.
    pub async fn ttl(&self, key: &str) -> Result<Option<i64>> {
        match self {
            SessionStore::Redis(manager) => {
                let mut conn = manager.clone();
                let ttl: i64 = conn.ttl(key).await?;
                Ok((ttl >= 0).then_some(ttl))
            }
            SessionStore::Memory(map) => {
                let map = Self::lock_memory(map)?;
                Ok(map.get(key).and_then(|entry| {
                    entry
                        .expires_at
                        .checked_duration_since(Instant::now())
                        .map(|left| left.as_secs() as i64)
                }))
            }
        }
    }

    pub async fn save_session(&self, session_id: Uuid, session: &Session, ttl_secs: u64) -> Result<()> {
        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;
        self.set_ex(&session_key(session_id), &session_json, ttl_secs).await
    }

    /// Loads a session, dropping it if it has expired.
    pub async fn load_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let key = session_key(session_id);
        let Some(session_json) = self.get(&key).await? else {
            return Ok(None);
        };

        let session: Session = match sonic_rs::from_str(&session_json) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("❌ Invalid session JSON: {}", e);
                self.del(&key).await?;
                return Ok(None);
            }
        };

        if session.is_expired(chrono::Utc::now()) {
            tracing::warn!("❌ Session expired for user: {}", session.user_id);
            self.del(&key).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<()> {
        self.del(&session_key(session_id)).await
    }
}

pub fn session_key(session_id: Uuid) -> String {
    format!("session:{}", session_id)
}

pub fn csrf_key(token: &str) -> String {
    format!("csrf:{}", token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(expires_in: chrono::Duration) -> Session {
        Session {
            user_id: 1,
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            created_at: Utc::now(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn memory_sessions_round_trip() {
        let store = SessionStore::memory();
        let id = Uuid::new_v4();
        store.save_session(id, &session(chrono::Duration::days(1)), 60).await.unwrap();

        let loaded = store.load_session(id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, 1);
        assert_eq!(loaded.access_token, "access");

        store.delete_session(id).await.unwrap();
        assert!(store.load_session(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let store = SessionStore::memory();
        let id = Uuid::new_v4();
        store.save_session(id, &session(chrono::Duration::seconds(-5)), 60).await.unwrap();
        assert!(store.load_session(id).await.unwrap().is_none());
        assert!(store.get(&session_key(id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counters_increment() {
        let store = SessionStore::memory();
        assert_eq!(store.incr_with_expiry("rate", 60).await.unwrap(), 1);
        assert_eq!(store.incr_with_expiry("rate", 60).await.unwrap(), 2);
        assert!(store.ttl("rate").await.unwrap().unwrap() <= 60);
        store.del("rate").await.unwrap();
        assert_eq!(store.ttl("rate").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_swept_on_insert() {
        let store = SessionStore::memory();
        for n in 0..1000 {
            store
                .incr_with_expiry(&format!("rate_limit:login:user{}@example.com", n), 0)
                .await
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store.set_ex("csrf:fresh", "1", 60).await.unwrap();

        let SessionStore::Memory(map) = &store else {
            unreachable!("memory() builds the in-memory store");
        };
        let map = map.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("csrf:fresh"));
    }
}
