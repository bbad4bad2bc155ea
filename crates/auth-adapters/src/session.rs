//! In-memory session store: opaque random tokens mapped to principals,
//! with a fixed TTL. Suits single-process deployments and tests; a
//! durable store implements the same port.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use domains::{Principal, Result, SessionStore};
use rand::RngCore;

pub struct MemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

struct SessionEntry {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// 256 bits of OS randomness, base64url without padding.
    fn mint_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::days(7))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, principal: Principal) -> Result<String> {
        let token = Self::mint_token();
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                principal,
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(token)
    }

    async fn get(&self, token: &str) -> Result<Option<Principal>> {
        if let Some(entry) = self.sessions.get(token) {
            if entry.expires_at > Utc::now() {
                return Ok(Some(entry.principal));
            }
        }
        // Expired entries are dropped lazily on lookup.
        self.sessions.remove(token);
        Ok(None)
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }
}
