//! Conversation Context Store (component G): an in-memory, TTL-bounded map
//! keyed on (companyId, phone), plus the per-key mutex table the
//! orchestrator uses to serialize a conversation's turns (§5).

use dashmap::DashMap;
use parking_lot::Mutex;
use reserva_core::domain::Conversation;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ContextKey {
    pub company_id: Uuid,
    pub phone: String,
}

impl ContextKey {
    pub fn new(company_id: Uuid, phone: impl Into<String>) -> Self {
        Self {
            company_id,
            phone: phone.into(),
        }
    }
}

struct Entry {
    conversation: Conversation,
    last_touched: Instant,
}

/// Holds live conversations with a 30-minute sliding TTL, and a per-key
/// mutex so the orchestrator can guarantee single-writer semantics for a
/// conversation without the datastore providing it.
pub struct ContextStore {
    entries: DashMap<ContextKey, Entry>,
    locks: DashMap<ContextKey, Arc<tokio::sync::Mutex<()>>>,
    ttl: Duration,
}

impl ContextStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            locks: DashMap::new(),
            ttl,
        }
    }

    /// The mutex guarding this key's turn processing. Held for the
    /// duration of a single inbound message.
    pub fn lock_for(&self, key: &ContextKey) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub fn get(&self, key: &ContextKey) -> Option<Conversation> {
        let entry = self.entries.get(key)?;
        if entry.last_touched.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.conversation.clone())
    }

    pub fn put(&self, key: ContextKey, conversation: Conversation) {
        self.entries.insert(
            key,
            Entry {
                conversation,
                last_touched: Instant::now(),
            },
        );
    }

    pub fn delete(&self, key: &ContextKey) {
        self.entries.remove(key);
        self.locks.remove(key);
    }

    pub fn list_by_company(&self, company_id: Uuid) -> Vec<Conversation> {
        self.entries
            .iter()
            .filter(|e| e.key().company_id == company_id && e.value().last_touched.elapsed() <= self.ttl)
            .map(|e| e.value().conversation.clone())
            .collect()
    }

    /// Drops entries whose TTL has elapsed. Call periodically from a
    /// background task; `get` also self-evicts lazily so this is a
    /// best-effort memory reclaim, not a correctness requirement.
    pub fn sweep_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.last_touched.elapsed() <= ttl);
    }

    /// Every live (non-expired) entry across every tenant. Used by the
    /// background abandonment sweep, which has no single company to scope to.
    pub fn list_all(&self) -> Vec<(ContextKey, Conversation)> {
        self.entries
            .iter()
            .filter(|e| e.value().last_touched.elapsed() <= self.ttl)
            .map(|e| (e.key().clone(), e.value().conversation.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn conv(company: Uuid, user: Uuid) -> Conversation {
        Conversation::new(company, user)
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = ContextStore::new(Duration::from_secs(1800));
        let key = ContextKey::new(Uuid::new_v4(), "+573001234567");
        let c = conv(key.company_id, Uuid::new_v4());
        store.put(key.clone(), c.clone());
        assert_eq!(store.get(&key).unwrap().id, c.id);
    }

    #[test]
    fn expired_entry_is_evicted_on_get() {
        let store = ContextStore::new(Duration::from_millis(1));
        let key = ContextKey::new(Uuid::new_v4(), "+573001234567");
        store.put(key.clone(), conv(key.company_id, Uuid::new_v4()));
        std::thread::sleep(Duration::from_millis(10));
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn list_by_company_only_returns_matching_live_entries() {
        let store = ContextStore::new(Duration::from_secs(1800));
        let company_a = Uuid::new_v4();
        let company_b = Uuid::new_v4();
        store.put(
            ContextKey::new(company_a, "+573001111111"),
            conv(company_a, Uuid::new_v4()),
        );
        store.put(
            ContextKey::new(company_b, "+573002222222"),
            conv(company_b, Uuid::new_v4()),
        );
        assert_eq!(store.list_by_company(company_a).len(), 1);
    }
}
