use super::{InsertOutcome, StoreError, UserRecord, UserStore};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;

/// Process-local store. Users are lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserStore {
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl UserStore for MemoryUserStore {
    async fn find(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<InsertOutcome, StoreError> {
        // Check and insert under one write lock.
        match self.users.write().await.entry(record.username.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(InsertOutcome::Created)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(username: &str, hash: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryUserStore::default();

        assert_eq!(
            store.insert(record("alice", "h1")).await.unwrap(),
            InsertOutcome::Created
        );
        assert_eq!(
            store.find("alice").await.unwrap(),
            Some(record("alice", "h1"))
        );
        assert_eq!(store.find("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = MemoryUserStore::default();
        store.insert(record("alice", "h1")).await.unwrap();

        assert_eq!(store.find("Alice").await.unwrap(), None);
        assert_eq!(
            store.insert(record("Alice", "h2")).await.unwrap(),
            InsertOutcome::Created
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn conflict_keeps_first_record() {
        let store = MemoryUserStore::default();
        store.insert(record("alice", "h1")).await.unwrap();

        assert_eq!(
            store.insert(record("alice", "h2")).await.unwrap(),
            InsertOutcome::Conflict
        );
        assert_eq!(
            store.find("alice").await.unwrap().map(|r| r.password_hash),
            Some("h1".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_create_once() {
        let store = MemoryUserStore::default();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(record("alice", &format!("h{i}"))).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == InsertOutcome::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn debug_hides_hash() {
        let debug = format!("{:?}", record("alice", "$argon2id$secret"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("argon2id"));
    }
}
