use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sort_by_age_desc, StoreError, UserStore};
use crate::model::{UserDraft, UserId, UserRecord};

/// Process-local user collection.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        sort_by_age_desc(&mut users);
        Ok(users)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn insert(&self, draft: UserDraft) -> Result<UserId, StoreError> {
        let id = UserId::generate();
        let mut users = self.users.write().await;
        if users.contains_key(&id) {
            return Err(StoreError::Backend(format!("duplicate id {id}")));
        }
        users.insert(id.clone(), draft.with_id(id.clone()));
        Ok(id)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.users.write().await.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        self.users
            .write()
            .await
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, age: i64) -> UserDraft {
        UserDraft { name: name.to_owned(), age, email: format!("{name}@example.com") }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        let id = store.insert(draft("ana", 30)).await.unwrap();
        let found = store.find_by_id(&id).await.unwrap();
        assert_eq!(found, draft("ana", 30).with_id(id));
    }

    #[tokio::test]
    async fn lists_by_age_descending() {
        let store = MemoryStore::new();
        for (name, age) in [("b", 20), ("a", 45), ("c", 31)] {
            store.insert(draft(name, age)).await.unwrap();
        }
        let ages: Vec<i64> = store.list_all().await.unwrap().iter().map(|u| u.age).collect();
        assert_eq!(ages, [45, 31, 20]);
    }

    #[tokio::test]
    async fn update_upserts_and_replaces() {
        let store = MemoryStore::new();
        let id = UserId::parse("fresh1").unwrap();
        let record = draft("ana", 30).with_id(id.clone());
        store.update(&record).await.unwrap();
        assert_eq!(store.find_by_id(&id).await.unwrap(), record);

        let replaced = UserDraft { age: 31, ..Default::default() }.with_id(id.clone());
        store.update(&replaced).await.unwrap();
        assert_eq!(store.find_by_id(&id).await.unwrap(), replaced);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_returns_removed_and_then_not_found() {
        let store = MemoryStore::new();
        let id = store.insert(draft("ana", 30)).await.unwrap();
        assert_eq!(store.delete(&id).await.unwrap().name, "ana");
        assert!(matches!(store.delete(&id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.find_by_id(&id).await, Err(StoreError::NotFound(_))));
    }
}
