use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::object::{FieldOp, ParseObject};
use crate::query::Query;
use crate::store::ObjectStore;

type RelationKey = (String, String, String);

#[derive(Default)]
struct MemoryState {
    objects: BTreeMap<String, BTreeMap<String, ParseObject>>,
    relations: BTreeMap<RelationKey, BTreeSet<String>>,
    unavailable: HashSet<String>,
}

/// In-process object store for tests and local runs.
///
/// Objects are kept per class in id order; relations are tracked as
/// sets of related object ids.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` directly, assigning an id when it has none.
    pub fn insert(&self, mut object: ParseObject) -> ParseObject {
        let now = timestamp();
        let id = object.object_id.clone().unwrap_or_else(new_object_id);
        object.object_id = Some(id.clone());
        object.created_at.get_or_insert_with(|| now.clone());
        object.updated_at.get_or_insert(now);
        object.mark_saved();

        self.state
            .write()
            .objects
            .entry(object.class_name.clone())
            .or_default()
            .insert(id, object.clone());
        object
    }

    /// Ids held by relation `key` of `class_name/object_id`.
    pub fn related_ids(&self, class_name: &str, object_id: &str, key: &str) -> Vec<String> {
        let rel = (class_name.to_string(), object_id.to_string(), key.to_string());
        self.state
            .read()
            .relations
            .get(&rel)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, class_name: &str) -> usize {
        self.state.read().objects.get(class_name).map(BTreeMap::len).unwrap_or(0)
    }

    /// Make every request touching `class_name` fail, as if the collection were unreachable.
    pub fn make_unavailable(&self, class_name: &str) {
        self.state.write().unavailable.insert(class_name.to_string());
    }
}

impl MemoryState {
    fn check_available(&self, class_name: &str) -> Result<(), StoreError> {
        if self.unavailable.contains(class_name) {
            return Err(StoreError::Server {
                code: 100,
                message: format!("{class_name} is unavailable"),
            });
        }
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn new_object_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(10).collect()
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn find(&self, query: &Query) -> Result<Vec<ParseObject>, StoreError> {
        let state = self.state.read();
        state.check_available(&query.class_name)?;
        let Some(objects) = state.objects.get(&query.class_name) else {
            return Ok(Vec::new());
        };

        let matching = objects.values().filter(|o| query.matches(o)).skip(query.skip);
        Ok(match query.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<ParseObject, StoreError> {
        let state = self.state.read();
        state.check_available(class_name)?;
        state
            .objects
            .get(class_name)
            .and_then(|m| m.get(object_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })
    }

    async fn save(&self, object: &ParseObject) -> Result<ParseObject, StoreError> {
        let mut state = self.state.write();
        state.check_available(&object.class_name)?;

        let now = timestamp();
        let mut stored = match &object.object_id {
            Some(id) => {
                let existing = state
                    .objects
                    .get(&object.class_name)
                    .and_then(|m| m.get(id))
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound {
                        class_name: object.class_name.clone(),
                        object_id: id.clone(),
                    })?;
                let mut merged = existing;
                for (k, v) in object.dirty_fields() {
                    merged.set(k, v.clone());
                }
                if let Some(acl) = object.acl().filter(|_| object.acl_changed()) {
                    merged.set_acl(acl.clone());
                }
                merged
            }
            None => {
                let mut created = object.clone();
                created.object_id = Some(new_object_id());
                created.created_at = Some(now.clone());
                created
            }
        };
        stored.updated_at = Some(now);
        stored.mark_saved();

        let id = stored.object_id.clone().unwrap_or_default();
        for (key, op) in object.pending_ops() {
            match op {
                FieldOp::AddRelation(pointers) => {
                    let rel = (object.class_name.clone(), id.clone(), key.clone());
                    let ids = state.relations.entry(rel).or_default();
                    ids.extend(pointers.iter().map(|p| p.object_id.clone()));
                }
            }
        }

        state
            .objects
            .entry(stored.class_name.clone())
            .or_default()
            .insert(id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Pointer, ROLE_CLASS, USER_CLASS};
    use serde_json::json;

    #[tokio::test]
    async fn save_assigns_id_and_applies_relation_ops() {
        let store = MemoryStore::new();
        let mut role = ParseObject::new(ROLE_CLASS).with("name", json!("Member"));
        role.add_relation("users", Pointer::new(USER_CLASS, "u1"));

        let saved = store.save(&role).await.unwrap();
        let id = saved.object_id.clone().unwrap();
        assert_eq!(id.len(), 10);
        assert!(saved.pending_ops().is_empty());
        assert_eq!(store.related_ids(ROLE_CLASS, &id, "users"), vec!["u1".to_string()]);

        let mut again = saved.clone();
        again.add_relation("users", Pointer::new(USER_CLASS, "u2"));
        store.save(&again).await.unwrap();
        assert_eq!(
            store.related_ids(ROLE_CLASS, &id, "users"),
            vec!["u1".to_string(), "u2".to_string()]
        );
        assert_eq!(store.count(ROLE_CLASS), 1);
    }

    #[tokio::test]
    async fn relation_update_keeps_concurrent_acl_change() {
        let store = MemoryStore::new();
        store.insert(ParseObject::new(ROLE_CLASS).with_id("r1").with("name", json!("Member")));
        let mut stale = store.get(ROLE_CLASS, "r1").await.unwrap();

        let mut edited = store.get(ROLE_CLASS, "r1").await.unwrap();
        let mut acl = crate::acl::Acl::new();
        acl.set_public_read_access(true);
        edited.set_acl(acl);
        store.save(&edited).await.unwrap();

        stale.add_relation("users", Pointer::new(USER_CLASS, "u1"));
        store.save(&stale).await.unwrap();

        let role = store.get(ROLE_CLASS, "r1").await.unwrap();
        assert!(role.acl().unwrap().public_read_access());
        assert_eq!(store.related_ids(ROLE_CLASS, "r1", "users"), vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn find_all_pages_past_one_page() {
        let store = MemoryStore::new();
        for i in 0..(crate::store::PAGE_SIZE + 5) {
            store.insert(ParseObject::new("Design").with_id(format!("d{i:05}")));
        }

        let all = store.find_all(&Query::new("Design")).await.unwrap();
        assert_eq!(all.len(), crate::store::PAGE_SIZE + 5);

        let page = store.find(&Query::new("Design").limit(10).skip(3)).await.unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].object_id.as_deref(), Some("d00003"));
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("ProjectOption", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unavailable_class_rejects_requests() {
        let store = MemoryStore::new();
        store.make_unavailable(ROLE_CLASS);
        let err = store.save(&ParseObject::new(ROLE_CLASS)).await.unwrap_err();
        assert_eq!(err.code(), 100);
        assert!(store.find(&Query::new(ROLE_CLASS)).await.is_err());
        assert!(store.get(ROLE_CLASS, "r1").await.is_err());
    }
}
