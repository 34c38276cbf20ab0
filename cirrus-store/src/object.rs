use std::collections::{BTreeMap, BTreeSet};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::acl::Acl;
use crate::error::StoreError;

pub const USER_CLASS: &str = "_User";
pub const ROLE_CLASS: &str = "_Role";

const RESERVED_KEYS: [&str; 6] = ["objectId", "className", "createdAt", "updatedAt", "ACL", "__type"];

/// Reference to another object: `{"__type":"Pointer","className":..,"objectId":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    pub class_name: String,
    pub object_id: String,
}

impl Pointer {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: object_id.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "__type": "Pointer",
            "className": self.class_name,
            "objectId": self.object_id,
        })
    }
}

/// A pending field operation sent with the next save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    AddRelation(Vec<Pointer>),
}

impl FieldOp {
    pub fn to_json(&self) -> Value {
        match self {
            FieldOp::AddRelation(pointers) => json!({
                "__op": "AddRelation",
                "objects": pointers.iter().map(Pointer::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

/// A schemaless document from the object store.
///
/// System columns (`objectId`, timestamps, `ACL`) are typed; everything
/// else lives in `fields` as raw JSON. Fields set since the object was
/// loaded or last saved are tracked so updates only send what changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseObject {
    pub class_name: String,
    pub object_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    acl: Option<Acl>,
    fields: Map<String, Value>,
    ops: BTreeMap<String, FieldOp>,
    dirty: BTreeSet<String>,
    acl_dirty: bool,
}

impl ParseObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.set_acl(acl);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.dirty.insert(key.to_string());
        self.fields.insert(key.to_string(), value);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn acl(&self) -> Option<&Acl> {
        self.acl.as_ref()
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl_dirty = true;
        self.acl = Some(acl);
    }

    /// Fields set since load or the last save.
    pub fn dirty_fields(&self) -> impl Iterator<Item = (&String, &Value)> + '_ {
        self.fields.iter().filter(|(k, _)| self.dirty.contains(k.as_str()))
    }

    pub fn acl_changed(&self) -> bool {
        self.acl_dirty
    }

    /// Pointer to this object; `None` until it has been saved.
    pub fn pointer(&self) -> Option<Pointer> {
        self.object_id
            .as_ref()
            .map(|id| Pointer::new(self.class_name.clone(), id.clone()))
    }

    /// Queue `pointer` to be added to the relation `key` on the next save.
    pub fn add_relation(&mut self, key: &str, pointer: Pointer) {
        match self.ops.get_mut(key) {
            Some(FieldOp::AddRelation(pointers)) => {
                if !pointers.contains(&pointer) {
                    pointers.push(pointer);
                }
            }
            None => {
                self.ops.insert(key.to_string(), FieldOp::AddRelation(vec![pointer]));
            }
        }
    }

    pub fn pending_ops(&self) -> &BTreeMap<String, FieldOp> {
        &self.ops
    }

    /// Drop pending ops and change tracking once the store has the object.
    pub fn mark_saved(&mut self) {
        self.ops.clear();
        self.dirty.clear();
        self.acl_dirty = false;
    }

    /// Decode the REST/webhook JSON form. `class_hint` is used when the
    /// payload carries no `className` (REST query results).
    pub fn from_json(class_hint: Option<&str>, value: Value) -> Result<Self, StoreError> {
        let Value::Object(mut map) = value else {
            return Err(StoreError::decode("expected a JSON object"));
        };

        let class_name = match map.remove("className") {
            Some(Value::String(s)) => s,
            Some(_) => return Err(StoreError::decode("className must be a string")),
            None => class_hint
                .map(str::to_string)
                .ok_or_else(|| StoreError::decode("missing className"))?,
        };

        let object_id = take_string(&mut map, "objectId")?;
        let created_at = take_string(&mut map, "createdAt")?;
        let updated_at = take_string(&mut map, "updatedAt")?;
        let acl = match map.remove("ACL") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                serde_json::from_value::<Acl>(v).map_err(|e| StoreError::decode(format!("invalid ACL: {e}")))?,
            ),
        };
        map.remove("__type");

        Ok(Self {
            class_name,
            object_id,
            created_at,
            updated_at,
            acl,
            fields: map,
            ops: BTreeMap::new(),
            dirty: BTreeSet::new(),
            acl_dirty: false,
        })
    }

    /// Full JSON form, including system columns.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("className".into(), Value::String(self.class_name.clone()));
        if let Some(id) = &self.object_id {
            map.insert("objectId".into(), Value::String(id.clone()));
        }
        if let Some(ts) = &self.created_at {
            map.insert("createdAt".into(), Value::String(ts.clone()));
        }
        if let Some(ts) = &self.updated_at {
            map.insert("updatedAt".into(), Value::String(ts.clone()));
        }
        if let Some(acl) = &self.acl {
            map.insert("ACL".into(), serde_json::to_value(acl).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Body for a create/update request. A create carries every user field
    /// and the ACL; an update carries only what changed. Pending ops are
    /// always included.
    pub fn to_save_body(&self) -> Value {
        let is_new = self.object_id.is_none();
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .filter(|(k, _)| is_new || self.dirty.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(acl) = self.acl.as_ref().filter(|_| is_new || self.acl_dirty) {
            map.insert("ACL".into(), serde_json::to_value(acl).unwrap_or(Value::Null));
        }
        for (key, op) in &self.ops {
            map.insert(key.clone(), op.to_json());
        }
        Value::Object(map)
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>, StoreError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(StoreError::decode(format!("{key} must be a string"))),
    }
}

impl Serialize for ParseObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParseObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ParseObject::from_json(None, value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_webhook_object_with_system_columns() {
        let obj: ParseObject = serde_json::from_value(json!({
            "className": "_User",
            "objectId": "u1",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "username": "a@example.com",
            "ACL": {"*": {"read": true}}
        }))
        .unwrap();

        assert_eq!(obj.class_name, USER_CLASS);
        assert_eq!(obj.object_id.as_deref(), Some("u1"));
        assert_eq!(obj.get_str("username"), Some("a@example.com"));
        assert!(obj.acl().unwrap().public_read_access());
        assert!(obj.get("ACL").is_none());
    }

    #[test]
    fn class_hint_used_for_query_results() {
        let obj = ParseObject::from_json(Some("Design"), json!({"objectId": "d1", "name": "x"})).unwrap();
        assert_eq!(obj.class_name, "Design");

        let err = ParseObject::from_json(None, json!({"objectId": "d1"})).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn save_body_carries_acl_and_relation_ops_but_not_system_columns() {
        let mut acl = Acl::new();
        acl.set_public_read_access(true);

        let mut role = ParseObject::new(ROLE_CLASS).with("name", json!("Member")).with_acl(acl);
        role.created_at = Some("2024-01-01T00:00:00.000Z".into());
        role.add_relation("users", Pointer::new(USER_CLASS, "u1"));
        role.add_relation("users", Pointer::new(USER_CLASS, "u1"));

        assert_eq!(
            role.to_save_body(),
            json!({
                "name": "Member",
                "ACL": {"*": {"read": true}},
                "users": {
                    "__op": "AddRelation",
                    "objects": [{"__type": "Pointer", "className": "_User", "objectId": "u1"}]
                }
            })
        );
    }

    #[test]
    fn update_body_sends_only_changes_and_ops() {
        let mut role = ParseObject::from_json(
            Some(ROLE_CLASS),
            json!({"objectId": "r1", "name": "Member", "ACL": {"*": {"read": true}}}),
        )
        .unwrap();
        role.add_relation("users", Pointer::new(USER_CLASS, "u1"));

        assert_eq!(
            role.to_save_body(),
            json!({
                "users": {
                    "__op": "AddRelation",
                    "objects": [{"__type": "Pointer", "className": "_User", "objectId": "u1"}]
                }
            })
        );

        role.set("description", json!("everyone"));
        role.set_acl(Acl::new());
        let body = role.to_save_body();
        assert_eq!(body["description"], "everyone");
        assert_eq!(body["ACL"], json!({}));
        assert!(body.get("name").is_none());

        role.mark_saved();
        assert_eq!(role.to_save_body(), json!({}));
    }

    #[test]
    fn pointer_requires_saved_object() {
        let obj = ParseObject::new("Design");
        assert!(obj.pointer().is_none());
        let obj = obj.with_id("d1");
        assert_eq!(obj.pointer(), Some(Pointer::new("Design", "d1")));
    }
}
