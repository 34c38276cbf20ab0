//! Typed views over the store documents this organisation reads.
//!
//! Decoding only looks at the fields the cloud code uses; anything else on
//! the document is ignored.

use cirrus_store::{Acl, ParseObject, Pointer, ROLE_CLASS, USER_CLASS};
use serde::Serialize;
use serde_json::Value;

pub const DESIGN_CLASS: &str = "Design";
pub const PROJECT_CLASS: &str = "Project";
pub const PROJECT_OPTION_CLASS: &str = "ProjectOption";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected a {expected} object, got {found}")]
    WrongClass { expected: &'static str, found: String },

    #[error("{class_name}.{field} is missing")]
    Missing { class_name: String, field: &'static str },

    #[error("{class_name}.{field} is not {expected}")]
    WrongType {
        class_name: String,
        field: &'static str,
        expected: &'static str,
    },
}

fn expect_class(object: &ParseObject, expected: &'static str) -> Result<(), DecodeError> {
    if object.class_name == expected {
        Ok(())
    } else {
        Err(DecodeError::WrongClass {
            expected,
            found: object.class_name.clone(),
        })
    }
}

fn object_id(object: &ParseObject) -> Result<String, DecodeError> {
    object.object_id.clone().ok_or_else(|| DecodeError::Missing {
        class_name: object.class_name.clone(),
        field: "objectId",
    })
}

/// Optional string field; `null` reads as absent.
fn opt_string(object: &ParseObject, field: &'static str) -> Result<Option<String>, DecodeError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::WrongType {
            class_name: object.class_name.clone(),
            field,
            expected: "a string",
        }),
    }
}

fn opt_value(object: &ParseObject, field: &str) -> Option<Value> {
    object.get(field).filter(|v| !v.is_null()).cloned()
}

/// Falsy: `null`, `false`, `0`, `""`.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Ids are compared as text; numeric ids are accepted too.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A `_User` being saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    /// Created through anonymous (guest) authentication.
    pub anonymous: bool,
}

impl User {
    pub fn from_object(object: &ParseObject) -> Result<Self, DecodeError> {
        expect_class(object, USER_CLASS)?;
        let anonymous = object
            .get("authData")
            .and_then(|auth| auth.get("anonymous"))
            .is_some_and(truthy);

        Ok(Self {
            id: object.object_id.clone(),
            email: opt_string(object, "email")?,
            username: opt_string(object, "username")?,
            anonymous,
        })
    }

    pub fn pointer(&self) -> Option<Pointer> {
        self.id.as_ref().map(|id| Pointer::new(USER_CLASS, id.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
}

impl Role {
    pub fn from_object(object: &ParseObject) -> Result<Self, DecodeError> {
        expect_class(object, ROLE_CLASS)?;
        Ok(Self {
            id: object_id(object)?,
            name: opt_string(object, "name")?.ok_or_else(|| DecodeError::Missing {
                class_name: object.class_name.clone(),
                field: "name",
            })?,
        })
    }
}

/// One entry of a design's `sketchItems`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SketchItem {
    pub gltf_id: Option<String>,
}

impl SketchItem {
    /// `gltfId` may sit on the item itself or under its `attributes`.
    pub fn from_value(value: &Value) -> Self {
        let gltf_id = value
            .get("gltfId")
            .or_else(|| value.get("attributes").and_then(|a| a.get("gltfId")))
            .and_then(id_text);
        Self { gltf_id }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub id: String,
    pub name: Option<String>,
    pub creator: Option<Value>,
    pub acl: Acl,
    pub sketch_items: Vec<SketchItem>,
}

impl Design {
    pub fn from_object(object: &ParseObject) -> Result<Self, DecodeError> {
        expect_class(object, DESIGN_CLASS)?;
        let sketch_items = match object.get("sketchItems") {
            Some(Value::Array(items)) => items.iter().map(SketchItem::from_value).collect(),
            Some(Value::Null) | None => {
                return Err(DecodeError::Missing {
                    class_name: object.class_name.clone(),
                    field: "sketchItems",
                })
            }
            Some(_) => {
                return Err(DecodeError::WrongType {
                    class_name: object.class_name.clone(),
                    field: "sketchItems",
                    expected: "an array",
                })
            }
        };

        Ok(Self {
            id: object_id(object)?,
            name: opt_string(object, "name")?,
            creator: opt_value(object, "creator"),
            acl: object.acl().cloned().unwrap_or_default(),
            sketch_items,
        })
    }

    pub fn uses_gltf(&self, gltf_id: &str) -> bool {
        self.sketch_items
            .iter()
            .any(|item| item.gltf_id.as_deref() == Some(gltf_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub option_ids: Vec<String>,
}

impl Project {
    pub fn from_object(object: &ParseObject) -> Result<Self, DecodeError> {
        expect_class(object, PROJECT_CLASS)?;
        let option_ids = match object.get("optionIds") {
            Some(Value::Array(ids)) => ids.iter().filter_map(id_text).collect(),
            Some(Value::Null) | None => {
                return Err(DecodeError::Missing {
                    class_name: object.class_name.clone(),
                    field: "optionIds",
                })
            }
            Some(_) => {
                return Err(DecodeError::WrongType {
                    class_name: object.class_name.clone(),
                    field: "optionIds",
                    expected: "an array",
                })
            }
        };
        Ok(Self {
            id: object_id(object)?,
            option_ids,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOption {
    pub id: String,
    pub design_id: Option<String>,
    pub title: Option<String>,
    pub creator: Option<Value>,
    pub acl: Acl,
}

impl ProjectOption {
    pub fn from_object(object: &ParseObject) -> Result<Self, DecodeError> {
        expect_class(object, PROJECT_OPTION_CLASS)?;
        Ok(Self {
            id: object_id(object)?,
            design_id: object.get("designId").and_then(id_text),
            title: opt_string(object, "title")?,
            creator: opt_value(object, "creator"),
            acl: object.acl().cloned().unwrap_or_default(),
        })
    }
}

/// One row of a usage lookup: `{id, title, creator, public, role}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry {
    pub id: String,
    pub title: Option<String>,
    pub creator: Option<Value>,
    pub public: bool,
    pub role: bool,
}

impl UsageEntry {
    /// `role` is the read flag for the role named `role_name`.
    pub fn new(id: String, title: Option<String>, creator: Option<Value>, acl: &Acl, role_name: &str) -> Self {
        Self {
            id,
            title,
            creator,
            public: acl.public_read_access(),
            role: acl.role_read_access(role_name),
        }
    }
}
