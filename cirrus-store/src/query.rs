use serde_json::{json, Map, Value};

use crate::object::ParseObject;

/// A single `where` condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    EqualTo(String, Value),
    /// Substring match on a string field.
    Contains(String, String),
    ContainedIn(String, Vec<Value>),
}

/// Query against one class.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub class_name: String,
    pub constraints: Vec<Constraint>,
    pub limit: Option<usize>,
    pub skip: usize,
    pub order: Option<String>,
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Vec::new(),
            limit: None,
            skip: 0,
            order: None,
        }
    }

    pub fn equal_to(mut self, key: &str, value: Value) -> Self {
        self.constraints.push(Constraint::EqualTo(key.to_string(), value));
        self
    }

    pub fn contains(mut self, key: &str, substring: &str) -> Self {
        self.constraints
            .push(Constraint::Contains(key.to_string(), substring.to_string()));
        self
    }

    pub fn contained_in(mut self, key: &str, values: Vec<Value>) -> Self {
        self.constraints.push(Constraint::ContainedIn(key.to_string(), values));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn order(mut self, key: &str) -> Self {
        self.order = Some(key.to_string());
        self
    }

    /// The REST `where` parameter.
    pub fn where_json(&self) -> Value {
        let mut out = Map::new();
        for c in &self.constraints {
            match c {
                Constraint::EqualTo(key, value) => {
                    out.insert(key.clone(), value.clone());
                }
                Constraint::Contains(key, substring) => {
                    out.insert(key.clone(), json!({ "$regex": quote(substring) }));
                }
                Constraint::ContainedIn(key, values) => {
                    out.insert(key.clone(), json!({ "$in": values }));
                }
            }
        }
        Value::Object(out)
    }

    /// Evaluate the constraints locally.
    pub fn matches(&self, object: &ParseObject) -> bool {
        if object.class_name != self.class_name {
            return false;
        }
        self.constraints.iter().all(|c| match c {
            Constraint::EqualTo(key, value) => field(object, key).as_ref() == Some(value),
            Constraint::Contains(key, substring) => field(object, key)
                .as_ref()
                .and_then(Value::as_str)
                .map(|s| s.contains(substring.as_str()))
                .unwrap_or(false),
            Constraint::ContainedIn(key, values) => field(object, key)
                .map(|v| values.contains(&v))
                .unwrap_or(false),
        })
    }
}

fn field(object: &ParseObject, key: &str) -> Option<Value> {
    match key {
        "objectId" => object.object_id.clone().map(Value::String),
        _ => object.get(key).cloned(),
    }
}

/// Literal regex for a substring, `\Q...\E` quoted.
fn quote(s: &str) -> String {
    format!("\\Q{}\\E", s.replace("\\E", "\\E\\\\E\\Q"))
}
