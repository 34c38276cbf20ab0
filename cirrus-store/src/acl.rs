//! Per-object access control, in the platform's JSON form:
//!
//! ```json
//! { "*": { "read": true }, "role:Member": { "read": true, "write": true } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const PUBLIC_KEY: &str = "*";
const ROLE_PREFIX: &str = "role:";

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub write: bool,
}

impl Permission {
    fn is_empty(&self) -> bool {
        !self.read && !self.write
    }
}

/// Access control list keyed by `*`, user id, or `role:<name>`.
///
/// Clearing the last flag of an entry removes the entry, so an ACL with
/// public write denied serializes without a `write` key at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl {
    entries: BTreeMap<String, Permission>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_access(&self, key: &str) -> bool {
        self.entries.get(key).map(|p| p.read).unwrap_or(false)
    }

    pub fn write_access(&self, key: &str) -> bool {
        self.entries.get(key).map(|p| p.write).unwrap_or(false)
    }

    pub fn set_read_access(&mut self, key: &str, allowed: bool) {
        self.update(key, |p| p.read = allowed);
    }

    pub fn set_write_access(&mut self, key: &str, allowed: bool) {
        self.update(key, |p| p.write = allowed);
    }

    pub fn public_read_access(&self) -> bool {
        self.read_access(PUBLIC_KEY)
    }

    pub fn public_write_access(&self) -> bool {
        self.write_access(PUBLIC_KEY)
    }

    pub fn set_public_read_access(&mut self, allowed: bool) {
        self.set_read_access(PUBLIC_KEY, allowed);
    }

    pub fn set_public_write_access(&mut self, allowed: bool) {
        self.set_write_access(PUBLIC_KEY, allowed);
    }

    pub fn role_read_access(&self, role: &str) -> bool {
        self.read_access(&role_key(role))
    }

    pub fn role_write_access(&self, role: &str) -> bool {
        self.write_access(&role_key(role))
    }

    pub fn set_role_read_access(&mut self, role: &str, allowed: bool) {
        self.set_read_access(&role_key(role), allowed);
    }

    pub fn set_role_write_access(&mut self, role: &str, allowed: bool) {
        self.set_write_access(&role_key(role), allowed);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn update<F>(&mut self, key: &str, f: F)
    where
        F: FnOnce(&mut Permission),
    {
        let mut permission = self.entries.get(key).copied().unwrap_or_default();
        f(&mut permission);
        if permission.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), permission);
        }
    }
}

fn role_key(role: &str) -> String {
    format!("{ROLE_PREFIX}{role}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn public_read_without_public_write_serializes_minimally() {
        let mut acl = Acl::new();
        acl.set_public_read_access(true);
        acl.set_public_write_access(false);

        assert!(acl.public_read_access());
        assert!(!acl.public_write_access());
        assert_eq!(serde_json::to_value(&acl).unwrap(), json!({"*": {"read": true}}));
    }

    #[test]
    fn role_flags_use_role_prefix() {
        let acl: Acl = serde_json::from_value(json!({
            "role:acme": {"read": true},
            "user123": {"read": true, "write": true}
        }))
        .unwrap();

        assert!(acl.role_read_access("acme"));
        assert!(!acl.role_write_access("acme"));
        assert!(!acl.role_read_access("user123"));
        assert!(acl.write_access("user123"));
        assert!(!acl.public_read_access());
    }

    #[test]
    fn clearing_last_flag_drops_entry() {
        let mut acl = Acl::new();
        acl.set_role_read_access("Member", true);
        acl.set_role_read_access("Member", false);
        assert!(acl.is_empty());
    }
}
