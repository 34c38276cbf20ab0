use std::sync::Arc;

use cirrus_store::{Acl, ObjectStore, ParseObject, Pointer, Query, StoreError, ROLE_CLASS};
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::RoleNameMatch;
use crate::models::Role;

/// Relation on `_Role` holding its member users.
pub const ROLE_USERS: &str = "users";

/// Fetch-or-create access to roles and their `users` relation.
#[derive(Clone)]
pub struct RoleDirectory {
    store: Arc<dyn ObjectStore>,
    matching: RoleNameMatch,
}

impl RoleDirectory {
    pub fn new(store: Arc<dyn ObjectStore>, matching: RoleNameMatch) -> Self {
        Self { store, matching }
    }

    fn query(&self, role_name: &str) -> Query {
        let query = Query::new(ROLE_CLASS);
        match self.matching {
            RoleNameMatch::Contains => query.contains("name", role_name),
            RoleNameMatch::Exact => query.equal_to("name", json!(role_name)),
        }
    }

    /// Add `user` to every role matching `role_name`, creating the role
    /// when none matches. Saves for multiple matches run concurrently and
    /// all of them finish before the first failure is returned.
    pub async fn ensure_membership(&self, user: &Pointer, role_name: &str) -> Result<Vec<ParseObject>, StoreError> {
        let found = self.store.find_all(&self.query(role_name)).await?;

        if found.is_empty() {
            let mut role = new_role(role_name);
            role.add_relation(ROLE_USERS, user.clone());
            let saved = self.store.save(&role).await?;
            info!(role = role_name, user = %user.object_id, "created role");
            return Ok(vec![saved]);
        }

        let saves = found.into_iter().filter_map(|mut role| {
            match Role::from_object(&role) {
                Ok(decoded) => debug!(role = %decoded.name, user = %user.object_id, "adding user to role"),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable role");
                    return None;
                }
            }
            role.add_relation(ROLE_USERS, user.clone());
            Some(async move { self.store.save(&role).await })
        });
        join_all(saves).await.into_iter().collect()
    }
}

/// A new role readable by everyone and writable by no one but the master key.
fn new_role(name: &str) -> ParseObject {
    let mut acl = Acl::new();
    acl.set_public_read_access(true);
    acl.set_public_write_access(false);
    ParseObject::new(ROLE_CLASS).with("name", json!(name)).with_acl(acl)
}
