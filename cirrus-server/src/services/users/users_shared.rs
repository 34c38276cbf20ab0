use std::sync::Arc;

use cirrus_core::CloudApp;
use cirrus_store::{ObjectStore, ParseObject, USER_CLASS};

use super::users_hooks::{RoleReconciliation, SignupPolicyGate};
use crate::config::OrgConfig;

pub fn register_hooks(app: &CloudApp<ParseObject>, config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) {
    app.class(USER_CLASS).hooks(|h| {
        h.before_save(Arc::new(SignupPolicyGate));
        h.after_save(Arc::new(RoleReconciliation::new(config, store)));
    });
}
