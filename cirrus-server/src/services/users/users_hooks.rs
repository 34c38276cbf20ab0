use std::sync::Arc;

use async_trait::async_trait;
use cirrus_core::{AfterSaveHook, BeforeSaveHook, TriggerContext, TriggerRejection, TriggerResult};
use cirrus_store::{ObjectStore, ParseObject};
use tracing::{error, info, warn};

use super::roles::RoleDirectory;
use crate::config::OrgConfig;
use crate::models::User;

pub const SIGNUP_DENIED: &str = "You aren't authorised to sign up";
pub const GUEST_DENIED: &str = "You are not authorised guest";

/// Generic role every organisation user belongs to.
pub const MEMBER_ROLE: &str = "Member";

/// Only non-guest accounts whose email equals their username may sign up.
pub struct SignupPolicyGate;

#[async_trait]
impl BeforeSaveHook<ParseObject> for SignupPolicyGate {
    async fn run(&self, ctx: &mut TriggerContext<ParseObject>) -> TriggerResult {
        let user = User::from_object(&ctx.object).map_err(|e| {
            warn!(error = %e, "beforeSave: unreadable user");
            TriggerRejection::policy_denied(SIGNUP_DENIED)
        })?;

        if user.anonymous {
            info!("beforeSave: guest");
            return Err(TriggerRejection::policy_denied(SIGNUP_DENIED));
        }
        if user.email != user.username {
            info!("beforeSave: user/email mismatch");
            return Err(TriggerRejection::policy_denied(SIGNUP_DENIED));
        }

        info!("beforeSave: accepted");
        Ok(())
    }
}

/// Puts organisation users into the organisation role and `Member`.
pub struct RoleReconciliation {
    config: Arc<OrgConfig>,
    roles: RoleDirectory,
}

impl RoleReconciliation {
    pub fn new(config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Self {
        let roles = RoleDirectory::new(store, config.role_name_match);
        Self { config, roles }
    }
}

#[async_trait]
impl AfterSaveHook<ParseObject> for RoleReconciliation {
    async fn run(&self, ctx: &TriggerContext<ParseObject>) -> TriggerResult {
        let user = User::from_object(&ctx.object).map_err(|e| {
            error!(error = %e, "afterSave: unreadable user");
            TriggerRejection::dependency("Failed to read user", e.into())
        })?;

        if user.anonymous {
            info!("afterSave: guest");
            return Err(TriggerRejection::policy_denied(GUEST_DENIED));
        }

        let Some(email) = user.email.as_deref().filter(|e| self.config.is_member_email(e)) else {
            info!("afterSave: other");
            return Ok(());
        };
        let Some(pointer) = user.pointer() else {
            error!(email, "afterSave: saved user has no objectId");
            return Err(TriggerRejection::dependency(
                "Failed to update roles",
                anyhow::anyhow!("user has no objectId"),
            ));
        };

        let org_role = self.config.organisation_id.as_str();
        // Both memberships run to completion; one failing leaves the other in place.
        let (org, member) = futures::join!(
            self.roles.ensure_membership(&pointer, org_role),
            self.roles.ensure_membership(&pointer, MEMBER_ROLE),
        );
        for (role, result) in [(org_role, &org), (MEMBER_ROLE, &member)] {
            if let Err(e) = result {
                error!(email, role, error = %e, "afterSave: role update failed");
            }
        }
        org.and(member)
            .map_err(|e| TriggerRejection::dependency("Failed to update roles", e.into()))?;

        info!(email, roles = ?[org_role, MEMBER_ROLE], "afterSave: reconciled");
        Ok(())
    }
}
