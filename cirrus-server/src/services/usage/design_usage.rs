use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use cirrus_core::{CloudFunction, RequestContext};
use cirrus_store::{ObjectStore, Query, StoreError};
use serde_json::Value;
use tracing::{debug, warn};

use super::{param_id, store_failure};
use crate::config::OrgConfig;
use crate::models::{Project, ProjectOption, UsageEntry, PROJECT_CLASS, PROJECT_OPTION_CLASS};

pub const DESIGN_USAGE: &str = "designUsageById";

/// Project options built from the design `params.id`.
pub struct DesignUsageById {
    config: Arc<OrgConfig>,
    store: Arc<dyn ObjectStore>,
}

impl DesignUsageById {
    pub fn new(config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Self {
        Self { config, store }
    }

    /// Distinct option ids referenced by any project.
    async fn referenced_options(&self) -> Result<BTreeSet<String>, StoreError> {
        let projects = self.store.find_all(&Query::new(PROJECT_CLASS)).await?;
        let mut ids = BTreeSet::new();
        for object in &projects {
            match Project::from_object(object) {
                Ok(project) => ids.extend(project.option_ids),
                Err(e) => warn!(id = ?object.object_id, error = %e, "skipping project"),
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl CloudFunction for DesignUsageById {
    async fn call(&self, _ctx: &RequestContext, params: Value) -> anyhow::Result<Value> {
        let design_id = param_id(&params);
        let option_ids = self
            .referenced_options()
            .await
            .map_err(|e| store_failure(DESIGN_USAGE, e))?;

        let mut used_in = Vec::new();
        for option_id in &option_ids {
            // A project pointing at a deleted option fails the whole lookup.
            let object = self
                .store
                .get(PROJECT_OPTION_CLASS, option_id)
                .await
                .map_err(|e| store_failure(DESIGN_USAGE, e))?;
            let option = match ProjectOption::from_object(&object) {
                Ok(option) => option,
                Err(e) => {
                    warn!(option = %option_id, error = %e, "skipping project option");
                    continue;
                }
            };
            if option.design_id == design_id {
                used_in.push(UsageEntry::new(
                    option.id,
                    option.title,
                    option.creator,
                    &option.acl,
                    &self.config.organisation_id,
                ));
            }
        }

        debug!(id = ?design_id, options = option_ids.len(), found = used_in.len(), "design usage");
        Ok(serde_json::to_value(used_in)?)
    }
}
