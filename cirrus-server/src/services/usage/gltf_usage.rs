use std::sync::Arc;

use async_trait::async_trait;
use cirrus_core::{CloudFunction, RequestContext};
use cirrus_store::{ObjectStore, Query};
use serde_json::Value;
use tracing::{debug, warn};

use super::{param_id, store_failure};
use crate::config::OrgConfig;
use crate::models::{Design, UsageEntry, DESIGN_CLASS};

pub const GLTF_USAGE: &str = "gltfUsageById";

/// Designs whose sketch items reference the model `params.id`.
pub struct GltfUsageById {
    config: Arc<OrgConfig>,
    store: Arc<dyn ObjectStore>,
}

impl GltfUsageById {
    pub fn new(config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Self {
        Self { config, store }
    }
}

#[async_trait]
impl CloudFunction for GltfUsageById {
    async fn call(&self, _ctx: &RequestContext, params: Value) -> anyhow::Result<Value> {
        let gltf_id = param_id(&params);
        let designs = self
            .store
            .find_all(&Query::new(DESIGN_CLASS))
            .await
            .map_err(|e| store_failure(GLTF_USAGE, e))?;

        let mut used_in = Vec::new();
        for object in &designs {
            let design = match Design::from_object(object) {
                Ok(design) => design,
                Err(e) => {
                    warn!(id = ?object.object_id, error = %e, "skipping design");
                    continue;
                }
            };
            let Some(gltf_id) = gltf_id.as_deref() else { continue };
            if design.uses_gltf(gltf_id) {
                used_in.push(UsageEntry::new(
                    design.id,
                    design.name,
                    design.creator,
                    &design.acl,
                    &self.config.organisation_id,
                ));
            }
        }

        debug!(id = ?gltf_id, scanned = designs.len(), found = used_in.len(), "gltf usage");
        Ok(serde_json::to_value(used_in)?)
    }
}
