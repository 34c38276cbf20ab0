use std::sync::Arc;

use anyhow::Result;
use cirrus_core::CloudApp;
use cirrus_store::{ObjectStore, ParseObject};

use crate::config::OrgConfig;

pub mod token;
pub mod usage;
pub mod users;

/// Register every cloud function and user hook on `app`.
pub fn configure(app: &CloudApp<ParseObject>, config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Result<()> {
    app.define(token::GET_TOKEN, Arc::new(token::GetToken::new(config.portal.clone())));
    app.define(
        usage::gltf_usage::GLTF_USAGE,
        Arc::new(usage::GltfUsageById::new(Arc::clone(&config), Arc::clone(&store))),
    );
    app.define(
        usage::design_usage::DESIGN_USAGE,
        Arc::new(usage::DesignUsageById::new(Arc::clone(&config), Arc::clone(&store))),
    );

    users::users_shared::register_hooks(app, config, store);
    Ok(())
}
