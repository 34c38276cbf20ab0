use anyhow::Result;
use cirrus_core::CloudApp;
use cirrus_store::{ParseObject, RestStore};
use tracing::info;

use crate::config::OrgConfig;

/// One webhook the hosted platform should call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Function { name: String, url: String },
    Trigger { class_name: String, trigger: String, url: String },
}

/// Every function and trigger on `app`, pointed at this server.
pub fn registrations(config: &OrgConfig, app: &CloudApp<ParseObject>) -> Vec<Registration> {
    let base = format!(
        "{}{}/webhooks",
        config.webhook_base_url.trim_end_matches('/'),
        config.route_prefix()
    );

    let functions = app.function_names().into_iter().map(|name| Registration::Function {
        url: format!("{base}/functions/{name}"),
        name,
    });
    let triggers = app.triggers().into_iter().map(|(class_name, kind)| Registration::Trigger {
        url: format!("{base}/triggers/{class_name}/{kind}"),
        trigger: kind.name().to_string(),
        class_name,
    });
    functions.chain(triggers).collect()
}

pub async fn register_webhooks(config: &OrgConfig, app: &CloudApp<ParseObject>, store: &RestStore) -> Result<usize> {
    let all = registrations(config, app);
    for registration in &all {
        match registration {
            Registration::Function { name, url } => {
                store.register_function(name, url).await?;
            }
            Registration::Trigger { class_name, trigger, url } => {
                store.register_trigger(class_name, trigger, url).await?;
            }
        }
    }
    info!(count = all.len(), server = store.server_url(), "webhooks registered");
    Ok(all.len())
}
