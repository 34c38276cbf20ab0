//! Where-used lookups over designs and project options.

pub mod design_usage;
pub mod gltf_usage;

pub use design_usage::DesignUsageById;
pub use gltf_usage::GltfUsageById;

use cirrus_core::CloudError;
use cirrus_store::StoreError;
use serde_json::Value;
use tracing::error;

/// The `id` parameter as text; absent or non-scalar ids read as `None`.
pub(crate) fn param_id(params: &Value) -> Option<String> {
    match params.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn store_failure(function: &str, err: StoreError) -> anyhow::Error {
    error!(function, error = %err, "object store request failed");
    CloudError::script_failed(format!("{function} failed"))
        .with_source(err.into())
        .into_anyhow()
}
