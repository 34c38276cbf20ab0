//! Cloud code for one Cirrus organisation.
//!
//! Serves the hosted platform's function and trigger webhooks:
//! `getToken`, `gltfUsageById`, `designUsageById`, and the `_User`
//! before/after save hooks that gate signups and assign roles.

mod app;
pub mod config;
pub mod manifest;
pub mod models;
pub mod register;
pub mod services;

use std::sync::Arc;

use anyhow::Result;
use cirrus_axum::AxumApp;
use cirrus_store::{ObjectStore, ParseObject};

pub use config::{OrgConfig, RoleNameMatch};

pub fn build(config: Arc<OrgConfig>, store: Arc<dyn ObjectStore>) -> Result<AxumApp<ParseObject>> {
    app::cloud_app(config, store)
}
