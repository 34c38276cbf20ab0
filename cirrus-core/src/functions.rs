use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;

/// A named, remotely invocable cloud function.
///
/// Functions receive the raw parameter map sent by the caller and return
/// any JSON value. Parameter decoding is up to the function.
#[async_trait]
pub trait CloudFunction: Send + Sync {
    async fn call(&self, ctx: &RequestContext, params: Value) -> Result<Value>;
}

/// Maps function names to their implementations.
///
/// Names are case-sensitive, matching how the hosted platform
/// dispatches `/functions/{name}`.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn CloudFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name.
    pub fn define<S>(&mut self, name: S, function: Arc<dyn CloudFunction>)
    where
        S: Into<String>,
    {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CloudFunction>> {
        self.functions.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}
