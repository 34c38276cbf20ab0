use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bail_cloud;
use crate::context::RequestContext;
use crate::functions::{CloudFunction, FunctionRegistry};
use crate::hooks::{
    AfterSaveHook, BeforeSaveHook, ClassHooks, TriggerContext, TriggerKind, TriggerResult,
};

struct CloudAppInner<R> {
    functions: RwLock<FunctionRegistry>,
    class_hooks: RwLock<BTreeMap<String, ClassHooks<R>>>,
}

/// CloudApp is the central container for Cirrus cloud code.
///
/// Transport-agnostic. Holds:
/// - cloud functions by name
/// - save hooks by class name
pub struct CloudApp<R> {
    inner: Arc<CloudAppInner<R>>,
}

impl<R> Clone for CloudApp<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Default for CloudApp<R>
where
    R: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> CloudApp<R>
where
    R: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CloudAppInner {
                functions: RwLock::new(FunctionRegistry::new()),
                class_hooks: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Parse: `Parse.Cloud.define(name, fn)`
    pub fn define<S>(&self, name: S, function: Arc<dyn CloudFunction>)
    where
        S: Into<String>,
    {
        self.inner.functions.write().define(name, function);
    }

    /// Hooks for one class: `app.class("_User").hooks(|h| { ... })`
    pub fn class(&self, class_name: &str) -> ClassHandle<R> {
        ClassHandle {
            app: self.clone(),
            class_name: class_name.to_string(),
        }
    }

    pub fn function_names(&self) -> Vec<String> {
        self.inner.functions.read().names()
    }

    /// Every (class, trigger) pair with at least one hook.
    pub fn triggers(&self) -> Vec<(String, TriggerKind)> {
        self.inner
            .class_hooks
            .read()
            .iter()
            .flat_map(|(class, hooks)| {
                hooks
                    .registered()
                    .into_iter()
                    .map(move |kind| (class.clone(), kind))
            })
            .collect()
    }

    pub fn has_trigger(&self, class_name: &str, kind: TriggerKind) -> bool {
        self.inner
            .class_hooks
            .read()
            .get(class_name)
            .map(|h| h.registered().contains(&kind))
            .unwrap_or(false)
    }

    pub async fn run_function(&self, ctx: &RequestContext, name: &str, params: Value) -> Result<Value> {
        let function = self.inner.functions.read().get(name).cloned();
        let Some(function) = function else {
            bail_cloud!(script_failed, "Invalid function: \"{}\"", name);
        };

        debug!(function = name, master = ctx.master, "cloud function");
        function.call(ctx, params).await
    }

    /// Runs the class's before-save hooks in order and returns the object to commit.
    ///
    /// The first rejection stops the chain.
    pub async fn run_before_save(
        &self,
        request: RequestContext,
        class_name: &str,
        object: R,
        original: Option<R>,
    ) -> TriggerResult<R> {
        let hooks: Vec<Arc<dyn BeforeSaveHook<R>>> = self
            .inner
            .class_hooks
            .read()
            .get(class_name)
            .map(|h| h.before_save.clone())
            .unwrap_or_default();

        let mut ctx = TriggerContext::new(request, class_name, TriggerKind::BeforeSave, object, original);
        for hook in &hooks {
            if let Err(rejection) = hook.run(&mut ctx).await {
                warn!(class = class_name, trigger = "beforeSave", error = %rejection, "trigger rejected");
                return Err(rejection);
            }
        }
        Ok(ctx.object)
    }

    /// Runs the class's after-save hooks in order.
    pub async fn run_after_save(
        &self,
        request: RequestContext,
        class_name: &str,
        object: R,
        original: Option<R>,
    ) -> TriggerResult {
        let hooks: Vec<Arc<dyn AfterSaveHook<R>>> = self
            .inner
            .class_hooks
            .read()
            .get(class_name)
            .map(|h| h.after_save.clone())
            .unwrap_or_default();

        let ctx = TriggerContext::new(request, class_name, TriggerKind::AfterSave, object, original);
        for hook in &hooks {
            if let Err(rejection) = hook.run(&ctx).await {
                warn!(class = class_name, trigger = "afterSave", error = %rejection, "trigger rejected");
                return Err(rejection);
            }
        }
        Ok(())
    }

    fn configure_class_hooks<F>(&self, class_name: &str, f: F)
    where
        F: FnOnce(&mut ClassHooks<R>),
    {
        let mut map = self.inner.class_hooks.write();
        let hooks = map.entry(class_name.to_string()).or_default();
        f(hooks);
    }
}

pub struct ClassHandle<R> {
    app: CloudApp<R>,
    class_name: String,
}

impl<R> ClassHandle<R>
where
    R: Send + Sync + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ClassHooks<R>),
    {
        self.app.configure_class_hooks(&self.class_name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.class_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CloudError, ErrorKind};
    use crate::hooks::TriggerRejection;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl CloudFunction for Echo {
        async fn call(&self, _ctx: &RequestContext, params: Value) -> Result<Value> {
            Ok(params)
        }
    }

    struct Append(&'static str, Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl BeforeSaveHook<Vec<&'static str>> for Append {
        async fn run(&self, ctx: &mut TriggerContext<Vec<&'static str>>) -> TriggerResult {
            self.1.lock().push(self.0);
            ctx.object.push(self.0);
            Ok(())
        }
    }

    struct Deny;

    #[async_trait]
    impl BeforeSaveHook<Vec<&'static str>> for Deny {
        async fn run(&self, _ctx: &mut TriggerContext<Vec<&'static str>>) -> TriggerResult {
            Err(TriggerRejection::policy_denied("denied"))
        }
    }

    struct Record(Arc<Mutex<Vec<&'static str>>>);

    #[async_trait]
    impl AfterSaveHook<Vec<&'static str>> for Record {
        async fn run(&self, ctx: &TriggerContext<Vec<&'static str>>) -> TriggerResult {
            self.0.lock().extend(ctx.object.iter().copied());
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_function_dispatches_by_name() {
        let app: CloudApp<Value> = CloudApp::new();
        app.define("echo", Arc::new(Echo));

        let out = app
            .run_function(&RequestContext::master(), "echo", json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1}));
        assert_eq!(app.function_names(), vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn unknown_function_is_script_failed() {
        let app: CloudApp<Value> = CloudApp::new();
        let err = app
            .run_function(&RequestContext::default(), "missing", Value::Null)
            .await
            .unwrap_err();
        let cloud = CloudError::from_anyhow(&err).unwrap();
        assert_eq!(cloud.kind, ErrorKind::ScriptFailed);
        assert!(cloud.message.contains("missing"));
    }

    #[tokio::test]
    async fn before_save_hooks_run_in_order_and_can_modify_object() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let app: CloudApp<Vec<&'static str>> = CloudApp::new();
        app.class("Thing").hooks(|h| {
            h.before_save(Arc::new(Append("first", Arc::clone(&calls))))
                .before_save(Arc::new(Append("second", Arc::clone(&calls))));
        });

        let saved = app
            .run_before_save(RequestContext::master(), "Thing", vec![], None)
            .await
            .unwrap();
        assert_eq!(saved, vec!["first", "second"]);
        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn rejection_stops_the_before_save_chain() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let app: CloudApp<Vec<&'static str>> = CloudApp::new();
        app.class("Thing").hooks(|h| {
            h.before_save(Arc::new(Deny))
                .before_save(Arc::new(Append("never", Arc::clone(&calls))));
        });

        let err = app
            .run_before_save(RequestContext::master(), "Thing", vec![], None)
            .await
            .unwrap_err();
        assert!(err.is_policy_denied());
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn classes_without_hooks_pass_through() {
        let app: CloudApp<Vec<&'static str>> = CloudApp::new();
        let saved = app
            .run_before_save(RequestContext::master(), "Other", vec!["x"], None)
            .await
            .unwrap();
        assert_eq!(saved, vec!["x"]);
        assert!(app
            .run_after_save(RequestContext::master(), "Other", vec!["x"], None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn triggers_lists_registered_pairs() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app: CloudApp<Vec<&'static str>> = CloudApp::new();
        app.class("_User").hooks(|h| {
            h.after_save(Arc::new(Record(Arc::clone(&seen))));
        });

        assert_eq!(app.triggers(), vec![("_User".to_string(), TriggerKind::AfterSave)]);
        assert!(app.has_trigger("_User", TriggerKind::AfterSave));
        assert!(!app.has_trigger("_User", TriggerKind::BeforeSave));

        app.run_after_save(RequestContext::master(), "_User", vec!["u1"], None)
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec!["u1"]);
    }
}
