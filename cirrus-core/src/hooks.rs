use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;

/// Persistence events a class can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerKind {
    BeforeSave,
    AfterSave,
}

impl TriggerKind {
    /// Name used by the hosted platform (`beforeSave`, `afterSave`).
    pub fn name(&self) -> &'static str {
        match self {
            TriggerKind::BeforeSave => "beforeSave",
            TriggerKind::AfterSave => "afterSave",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "beforeSave" => Some(TriggerKind::BeforeSave),
            "afterSave" => Some(TriggerKind::AfterSave),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a trigger refused to let an operation through.
///
/// Policy denials are intended outcomes; dependency failures mean the
/// hook could not do its job because the store or another upstream broke.
#[derive(Debug, thiserror::Error)]
pub enum TriggerRejection {
    #[error("{0}")]
    PolicyDenied(String),

    #[error("{message}")]
    DependencyFailure {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TriggerRejection {
    pub fn policy_denied(message: impl Into<String>) -> Self {
        TriggerRejection::PolicyDenied(message.into())
    }

    pub fn dependency(message: impl Into<String>, source: anyhow::Error) -> Self {
        TriggerRejection::DependencyFailure {
            message: message.into(),
            source,
        }
    }

    pub fn is_policy_denied(&self) -> bool {
        matches!(self, TriggerRejection::PolicyDenied(_))
    }
}

pub type TriggerResult<T = ()> = std::result::Result<T, TriggerRejection>;

/// Context passed to save hooks.
///
/// R = record type
#[derive(Debug)]
pub struct TriggerContext<R> {
    pub request: RequestContext,
    pub class_name: String,
    pub trigger: TriggerKind,
    /// Candidate object (before save) or committed object (after save).
    pub object: R,
    /// Stored state prior to this save; `None` on creation.
    pub original: Option<R>,
}

impl<R> TriggerContext<R> {
    pub fn new(
        request: RequestContext,
        class_name: impl Into<String>,
        trigger: TriggerKind,
        object: R,
        original: Option<R>,
    ) -> Self {
        Self {
            request,
            class_name: class_name.into(),
            trigger,
            object,
            original,
        }
    }

    pub fn is_create(&self) -> bool {
        self.original.is_none()
    }
}

/// Runs before an object is committed. May modify `ctx.object`.
#[async_trait]
pub trait BeforeSaveHook<R>: Send + Sync {
    async fn run(&self, ctx: &mut TriggerContext<R>) -> TriggerResult;
}

/// Runs after an object is committed.
#[async_trait]
pub trait AfterSaveHook<R>: Send + Sync {
    async fn run(&self, ctx: &TriggerContext<R>) -> TriggerResult;
}

/// Hooks attached to one class, in registration order.
pub struct ClassHooks<R> {
    pub(crate) before_save: Vec<Arc<dyn BeforeSaveHook<R>>>,
    pub(crate) after_save: Vec<Arc<dyn AfterSaveHook<R>>>,
}

impl<R> Default for ClassHooks<R> {
    fn default() -> Self {
        Self {
            before_save: Vec::new(),
            after_save: Vec::new(),
        }
    }
}

impl<R> ClassHooks<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_save(&mut self, hook: Arc<dyn BeforeSaveHook<R>>) -> &mut Self {
        self.before_save.push(hook);
        self
    }

    pub fn after_save(&mut self, hook: Arc<dyn AfterSaveHook<R>>) -> &mut Self {
        self.after_save.push(hook);
        self
    }

    /// Triggers that have at least one hook.
    pub fn registered(&self) -> Vec<TriggerKind> {
        let mut out = Vec::new();
        if !self.before_save.is_empty() {
            out.push(TriggerKind::BeforeSave);
        }
        if !self.after_save.is_empty() {
            out.push(TriggerKind::AfterSave);
        }
        out
    }
}
