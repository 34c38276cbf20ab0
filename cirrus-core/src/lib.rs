//! cirrus-core: transport-agnostic core for Cirrus cloud code.
//!
//! Cloud functions and save triggers are registered on a [`CloudApp`];
//! transports (see `cirrus-axum`) decode requests and call into it.

pub mod app;
pub mod context;
pub mod errors;
pub mod functions;
pub mod hooks;

pub use app::{ClassHandle, CloudApp};
pub use context::RequestContext;
pub use errors::{CloudError, CloudResult, ErrorKind};
pub use functions::{CloudFunction, FunctionRegistry};
pub use hooks::{
    AfterSaveHook, BeforeSaveHook, ClassHooks, TriggerContext, TriggerKind, TriggerRejection,
    TriggerResult,
};
