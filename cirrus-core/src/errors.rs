//! # Errors (Parse-style)
//!
//! Cirrus reports failures the way the hosted object store does: a numeric
//! code plus a message. Core goals:
//! - codes line up with the platform's own error codes
//! - can be carried through anyhow::Error (for the function/trigger pipeline)
//! - transport-agnostic (the axum crate decides how to serialize)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

use crate::hooks::TriggerRejection;

/// A convenience result type for Cirrus core APIs.
pub type CloudResult<T> = std::result::Result<T, AnyError>;

/// Parse error codes used by cloud code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OtherCause,          // -1
    InternalServerError, // 1
    ConnectionFailed,    // 100
    ObjectNotFound,      // 101
    InvalidQuery,        // 102
    InvalidJson,         // 107
    CommandUnavailable,  // 108
    OperationForbidden,  // 119
    ScriptFailed,        // 141
    ValidationError,     // 142
    WebhookError,        // 143
}

impl ErrorKind {
    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::OtherCause => -1,
            ErrorKind::InternalServerError => 1,
            ErrorKind::ConnectionFailed => 100,
            ErrorKind::ObjectNotFound => 101,
            ErrorKind::InvalidQuery => 102,
            ErrorKind::InvalidJson => 107,
            ErrorKind::CommandUnavailable => 108,
            ErrorKind::OperationForbidden => 119,
            ErrorKind::ScriptFailed => 141,
            ErrorKind::ValidationError => 142,
            ErrorKind::WebhookError => 143,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let kind = match code {
            -1 => ErrorKind::OtherCause,
            1 => ErrorKind::InternalServerError,
            100 => ErrorKind::ConnectionFailed,
            101 => ErrorKind::ObjectNotFound,
            102 => ErrorKind::InvalidQuery,
            107 => ErrorKind::InvalidJson,
            108 => ErrorKind::CommandUnavailable,
            119 => ErrorKind::OperationForbidden,
            141 => ErrorKind::ScriptFailed,
            142 => ErrorKind::ValidationError,
            143 => ErrorKind::WebhookError,
            _ => return None,
        };
        Some(kind)
    }

    /// HTTP status used when the error leaves through a plain REST route.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidQuery
            | ErrorKind::InvalidJson
            | ErrorKind::ScriptFailed
            | ErrorKind::ValidationError => 400,
            ErrorKind::OperationForbidden => 403,
            ErrorKind::ObjectNotFound | ErrorKind::CommandUnavailable => 404,
            ErrorKind::ConnectionFailed | ErrorKind::WebhookError => 502,
            ErrorKind::OtherCause | ErrorKind::InternalServerError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::OtherCause => "OtherCause",
            ErrorKind::InternalServerError => "InternalServerError",
            ErrorKind::ConnectionFailed => "ConnectionFailed",
            ErrorKind::ObjectNotFound => "ObjectNotFound",
            ErrorKind::InvalidQuery => "InvalidQuery",
            ErrorKind::InvalidJson => "InvalidJson",
            ErrorKind::CommandUnavailable => "CommandUnavailable",
            ErrorKind::OperationForbidden => "OperationForbidden",
            ErrorKind::ScriptFailed => "ScriptFailed",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::WebhookError => "WebhookError",
        }
    }
}

/// A structured Cirrus error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct CloudError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub source: Option<AnyError>,
}

impl CloudError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `CloudError` anywhere in an `anyhow::Error` chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&CloudError> {
        err.chain().find_map(|e| e.downcast_ref::<CloudError>())
    }

    /// Turn any error into a CloudError:
    /// - a CloudError (or a TriggerRejection) keeps its kind
    /// - anything else becomes ScriptFailed
    pub fn normalize(err: AnyError) -> CloudError {
        let err = match err.downcast::<CloudError>() {
            Ok(cloud) => return cloud,
            Err(other) => other,
        };
        match err.downcast::<TriggerRejection>() {
            Ok(rejection) => CloudError::from(rejection),
            Err(other) => CloudError::new(ErrorKind::ScriptFailed, other.to_string()).with_source(other),
        }
    }

    /// Client-safe copy: drops the inner `source`.
    pub fn sanitize_for_client(&self) -> CloudError {
        CloudError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            source: None,
        }
    }

    /// Parse-style payload: `{ "code": 141, "error": "..." }`.
    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "code": self.code(),
            "error": self.message,
        });
        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        base
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, msg)
    }
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionFailed, msg)
    }
    pub fn object_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ObjectNotFound, msg)
    }
    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidJson, msg)
    }
    pub fn operation_forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationForbidden, msg)
    }
    pub fn script_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ScriptFailed, msg)
    }
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, msg)
    }
    pub fn webhook(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::WebhookError, msg)
    }
}

impl fmt::Display for CloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for CloudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<TriggerRejection> for CloudError {
    fn from(rejection: TriggerRejection) -> Self {
        match rejection {
            TriggerRejection::PolicyDenied(message) => CloudError::validation(message),
            TriggerRejection::DependencyFailure { message, source } => {
                CloudError::script_failed(message).with_source(source)
            }
        }
    }
}

/// Return early with a `CloudError`.
#[macro_export]
macro_rules! bail_cloud {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::CloudError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::CloudError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
