use cirrus_core::{CloudError, ErrorKind};

/// Failures talking to the object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("object store error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("object not found: {class_name}/{object_id}")]
    NotFound {
        class_name: String,
        object_id: String,
    },

    #[error("invalid object: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn decode(msg: impl Into<String>) -> Self {
        StoreError::Decode(msg.into())
    }

    /// Parse error code for this failure.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transport(_) => ErrorKind::ConnectionFailed,
            StoreError::Server { code, .. } => ErrorKind::from_code(*code).unwrap_or(ErrorKind::OtherCause),
            StoreError::NotFound { .. } => ErrorKind::ObjectNotFound,
            StoreError::Decode(_) => ErrorKind::InvalidJson,
        }
    }

    pub fn into_cloud_error(self) -> CloudError {
        let kind = self.kind();
        let message = self.to_string();
        CloudError::new(kind, message).with_source(anyhow::Error::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_codes_map_to_known_kinds() {
        let err = StoreError::Server { code: 143, message: "exists".into() };
        assert_eq!(err.kind(), ErrorKind::WebhookError);

        let err = StoreError::Server { code: 777, message: "?".into() };
        assert_eq!(err.kind(), ErrorKind::OtherCause);
    }

    #[test]
    fn not_found_becomes_object_not_found() {
        let err = StoreError::NotFound {
            class_name: "Design".into(),
            object_id: "abc".into(),
        };
        let cloud = err.into_cloud_error();
        assert_eq!(cloud.code(), 101);
        assert_eq!(cloud.message, "object not found: Design/abc");
    }
}
