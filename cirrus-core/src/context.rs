//! Request context carried into every function and trigger.

/// Who is calling, as reported by the hosted platform.
///
/// This is passed into functions and hooks so that every piece of
/// extension logic sees the same caller information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// The call was made with the master key.
    pub master: bool,
    pub user_id: Option<String>,
    pub installation_id: Option<String>,
    pub request_id: Option<String>,
}

impl RequestContext {
    /// A master-key context with no user attached.
    pub fn master() -> Self {
        Self {
            master: true,
            ..Self::default()
        }
    }

    pub fn with_user<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_installation<S: Into<String>>(mut self, installation_id: S) -> Self {
        self.installation_id = Some(installation_id.into());
        self
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}
