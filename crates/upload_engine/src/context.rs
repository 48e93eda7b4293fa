use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("upload endpoint is not configured")]
    MissingEndpoint,
    #[error("upload endpoint {endpoint:?} is not an absolute url: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// Per-submission values supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitContext {
    pub endpoint: String,
    pub csrf_token: String,
    pub collection: Option<String>,
}

impl SubmitContext {
    pub fn new(endpoint: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            csrf_token: csrf_token.into(),
            collection: None,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Rejects a missing or unusable endpoint before anything is dispatched.
    pub fn validate(&self) -> Result<(), ContextError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ContextError::MissingEndpoint);
        }
        Url::parse(endpoint).map_err(|err| ContextError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        Ok(())
    }

    /// Collection to attach, if one is selected.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub user_agent: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("url-upload/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_endpoint_is_missing() {
        assert_eq!(
            SubmitContext::new("  ", "tok").validate(),
            Err(ContextError::MissingEndpoint)
        );
    }

    #[test]
    fn relative_endpoint_is_invalid() {
        let err = SubmitContext::new("/admin/upload/", "tok")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ContextError::InvalidEndpoint { .. }));
    }

    #[test]
    fn absolute_endpoint_is_accepted() {
        assert!(SubmitContext::new("http://localhost:8000/upload/", "tok")
            .validate()
            .is_ok());
    }

    #[test]
    fn empty_collection_counts_as_absent() {
        let context = SubmitContext::new("http://h/", "tok").with_collection("");
        assert_eq!(context.collection(), None);
        let context = SubmitContext::new("http://h/", "tok").with_collection("2");
        assert_eq!(context.collection(), Some("2"));
    }
}
