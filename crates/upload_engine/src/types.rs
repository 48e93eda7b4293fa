use std::fmt;

use serde::Deserialize;

pub type UploadId = u64;

/// One POST to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub endpoint: String,
    pub locator: String,
    pub csrf_token: String,
    pub collection: Option<String>,
}

impl UploadRequest {
    /// Form fields in wire order; `collection` only when set and non-empty.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("url", self.locator.as_str()),
            ("csrfmiddlewaretoken", self.csrf_token.as_str()),
        ];
        if let Some(collection) = self.collection.as_deref().filter(|c| !c.is_empty()) {
            fields.push(("collection", collection));
        }
        fields
    }
}

/// JSON body returned by the endpoint for a delivered request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default)]
    pub confirm_duplicate_upload: String,
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadCompleted {
        upload_id: UploadId,
        result: Result<UploadResponse, TransportFailure>,
    },
}

/// Request could not be completed, or its reply was unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub message: String,
}

impl TransportFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            status_text: None,
            message: message.into(),
        }
    }

    pub(crate) fn with_status(mut self, status: u16, status_text: impl Into<String>) -> Self {
        self.status = Some(status);
        self.status_text = Some(status_text.into());
        self
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    HttpStatus(u16),
    Timeout,
    MalformedBody,
    Network,
    EngineStopped,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::MalformedBody => write!(f, "malformed response body"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::EngineStopped => write!(f, "engine stopped"),
        }
    }
}
