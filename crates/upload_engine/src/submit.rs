use reqwest::header::{ACCEPT, HeaderValue};
use upload_logging::{upload_debug, upload_warn};

use crate::{
    EngineEvent, FailureKind, TransportFailure, UploadId, UploadRequest, UploadResponse,
    UploadSettings,
};

/// Status text reported when a delivered body is not the expected JSON.
const PARSE_ERROR_TEXT: &str = "parsererror";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        upload_id: UploadId,
        request: &UploadRequest,
    ) -> Result<UploadResponse, TransportFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    client: reqwest::Client,
}

impl ReqwestUploader {
    pub fn new(settings: &UploadSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload(
        &self,
        upload_id: UploadId,
        request: &UploadRequest,
    ) -> Result<UploadResponse, TransportFailure> {
        let endpoint = reqwest::Url::parse(&request.endpoint)
            .map_err(|err| TransportFailure::new(FailureKind::InvalidEndpoint, err.to_string()))?;

        upload_debug!(
            "upload_id={} POST {} locator_len={}",
            upload_id,
            endpoint,
            request.locator.len()
        );

        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"))
            .form(&request.form_fields())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default();
        if !status.is_success() {
            return Err(TransportFailure::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            )
            .with_status(status.as_u16(), reason));
        }

        let body = response.text().await.map_err(|err| {
            map_reqwest_error(err).with_status(status.as_u16(), reason)
        })?;
        serde_json::from_str::<UploadResponse>(&body).map_err(|err| {
            upload_warn!("upload_id={} unparseable reply: {}", upload_id, err);
            TransportFailure::new(FailureKind::MalformedBody, err.to_string())
                .with_status(status.as_u16(), PARSE_ERROR_TEXT)
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::new(FailureKind::Timeout, err.to_string());
    }
    TransportFailure::new(FailureKind::Network, err.to_string())
}
