use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use upload_core::{Effect, Msg, ServerReply, ServerResponse};
use upload_engine::{EngineEvent, EngineHandle, SubmitContext, UploadRequest, UploadResponse};
use upload_logging::{upload_debug, upload_error, upload_info, upload_warn};

use crate::{HandlerRegistry, SessionObserver};

/// Status text for uploads that reached the runner without a submit context.
const NO_CONTEXT_TEXT: &str = "missing submit context";

pub(crate) struct EffectRunner {
    engine: EngineHandle,
    observer: Arc<dyn SessionObserver>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, observer: Arc<dyn SessionObserver>) -> Self {
        Self { engine, observer }
    }

    /// Executes effects in order; the uploads of one call go out as a single
    /// batch. Returns settlements for uploads that could not be dispatched.
    pub fn run(
        &self,
        effects: Vec<Effect>,
        context: Option<&SubmitContext>,
        handlers: &Mutex<HandlerRegistry>,
    ) -> Vec<Msg> {
        let mut batch = Vec::new();
        let mut rejected = Vec::new();
        for effect in effects {
            match effect {
                Effect::DispatchUpload {
                    batch_id,
                    item_id,
                    locator,
                    collection,
                } => {
                    let Some(context) = context else {
                        upload_error!("DispatchUpload item_id={} without submit context", item_id);
                        let reply = ServerReply::transport(None, Some(NO_CONTEXT_TEXT.to_string()));
                        rejected.push(Msg::UploadSettled { item_id, reply });
                        continue;
                    };
                    upload_info!(
                        "DispatchUpload batch_id={} item_id={} url_len={} url={}",
                        batch_id,
                        item_id,
                        locator.len(),
                        locator
                    );
                    batch.push((
                        item_id,
                        UploadRequest {
                            endpoint: context.endpoint.clone(),
                            locator,
                            csrf_token: context.csrf_token.clone(),
                            collection,
                        },
                    ));
                }
                Effect::SetTrigger { enabled } => self.observer.trigger_changed(enabled),
                Effect::ClearInput => self.observer.input_cleared(),
                Effect::AttachControls { item_id, controls } => {
                    let handler = self.observer.controls_attached(item_id, controls);
                    handlers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .register(item_id, controls, handler);
                    upload_debug!("item_id={} controls attached: {:?}", item_id, controls);
                }
                Effect::BatchSettled { batch_id } => self.observer.batch_settled(batch_id),
            }
        }
        self.engine.enqueue_batch(batch);
        rejected
    }

    pub fn try_next(&self) -> Option<Msg> {
        self.engine.try_recv().map(map_event)
    }

    pub fn next_within(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted { upload_id, result } => {
            let reply = match result {
                Ok(response) => ServerReply::from(map_response(response)),
                Err(failure) => {
                    upload_warn!("Upload {} failed: {}", upload_id, failure);
                    ServerReply::transport(failure.status, failure.status_text)
                }
            };
            Msg::UploadSettled {
                item_id: upload_id,
                reply,
            }
        }
    }
}

fn map_response(response: UploadResponse) -> ServerResponse {
    ServerResponse {
        success: response.success,
        duplicate: response.duplicate,
        confirm_duplicate_markup: response.confirm_duplicate_upload,
        form_markup: response.form,
        error_message: response.error_message,
    }
}

#[cfg(test)]
mod tests {
    use upload_engine::{TransportFailure, UploadId, Uploader};

    use super::*;
    use crate::LoggingObserver;

    struct UnreachableUploader;

    #[async_trait::async_trait]
    impl Uploader for UnreachableUploader {
        async fn upload(
            &self,
            upload_id: UploadId,
            _request: &UploadRequest,
        ) -> Result<UploadResponse, TransportFailure> {
            panic!("upload {upload_id} should not have been dispatched");
        }
    }

    #[test]
    fn upload_without_context_is_settled_as_transport_failure() {
        let engine = EngineHandle::with_uploader(Arc::new(UnreachableUploader)).unwrap();
        let runner = EffectRunner::new(engine, Arc::new(LoggingObserver));
        let handlers = Mutex::new(HandlerRegistry::new());

        let follow_ups = runner.run(
            vec![Effect::DispatchUpload {
                batch_id: 1,
                item_id: 7,
                locator: "http://a".to_string(),
                collection: None,
            }],
            None,
            &handlers,
        );

        assert_eq!(
            follow_ups,
            vec![Msg::UploadSettled {
                item_id: 7,
                reply: ServerReply::transport(None, Some(NO_CONTEXT_TEXT.to_string())),
            }]
        );
        assert!(runner.next_within(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn delivered_duplicate_maps_to_confirmation_markup() {
        let msg = map_event(EngineEvent::UploadCompleted {
            upload_id: 3,
            result: Ok(UploadResponse {
                success: true,
                duplicate: true,
                confirm_duplicate_upload: "<div>".to_string(),
                form: "<form>".to_string(),
                error_message: None,
            }),
        });
        assert_eq!(
            msg,
            Msg::UploadSettled {
                item_id: 3,
                reply: ServerReply::ApplicationSuccess {
                    duplicate: true,
                    payload: "<div>".to_string(),
                },
            }
        );
    }
}
